//! Operating system backed random source with an explicit close.

use rand_core::{OsRng, RngCore};
use zeroize::Zeroize;

use super::{non_negative_i32, unit_interval};
use crate::{Error, Result};

/// Live state of an open source. Scratch buffers are wiped on drop.
#[derive(Zeroize)]
struct OpenState {
    #[zeroize(skip)]
    rng: OsRng,
    scratch4: [u8; 4],
    scratch8: [u8; 8],
}

impl Drop for OpenState {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Cryptographically secure random source.
///
/// A thin wrapper around `OsRng` that owns its scratch buffers and has an
/// explicit lifetime. After [`close`](Self::close) every draw fails with
/// [`Error::Disposed`]; it never hands out stale or zeroed data.
///
/// The source is not shared between threads. Each computation run opens its
/// own instance and closes it on exit, see [`SecureRandomSource::scoped`].
pub struct SecureRandomSource {
    state: Option<OpenState>,
}

impl SecureRandomSource {
    /// Acquires the platform CSPRNG.
    ///
    /// A probe read is performed so an unusable platform generator is reported
    /// here rather than on the first draw.
    ///
    /// # Errors
    /// Returns [`Error::SourceUnavailable`] if the platform generator fails.
    pub fn open() -> Result<Self> {
        let mut state = OpenState {
            rng: OsRng,
            scratch4: [0u8; 4],
            scratch8: [0u8; 8],
        };
        state
            .rng
            .try_fill_bytes(&mut state.scratch8)
            .map_err(unavailable)?;
        state.scratch8.zeroize();

        tracing::trace!("Secure random source opened");
        Ok(Self { state: Some(state) })
    }

    /// Opens a source, runs `f` with it and closes it on every exit path.
    ///
    /// # Errors
    /// Returns the open failure or whatever `f` returns.
    pub fn scoped<T, F>(f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mut source = Self::open()?;
        let outcome = f(&mut source);
        source.close();
        outcome
    }

    /// Returns `true` until [`close`](Self::close) is called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    /// Fills `buffer` with secure random bytes.
    ///
    /// # Errors
    /// [`Error::Disposed`] after close, [`Error::SourceUnavailable`] if the
    /// platform read fails.
    pub fn fill_bytes(&mut self, buffer: &mut [u8]) -> Result<()> {
        let state = self.state_mut()?;
        state.rng.try_fill_bytes(buffer).map_err(unavailable)
    }

    /// Draws a non-negative 32-bit integer in `[0, i32::MAX]`.
    ///
    /// Four random bytes are read as a little-endian `i32` and the absolute
    /// value is returned, with `i32::MIN` mapped to `0`.
    ///
    /// # Errors
    /// See [`fill_bytes`](Self::fill_bytes).
    pub fn next_int(&mut self) -> Result<i32> {
        let state = self.state_mut()?;
        state
            .rng
            .try_fill_bytes(&mut state.scratch4)
            .map_err(unavailable)?;
        Ok(non_negative_i32(i32::from_le_bytes(state.scratch4)))
    }

    /// Draws an integer in `[0, upper_bound)` as `next_int() % upper_bound`.
    ///
    /// The reduction is modulo-biased: unless `upper_bound` divides
    /// `2^31` evenly, the low residues are slightly more likely than the high
    /// ones (at most one extra preimage out of `2^31 / upper_bound`). This is
    /// kept as-is; callers that need exact uniformity must use rejection
    /// sampling on top of [`next_int`](Self::next_int).
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `upper_bound <= 0`, otherwise see
    /// [`fill_bytes`](Self::fill_bytes).
    pub fn bounded_int(&mut self, upper_bound: i32) -> Result<i32> {
        if upper_bound <= 0 {
            return Err(Error::InvalidArgument(format!(
                "upper bound must be positive, got {upper_bound}"
            )));
        }
        Ok(self.next_int()? % upper_bound)
    }

    /// Draws a double in `[0, 1]`.
    ///
    /// Eight random bytes are read as a little-endian `i64`; its absolute value
    /// (with `i64::MIN` mapped to `0`) is scaled by `1 / i64::MAX`.
    ///
    /// # Errors
    /// See [`fill_bytes`](Self::fill_bytes).
    pub fn next_unit_double(&mut self) -> Result<f64> {
        let state = self.state_mut()?;
        state
            .rng
            .try_fill_bytes(&mut state.scratch8)
            .map_err(unavailable)?;
        Ok(unit_interval(i64::from_le_bytes(state.scratch8)))
    }

    /// Releases the platform handle and wipes the scratch buffers.
    ///
    /// Calling this more than once has no further effect.
    pub fn close(&mut self) {
        if let Some(mut state) = self.state.take() {
            state.zeroize();
            tracing::trace!("Secure random source closed");
        }
    }

    fn state_mut(&mut self) -> Result<&mut OpenState> {
        self.state.as_mut().ok_or(Error::Disposed)
    }
}

impl Drop for SecureRandomSource {
    fn drop(&mut self) {
        self.close();
    }
}

impl core::fmt::Debug for SecureRandomSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SecureRandomSource")
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}

fn unavailable(err: rand_core::Error) -> Error {
    Error::SourceUnavailable(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_source_draws_values() {
        let mut rng = SecureRandomSource::open().unwrap();

        let mut buf = [0u8; 64];
        rng.fill_bytes(&mut buf).unwrap();
        assert!(buf.iter().any(|&b| b != 0));

        assert!(rng.next_int().unwrap() >= 0);
        let d = rng.next_unit_double().unwrap();
        assert!((0.0..=1.0).contains(&d));
    }

    #[test]
    fn close_is_idempotent() {
        let mut rng = SecureRandomSource::open().unwrap();
        rng.close();
        rng.close();
        assert!(!rng.is_open());
    }

    #[test]
    fn every_draw_after_close_fails_with_disposed() {
        let mut rng = SecureRandomSource::open().unwrap();
        rng.close();

        for _ in 0..16 {
            let mut buf = [0u8; 8];
            assert!(matches!(rng.fill_bytes(&mut buf), Err(Error::Disposed)));
            assert!(matches!(rng.next_int(), Err(Error::Disposed)));
            assert!(matches!(rng.bounded_int(10), Err(Error::Disposed)));
            assert!(matches!(rng.next_unit_double(), Err(Error::Disposed)));
        }
    }

    #[test]
    fn bounded_int_rejects_non_positive_bounds() {
        let mut rng = SecureRandomSource::open().unwrap();
        assert!(matches!(
            rng.bounded_int(0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            rng.bounded_int(-5),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn bounded_int_of_one_is_always_zero() {
        let mut rng = SecureRandomSource::open().unwrap();
        for _ in 0..100 {
            assert_eq!(rng.bounded_int(1).unwrap(), 0);
        }
    }

    #[test]
    fn scoped_closes_on_error_path() {
        let mut observed_open = false;
        let result: Result<()> = SecureRandomSource::scoped(|rng| {
            observed_open = rng.is_open();
            Err(Error::Canceled)
        });

        assert!(observed_open);
        assert!(matches!(result, Err(Error::Canceled)));
    }

    #[test]
    fn debug_does_not_leak_scratch_buffers() {
        let rng = SecureRandomSource::open().unwrap();
        assert_eq!(format!("{rng:?}"), "SecureRandomSource { open: true, .. }");
    }
}

//! The computation a worker runs, one trial at a time.

use crate::{Result, SecureRandomSource};

/// A search that the worker drives trial by trial.
///
/// Each call to [`try_candidate`](Self::try_candidate) is one trial: it draws
/// whatever randomness it needs from `rng` and either returns a value that
/// satisfies the search (`Some`), rejects the candidate (`None`), or fails.
/// The worker checks for cancellation between trials, never during one, so a
/// trial should be bounded in length.
///
/// Any `Fn(u64, &mut SecureRandomSource) -> Result<Option<T>>` closure is a
/// generator.
pub trait CandidateGenerator: Send + Sync + 'static {
    /// Value produced by a successful search.
    type Output: Send + 'static;

    /// Runs one trial toward a value of `target_bits` bits.
    ///
    /// # Errors
    /// Any error aborts the run; it is reported as the run's error result.
    /// Returning [`Error::Canceled`](crate::Error::Canceled) ends the run as
    /// canceled instead.
    fn try_candidate(
        &self,
        target_bits: u64,
        rng: &mut SecureRandomSource,
    ) -> Result<Option<Self::Output>>;
}

impl<F, T> CandidateGenerator for F
where
    F: Fn(u64, &mut SecureRandomSource) -> Result<Option<T>> + Send + Sync + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn try_candidate(&self, target_bits: u64, rng: &mut SecureRandomSource) -> Result<Option<T>> {
        self(target_bits, rng)
    }
}

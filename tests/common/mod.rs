//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use prime_search::{Error, Result, SecureRandomSource};

/// Initialize test tracing (call once at the beginning of tests).
///
/// Subsequent calls are safe and will be ignored.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new("prime_search=debug");

    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(filter)
        .try_init();
}

/// Generator that succeeds on its first trial with a random `u64`.
pub fn quick_generator(_bits: u64, rng: &mut SecureRandomSource) -> Result<Option<u64>> {
    let mut buf = [0u8; 8];
    rng.fill_bytes(&mut buf)?;
    Ok(Some(u64::from_le_bytes(buf) | 1))
}

/// Generator whose trials never succeed and take `trial` each.
///
/// `entered` is raised on the first trial so tests can wait for the run to be
/// inside the loop.
pub fn slow_generator(
    trial: Duration,
    entered: Arc<AtomicBool>,
) -> impl Fn(u64, &mut SecureRandomSource) -> Result<Option<u64>> + Send + Sync + 'static {
    move |_bits: u64, rng: &mut SecureRandomSource| -> Result<Option<u64>> {
        entered.store(true, Ordering::SeqCst);
        rng.next_int()?;
        std::thread::sleep(trial);
        Ok(None)
    }
}

/// Generator that fails on its first trial.
pub fn failing_generator(_bits: u64, _rng: &mut SecureRandomSource) -> Result<Option<u64>> {
    Err(Error::generator("candidate search diverged"))
}

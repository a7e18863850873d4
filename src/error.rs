//! Error types for the prime search crate.

use std::error::Error as StdError;

/// Boxed cause carried by [`Error::GeneratorFailure`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Main error types for the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An operation was attempted on a closed [`SecureRandomSource`](crate::SecureRandomSource).
    #[error("Secure random source has been disposed")]
    Disposed,

    /// The platform random number generator could not be acquired or read.
    #[error("Secure random source unavailable: {0}")]
    SourceUnavailable(String),

    /// A caller-supplied value is outside the accepted range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The candidate generator failed; the run was aborted.
    #[error("Candidate generator failed: {0}")]
    GeneratorFailure(#[source] BoxError),

    /// A cooperative stop request was honoured.
    #[error("Computation was canceled")]
    Canceled,

    /// The result mailbox was drained with an accessor for the wrong variant.
    #[error("Contract violation: expected a {expected} result, found {found}")]
    ContractViolation {
        /// Variant the accessor requires.
        expected: &'static str,
        /// Variant the mailbox actually holds.
        found: &'static str,
    },

    /// Writing to a log destination or output file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps an arbitrary failure raised by a candidate generator.
    pub fn generator<E>(cause: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::GeneratorFailure(cause.into())
    }
}

//! Cancellable background prime search.
//!
//! The crate is built from three pieces:
//!
//! - **rng**: [`SecureRandomSource`], the operating system CSPRNG behind an
//!   explicit open/close lifetime, with integer, bounded and unit-interval draws
//! - **worker**: [`ComputationWorker`], which runs a [`CandidateGenerator`] on a
//!   dedicated thread, honours cooperative cancellation at trial boundaries and
//!   hands back exactly one result per run through a single-slot mailbox
//! - **diagnostics**: [`DiagnosticLog`], depth-indented call tracing that can be
//!   toggled at runtime and measures its own I/O overhead
//!
//! A probable-prime generator ([`ProbablePrimeGenerator`]) and an append-only
//! result file ([`ResultWriter`]) complete the console front end.
//!
//! # Example
//!
//! ```rust,no_run
//! use prime_search::{ComputationWorker, ProbablePrimeGenerator, WorkResultKind};
//!
//! let mut worker = ComputationWorker::new(ProbablePrimeGenerator::default());
//! assert!(worker.start_worker(256));
//!
//! if worker.wait() == WorkResultKind::Success {
//!     let prime = worker.remove_success_result().unwrap();
//!     println!("{prime} in {:?}", worker.run_time());
//! }
//! ```

/// Error types.
pub mod error;

/// Diagnostic instrumentation.
pub mod diagnostics;
/// Result output file.
pub mod output;
/// Probable-prime candidate generator.
pub mod prime;
/// Secure randomness.
pub mod rng;
/// Background computation worker.
pub mod worker;

#[cfg(feature = "console")]
/// Console settings.
pub mod config;

pub use diagnostics::{DiagnosticLog, FileSink, LogSink, MemorySink};
pub use error::{BoxError, Error};
pub use output::{format_elapsed, OutputMode, ResultWriter, ValueSize};
pub use prime::ProbablePrimeGenerator;
pub use rng::SecureRandomSource;
pub use worker::{CandidateGenerator, ComputationWorker, WorkOutcome, WorkResultKind};

#[cfg(feature = "console")]
pub use config::Settings;

/// Result type for the crate.
pub type Result<T> = core::result::Result<T, Error>;

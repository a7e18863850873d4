//! Diagnostic instrumentation for observing a computation.
//!
//! - **log**: indentation-scoped call tracing with a runtime on/off switch
//! - **sink**: where log lines go (append-only file, or memory for tests)
//! - **timer**: aggregate timing of the log's own I/O overhead

/// Call-depth indented diagnostic log.
pub mod log;
/// Log line destinations.
pub mod sink;
/// Aggregate timer.
pub mod timer;

pub use log::{DiagnosticLog, ScopeGuard, DEFAULT_LOG_FILE};
pub use sink::{FileSink, LogSink, MemorySink};
pub use timer::{AggregateTimer, TimerGuard};

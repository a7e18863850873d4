//! Call-depth indented diagnostic log.

use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use super::sink::{FileSink, LogSink};
use super::timer::AggregateTimer;
use crate::Result;

/// File the process-wide log appends to.
pub const DEFAULT_LOG_FILE: &str = "Methods.log.txt";

struct Inner {
    enabled: AtomicBool,
    /// One entry per open scope: whether its opening brace was written.
    scopes: Mutex<Vec<bool>>,
    sink: Mutex<Box<dyn LogSink>>,
    timer: AggregateTimer,
}

/// Runtime-toggleable call tracing with one tab of indentation per open scope.
///
/// A `DiagnosticLog` is a cheap handle: clones share the same flag, depth,
/// destination and timer. Pass a handle to the code being traced instead of
/// reaching for global state; [`DiagnosticLog::global`] exists for callers
/// that have nowhere to thread one through.
///
/// The depth moves on every enter/leave whether or not logging is enabled, so
/// toggling the flag mid-sequence never leaves the indentation out of step.
/// A closing brace is written only for a scope whose opening brace was, so the
/// written portions of the log stay balanced across toggles.
///
/// All state is atomic or locked, so handles may be used from several threads.
/// Scopes opened by different threads on the same handle still share one
/// depth counter; give each concurrent worker its own log when the trace
/// should read as a single call chain.
#[derive(Clone)]
pub struct DiagnosticLog {
    inner: Arc<Inner>,
}

impl DiagnosticLog {
    /// Creates a disabled log writing to `sink`.
    pub fn new(sink: impl LogSink + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                enabled: AtomicBool::new(false),
                scopes: Mutex::new(Vec::new()),
                sink: Mutex::new(Box::new(sink)),
                timer: AggregateTimer::new(),
            }),
        }
    }

    /// Creates a disabled log appending to the file at `path`.
    pub fn to_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(FileSink::new(path))
    }

    /// Process-wide log, created on first use with [`DEFAULT_LOG_FILE`] and
    /// logging disabled. It lives until the process exits.
    pub fn global() -> &'static DiagnosticLog {
        static GLOBAL: OnceLock<DiagnosticLog> = OnceLock::new();
        GLOBAL.get_or_init(|| Self::to_file(DEFAULT_LOG_FILE))
    }

    /// Turns writing on or off for every handle sharing this log.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether lines are currently written.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Relaxed)
    }

    /// Replaces the destination. Depth and accumulated time are kept.
    pub fn set_sink(&self, sink: impl LogSink + 'static) {
        *self.lock_sink() = Box::new(sink);
    }

    /// Current call depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.lock_scopes().len()
    }

    /// Total time spent writing log lines. Excludes the traced work itself.
    #[must_use]
    pub fn total_execution_time(&self) -> Duration {
        self.inner.timer.total_time()
    }

    /// Writes `label(arg, arg, ...)` and `{`, then increases the depth.
    ///
    /// # Errors
    /// Returns the sink's write error. The depth is increased regardless.
    pub fn enter_scope(&self, label: &str, args: &[&dyn Display]) -> Result<()> {
        self.open_scope(|| {
            let args = args
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("{label}({args})")
        })
    }

    /// Writes `label(name: value)` and `{`, then increases the depth.
    ///
    /// # Errors
    /// Returns the sink's write error. The depth is increased regardless.
    pub fn enter_scope_named(&self, label: &str, name: &str, value: &dyn Display) -> Result<()> {
        self.open_scope(|| format!("{label}({name}: {value})"))
    }

    /// Decreases the depth (never below zero), then writes `}` if the scope
    /// being left wrote its `{`.
    ///
    /// # Errors
    /// Returns the sink's write error. The depth is decreased regardless.
    pub fn leave_scope(&self) -> Result<()> {
        let opened = self.lock_scopes().pop().unwrap_or(false);
        if opened {
            self.message("}")
        } else {
            Ok(())
        }
    }

    /// Enters a scope that is left when the returned guard drops.
    ///
    /// Write failures are reported through `tracing` instead of being returned.
    #[must_use = "the scope is left as soon as the guard is dropped"]
    pub fn scope(&self, label: &str, args: &[&dyn Display]) -> ScopeGuard<'_> {
        if let Err(e) = self.enter_scope(label, args) {
            tracing::warn!("Diagnostic log write failed: {e}");
        }
        ScopeGuard { log: self }
    }

    /// Writes `text` at the current depth.
    ///
    /// Every line break inside `text` is followed by the same indentation, so
    /// multi-line messages stay aligned. Does nothing while disabled.
    ///
    /// # Errors
    /// Returns [`Error::Io`](crate::Error::Io) if the destination write fails.
    pub fn message(&self, text: &str) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let _section = self.inner.timer.start_timer();
        let padding = "\t".repeat(self.depth());
        let body = text.replace('\n', &format!("\n{padding}"));
        self.lock_sink().write_line(&format!("{padding}{body}"))
    }

    fn open_scope(&self, header: impl FnOnce() -> String) -> Result<()> {
        let enabled = self.is_enabled();
        let written = if enabled {
            self.message(&header()).and_then(|()| self.message("{"))
        } else {
            Ok(())
        };
        self.lock_scopes().push(enabled && written.is_ok());
        written
    }

    fn lock_scopes(&self) -> std::sync::MutexGuard<'_, Vec<bool>> {
        self.inner
            .scopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_sink(&self) -> std::sync::MutexGuard<'_, Box<dyn LogSink>> {
        self.inner
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl core::fmt::Debug for DiagnosticLog {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DiagnosticLog")
            .field("enabled", &self.is_enabled())
            .field("depth", &self.depth())
            .field("total_execution_time", &self.total_execution_time())
            .finish_non_exhaustive()
    }
}

/// Leaves its scope on drop. Created by [`DiagnosticLog::scope`].
pub struct ScopeGuard<'a> {
    log: &'a DiagnosticLog,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.log.leave_scope() {
            tracing::warn!("Diagnostic log write failed: {e}");
        }
    }
}

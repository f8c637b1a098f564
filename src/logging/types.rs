//! Core logging types: message levels and the [`Log`] trait.

/// Severity of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Diagnostic detail, hidden on the console unless verbose.
    Debug,
    /// Regular progress message.
    Info,
    /// Section header for a major step.
    Stage,
    /// Recoverable problem.
    Warn,
    /// Failure.
    Error,
}

/// Abstraction over logging backends.
///
/// [`Logger`](super::logger::Logger) forwards to [`tracing`]; tests use an
/// in-memory recorder.  Bootstrap and packaging code log through this trait
/// so they never depend on the global subscriber.
pub trait Log: Send + Sync + std::fmt::Debug {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
}

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use crate::error::ConversionError;
use crate::format::FormatTag;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionSeverity {
    /// Clean conversion.
    Info,
    /// Converted, but the result carries a warning (truncation, large catalog).
    Warning,
    /// Error-level event (the input was rejected).
    Error,
    /// Critical error (a decoder failed on accepted input).
    Critical,
}

impl ConversionSeverity {
    pub fn for_success(warned: bool) -> Self {
        if warned { Self::Warning } else { Self::Info }
    }

    /// Validation failures are `Error`; decoder failures are `Critical`.
    pub fn for_error(e: &ConversionError) -> Self {
        match e {
            ConversionError::Processing { .. } => Self::Critical,
            ConversionError::FileType { .. }
            | ConversionError::FileTooLarge { .. }
            | ConversionError::UnsupportedFormat { .. }
            | ConversionError::EmptyFile { .. } => Self::Error,
        }
    }
}

/// Context about a conversion attempt.
#[derive(Debug, Clone)]
pub struct ConversionContext {
    /// Position of the file in its batch.
    pub index: usize,
    /// Declared (or sanitized, once validated) file name.
    pub file_name: String,
    /// Resolved format, if resolution got that far.
    pub format: Option<FormatTag>,
}

/// Stats reported on successful conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionStats {
    pub bytes: usize,
    /// Number of sheets, zero for text results.
    pub sheets: usize,
    /// Characters of text, zero for sheet results.
    pub text_chars: usize,
    /// `Info`, or `Warning` when the result carries a warning.
    pub severity: ConversionSeverity,
    pub elapsed: Duration,
}

/// Observer interface for conversion outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait ConversionObserver: Send + Sync {
    /// Called when conversion succeeds.
    fn on_success(&self, _ctx: &ConversionContext, _stats: ConversionStats) {}

    /// Called when conversion fails.
    fn on_failure(&self, _ctx: &ConversionContext, _severity: ConversionSeverity, _error: &ConversionError) {}

    /// Called when a conversion failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn ConversionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn ConversionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl ConversionObserver for CompositeObserver {
    fn on_success(&self, ctx: &ConversionContext, stats: ConversionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Forwards conversion events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ConversionObserver for TracingObserver {
    fn on_success(&self, ctx: &ConversionContext, stats: ConversionStats) {
        info!(
            index = ctx.index,
            file = %ctx.file_name,
            format = ?ctx.format,
            bytes = stats.bytes,
            sheets = stats.sheets,
            text_chars = stats.text_chars,
            severity = ?stats.severity,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "converted"
        );
    }

    fn on_failure(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        warn!(
            index = ctx.index,
            file = %ctx.file_name,
            format = ?ctx.format,
            ?severity,
            kind = ?error.kind(),
            "conversion failed: {error}"
        );
    }

    fn on_alert(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        error!(
            index = ctx.index,
            file = %ctx.file_name,
            format = ?ctx.format,
            ?severity,
            kind = ?error.kind(),
            "ALERT conversion failed: {error}"
        );
    }
}

/// Appends conversion events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl ConversionObserver for FileObserver {
    fn on_success(&self, ctx: &ConversionContext, stats: ConversionStats) {
        self.append_line(&format!(
            "{} ok severity={:?} index={} format={:?} file={} bytes={} sheets={} chars={}",
            Utc::now().to_rfc3339(),
            stats.severity,
            ctx.index,
            ctx.format,
            ctx.file_name,
            stats.bytes,
            stats.sheets,
            stats.text_chars
        ));
    }

    fn on_failure(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        self.append_line(&format!(
            "{} fail severity={:?} index={} format={:?} file={} err={}",
            Utc::now().to_rfc3339(),
            severity,
            ctx.index,
            ctx.format,
            ctx.file_name,
            error
        ));
    }

    fn on_alert(&self, ctx: &ConversionContext, severity: ConversionSeverity, error: &ConversionError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} index={} format={:?} file={} err={}",
            Utc::now().to_rfc3339(),
            severity,
            ctx.index,
            ctx.format,
            ctx.file_name,
            error
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_failures_are_critical() {
        let e = ConversionError::processing(FormatTag::Pdf, "broken xref");
        assert_eq!(ConversionSeverity::for_error(&e), ConversionSeverity::Critical);
        let e = ConversionError::too_large("big");
        assert_eq!(ConversionSeverity::for_error(&e), ConversionSeverity::Error);
        assert!(ConversionSeverity::Critical > ConversionSeverity::Error);
    }

    #[test]
    fn warned_successes_rank_below_failures() {
        assert_eq!(ConversionSeverity::for_success(false), ConversionSeverity::Info);
        assert_eq!(ConversionSeverity::for_success(true), ConversionSeverity::Warning);
        assert!(ConversionSeverity::Warning < ConversionSeverity::Error);
    }
}

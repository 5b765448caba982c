//! Conversion configuration.
//!
//! [`ConvertOptions`] is the in-process configuration record; [`NodeParameters`] is the
//! host-facing parameter set (camelCase, all optional) that validates into it.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::conversion::observability::{ConversionObserver, ConversionSeverity};
use crate::error::{ConversionError, ConvertResult};
use crate::execution::SchedulerObserver;

const MIB: usize = 1024 * 1024;

/// Size and count caps consulted by the streaming selector and the normalizers.
///
/// These are passed per call; nothing reads a process-wide constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamingLimits {
    /// Inputs larger than this are decoded incrementally.
    pub stream_threshold_bytes: usize,
    /// Maximum number of characters retained from plain text.
    pub text_char_cap: usize,
    /// Maximum number of data rows retained from delimited text.
    pub csv_row_cap: usize,
    /// Maximum number of rows retained per worksheet.
    pub sheet_row_cap: usize,
    /// Offer count above which a vendor catalog carries a size warning.
    pub catalog_offer_warning: usize,
}

impl Default for StreamingLimits {
    fn default() -> Self {
        Self {
            stream_threshold_bytes: 10 * MIB,
            text_char_cap: 1_000_000,
            csv_row_cap: 100_000,
            sheet_row_cap: 10_000,
            catalog_offer_warning: 1_000,
        }
    }
}

/// What a batch does when one of its items fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop starting new items, let in-flight items finish, and fail the batch with the
    /// lowest-index error.
    #[default]
    FailFast,
    /// Run every item and report failures as entries of the grouped record.
    Continue,
}

/// Options controlling conversion of a batch.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct ConvertOptions {
    /// Per-file size ceiling in MiB.
    pub max_file_size_mb: usize,
    /// Maximum number of files converted concurrently.
    pub max_concurrency: usize,
    /// Annotate sheet rows with their 1-based source row number.
    pub include_original_row_numbers: bool,
    /// Annotate sheets with the originating file name.
    pub include_file_name: bool,
    /// Annotate sheets with their sheet name.
    pub include_sheet_name: bool,
    /// Emit one record per sheet instead of a single grouped record.
    pub output_sheets_as_separate_items: bool,
    pub limits: StreamingLimits,
    pub failure_policy: FailurePolicy,
    /// Optional observer for per-file outcomes.
    pub observer: Option<Arc<dyn ConversionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: ConversionSeverity,
    /// Optional observer for scheduler events.
    pub scheduler_observer: Option<Arc<dyn SchedulerObserver>>,
}

impl ConvertOptions {
    /// The size ceiling in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb.saturating_mul(MIB)
    }
}

impl fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("max_file_size_mb", &self.max_file_size_mb)
            .field("max_concurrency", &self.max_concurrency)
            .field("include_original_row_numbers", &self.include_original_row_numbers)
            .field("include_file_name", &self.include_file_name)
            .field("include_sheet_name", &self.include_sheet_name)
            .field("output_sheets_as_separate_items", &self.output_sheets_as_separate_items)
            .field("limits", &self.limits)
            .field("failure_policy", &self.failure_policy)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .field("scheduler_observer_set", &self.scheduler_observer.is_some())
            .finish()
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            max_concurrency: 4,
            include_original_row_numbers: false,
            include_file_name: true,
            include_sheet_name: true,
            output_sheets_as_separate_items: false,
            limits: StreamingLimits::default(),
            failure_policy: FailurePolicy::default(),
            observer: None,
            alert_at_or_above: ConversionSeverity::Critical,
            scheduler_observer: None,
        }
    }
}

/// Host-facing parameters, as supplied by the workflow engine.
///
/// Missing fields take the same defaults as [`ConvertOptions::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeParameters {
    pub max_file_size: u32,
    pub max_concurrency: u32,
    pub include_original_row_numbers: bool,
    pub include_file_name: bool,
    pub include_sheet_name: bool,
    pub output_sheets_as_separate_items: bool,
}

impl Default for NodeParameters {
    fn default() -> Self {
        Self {
            max_file_size: 50,
            max_concurrency: 4,
            include_original_row_numbers: false,
            include_file_name: true,
            include_sheet_name: true,
            output_sheets_as_separate_items: false,
        }
    }
}

impl NodeParameters {
    /// Validate ranges and build [`ConvertOptions`].
    pub fn into_options(self) -> ConvertResult<ConvertOptions> {
        check_range("maxFileSize", self.max_file_size, 1, 100)?;
        check_range("maxConcurrency", self.max_concurrency, 1, 10)?;

        Ok(ConvertOptions {
            max_file_size_mb: self.max_file_size as usize,
            max_concurrency: self.max_concurrency as usize,
            include_original_row_numbers: self.include_original_row_numbers,
            include_file_name: self.include_file_name,
            include_sheet_name: self.include_sheet_name,
            output_sheets_as_separate_items: self.output_sheets_as_separate_items,
            ..ConvertOptions::default()
        })
    }
}

fn check_range(name: &str, value: u32, min: u32, max: u32) -> ConvertResult<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConversionError::file_type(format!(
            "parameter '{name}' must be between {min} and {max} (got {value})"
        )))
    }
}

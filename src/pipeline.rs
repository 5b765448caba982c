//! Batch entrypoint and result assembly.
//!
//! [`convert_batch`] converts every input through the [`Scheduler`] and shapes the per-file
//! results into a [`BatchResult`]:
//!
//! - grouped mode (default): one [`GroupedRecord`] with every file in input order;
//! - separate-items mode: one [`SheetItem`] per sheet across all files. Text results carry no
//!   sheets and are left out of this mode, as are failed entries.
//!
//! Each file is converted on tokio's blocking pool, so decoders never stall the scheduler.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::{ConvertOptions, FailurePolicy};
use crate::conversion::{StrategyRegistry, convert_file};
use crate::error::{ConversionError, ConvertResult};
use crate::execution::{Scheduler, TaskOutcome};
use crate::format::{FormatTag, extension_of};
use crate::types::{
    BatchResult, Content, ConversionResult, ErrorRecord, FailedFile, FailedFileMetadata,
    FileEntry, FileInput, GroupedRecord, SheetItem,
};

/// Convert a batch with the default strategy registry.
///
/// # Examples
///
/// ```
/// use doc_convert::config::ConvertOptions;
/// use doc_convert::pipeline::convert_batch;
/// use doc_convert::types::FileInput;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), doc_convert::ConversionError> {
/// let inputs = vec![
///     FileInput::new("a.txt", "first"),
///     FileInput::new("b.json", r#"{"user": {"name": "Ann"}}"#),
/// ];
/// let out = convert_batch(inputs, &ConvertOptions::default()).await?;
/// let grouped = out.as_grouped().unwrap();
/// assert_eq!(grouped.total_files, 2);
/// # Ok(())
/// # }
/// ```
pub async fn convert_batch(
    inputs: Vec<FileInput>,
    options: &ConvertOptions,
) -> ConvertResult<BatchResult> {
    convert_batch_with(inputs, Arc::new(StrategyRegistry::with_defaults()), options).await
}

/// Convert a batch with a caller-supplied registry.
pub async fn convert_batch_with(
    inputs: Vec<FileInput>,
    registry: Arc<StrategyRegistry>,
    options: &ConvertOptions,
) -> ConvertResult<BatchResult> {
    let total = inputs.len();
    let names: Vec<Option<String>> = inputs.iter().map(|i| i.file_name.clone()).collect();
    let shared = Arc::new(options.clone());

    let scheduler = Scheduler::new(options.max_concurrency, options.failure_policy)
        .with_observer(options.scheduler_observer.clone());

    let outcomes = scheduler
        .run(inputs, |index, input| {
            let registry = Arc::clone(&registry);
            let options = Arc::clone(&shared);
            async move { convert_on_blocking_pool(index, input, registry, options).await }
        })
        .await;

    info!(total, metrics = %scheduler.metrics().snapshot(), "batch converted");

    let entries = match options.failure_policy {
        FailurePolicy::FailFast => fail_fast_entries(outcomes)?,
        FailurePolicy::Continue => continue_entries(outcomes, names),
    };
    Ok(assemble(entries, options))
}

async fn convert_on_blocking_pool(
    index: usize,
    input: FileInput,
    registry: Arc<StrategyRegistry>,
    options: Arc<ConvertOptions>,
) -> ConvertResult<ConversionResult> {
    let hint = input
        .file_name
        .as_deref()
        .and_then(extension_of)
        .and_then(|ext| FormatTag::from_extension(&ext));

    tokio::task::spawn_blocking(move || convert_file(index, input, &registry, &options))
        .await
        .unwrap_or_else(|join_err| {
            warn!(index, error = %join_err, "conversion task aborted");
            let message = format!("conversion task aborted: {join_err}");
            Err(match hint {
                Some(format) => ConversionError::processing(format, message),
                None => ConversionError::unsupported(message),
            })
        })
}

fn fail_fast_entries(
    outcomes: Vec<TaskOutcome<ConversionResult, ConversionError>>,
) -> ConvertResult<Vec<FileEntry>> {
    let mut entries = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            TaskOutcome::Completed(r) => entries.push(FileEntry::Converted(r)),
            TaskOutcome::Failed(e) => return Err(e),
            TaskOutcome::Skipped => {}
        }
    }
    Ok(entries)
}

fn continue_entries(
    outcomes: Vec<TaskOutcome<ConversionResult, ConversionError>>,
    names: Vec<Option<String>>,
) -> Vec<FileEntry> {
    outcomes
        .into_iter()
        .zip(names)
        .enumerate()
        .filter_map(|(index, (outcome, file_name))| match outcome {
            TaskOutcome::Completed(r) => Some(FileEntry::Converted(r)),
            TaskOutcome::Failed(e) => Some(FileEntry::Failed(FailedFile {
                error: ErrorRecord {
                    kind: e.kind(),
                    message: e.to_string(),
                },
                metadata: FailedFileMetadata { file_name, index },
            })),
            TaskOutcome::Skipped => None,
        })
        .collect()
}

/// Shape per-file entries into the configured output topology.
pub fn assemble(entries: Vec<FileEntry>, options: &ConvertOptions) -> BatchResult {
    if !options.output_sheets_as_separate_items {
        return BatchResult::Grouped(GroupedRecord {
            total_files: entries.len(),
            files: entries,
            processed_at: Utc::now(),
        });
    }

    let mut items = Vec::new();
    for entry in entries {
        let FileEntry::Converted(result) = entry else {
            continue;
        };
        let Content::Sheets(sheets) = result.content else {
            continue;
        };
        for (_, sheet) in sheets {
            items.push(SheetItem {
                rows: sheet.data,
                file_name: sheet.file_name,
                sheet_name: sheet.sheet_name,
                file_type: result.metadata.file_type,
                file_size: result.metadata.file_size,
                processed_at: result.metadata.processed_at,
            });
        }
    }
    BatchResult::SeparateItems(items)
}

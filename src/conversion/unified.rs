//! Unified per-file conversion entrypoint.
//!
//! [`convert_file`] takes one batch entry from validation to a finished [`ConversionResult`]:
//!
//! - the request is validated and its name sanitized ([`ConversionRequest::new`]);
//! - the format is resolved once ([`resolve_format`]);
//! - the registered strategy runs and blank text output is rejected;
//! - metadata is attached.
//!
//! If an observer is configured on [`ConvertOptions`], success, failure and alerts are reported
//! to it.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info};

use crate::config::ConvertOptions;
use crate::error::{ConversionError, ConvertResult};
use crate::format::{FormatTag, resolve_format};
use crate::types::{Content, ConversionRequest, ConversionResult, FileInput, FileMetadata};

use super::observability::{ConversionContext, ConversionSeverity, ConversionStats};
use super::registry::{StrategyContext, StrategyRegistry};

/// Convert one batch entry.
///
/// # Examples
///
/// ```
/// use doc_convert::config::ConvertOptions;
/// use doc_convert::conversion::{StrategyRegistry, convert_file};
/// use doc_convert::types::FileInput;
///
/// # fn main() -> Result<(), doc_convert::ConversionError> {
/// let registry = StrategyRegistry::with_defaults();
/// let input = FileInput::new("notes.txt", "hello world");
/// let result = convert_file(0, input, &registry, &ConvertOptions::default())?;
/// assert_eq!(result.content.as_text(), Some("hello world"));
/// assert_eq!(result.metadata.file_type.extension(), "txt");
/// # Ok(())
/// # }
/// ```
pub fn convert_file(
    index: usize,
    input: FileInput,
    registry: &StrategyRegistry,
    options: &ConvertOptions,
) -> ConvertResult<ConversionResult> {
    let start = Instant::now();
    let mut ctx = ConversionContext {
        index,
        file_name: input.file_name.clone().unwrap_or_default(),
        format: None,
    };

    let result = ConversionRequest::new(
        index,
        input.file_name.as_deref(),
        input.content,
        options.max_file_size_bytes(),
    )
    .and_then(|req| {
        ctx.file_name = req.file_name.clone();
        let format = resolve_format(&req.file_name, &req.content)?;
        ctx.format = Some(format);
        run_strategy(&req, format, registry, options)
    });

    report(options, &ctx, &result, start.elapsed());
    result
}

/// Convert an already-validated request.
pub fn convert_request(
    req: &ConversionRequest,
    registry: &StrategyRegistry,
    options: &ConvertOptions,
) -> ConvertResult<ConversionResult> {
    let format = resolve_format(&req.file_name, &req.content)?;
    run_strategy(req, format, registry, options)
}

fn run_strategy(
    req: &ConversionRequest,
    format: FormatTag,
    registry: &StrategyRegistry,
    options: &ConvertOptions,
) -> ConvertResult<ConversionResult> {
    debug!(index = req.index, file = %req.file_name, %format, bytes = req.len(), "converting");

    let strategy_ctx = StrategyContext::new(req.file_name.clone(), options);
    let converted = registry.convert(format, &req.content, &strategy_ctx)?;

    if let Content::Text(text) = &converted.content {
        if text.trim().is_empty() {
            return Err(ConversionError::empty(
                "File is empty or contains no extractable text",
            ));
        }
    }

    Ok(ConversionResult {
        content: converted.content,
        warning: converted.warning,
        metadata: FileMetadata {
            file_name: req.file_name.clone(),
            file_size: req.len(),
            file_type: format,
            processed_at: Utc::now(),
        },
    })
}

fn report(
    options: &ConvertOptions,
    ctx: &ConversionContext,
    result: &ConvertResult<ConversionResult>,
    elapsed: Duration,
) {
    if let Ok(r) = result {
        info!(
            index = ctx.index,
            file = %ctx.file_name,
            format = ?ctx.format,
            elapsed_ms = elapsed.as_millis() as u64,
            warned = r.warning.is_some(),
            "file converted"
        );
    }

    let Some(obs) = options.observer.as_ref() else {
        return;
    };
    match result {
        Ok(r) => {
            let (sheets, text_chars) = match &r.content {
                Content::Text(t) => (0, t.chars().count()),
                Content::Sheets(s) => (s.len(), 0),
            };
            obs.on_success(
                ctx,
                ConversionStats {
                    bytes: r.metadata.file_size,
                    sheets,
                    text_chars,
                    severity: ConversionSeverity::for_success(r.warning.is_some()),
                    elapsed,
                },
            );
        }
        Err(e) => {
            let sev = ConversionSeverity::for_error(e);
            obs.on_failure(ctx, sev, e);
            if sev >= options.alert_at_or_above {
                obs.on_alert(ctx, sev, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn blank_text_output_is_empty_file() {
        let registry = StrategyRegistry::with_defaults();
        let err = convert_file(
            0,
            FileInput::new("blank.txt", "   \n\t "),
            &registry,
            &ConvertOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyFileError);
    }

    #[test]
    fn metadata_uses_sanitized_name_and_resolved_format() {
        let registry = StrategyRegistry::with_defaults();
        let r = convert_file(
            2,
            FileInput::new("re:port.JSON", r#"{"a": 1}"#),
            &registry,
            &ConvertOptions::default(),
        )
        .unwrap();
        assert_eq!(r.metadata.file_name, "re_port.JSON");
        assert_eq!(r.metadata.file_type, FormatTag::Json);
        assert_eq!(r.metadata.file_size, 8);
    }
}

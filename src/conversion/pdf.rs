//! PDF text extraction: `pdf-extract` first, `lopdf` page text on failure.

use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::error::{ConversionError, ConvertResult};
use crate::format::FormatTag;
use crate::types::Converted;

use super::registry::StrategyContext;

fn extract_primary(content: &[u8]) -> Result<String, String> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(content))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("pdf text extractor panicked".to_string()),
    }
}

fn extract_fallback(content: &[u8]) -> Result<String, lopdf::Error> {
    let doc = lopdf::Document::load_mem(content)?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    doc.extract_text(&pages)
}

pub fn convert_pdf(content: &[u8], _ctx: &StrategyContext) -> ConvertResult<Converted> {
    match extract_primary(content) {
        Ok(text) => Ok(Converted::text(text)),
        Err(first) => {
            debug!(error = %first, "pdf-extract failed, trying lopdf");
            extract_fallback(content)
                .map(Converted::text)
                .map_err(|_| ConversionError::processing(FormatTag::Pdf, first))
        }
    }
}

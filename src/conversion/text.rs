use crate::error::{ConversionError, ConvertResult};
use crate::format::FormatTag;
use crate::streaming;
use crate::types::Converted;

use super::registry::StrategyContext;

/// Plain text, decoded by detected charset and capped at `limits.text_char_cap` characters.
pub fn convert_plain_text(content: &[u8], ctx: &StrategyContext) -> ConvertResult<Converted> {
    let capped = streaming::read_text(content, &ctx.limits)
        .map_err(|e| ConversionError::processing(FormatTag::PlainText, e.to_string()))?;

    let warning = capped.truncated.then(|| {
        format!(
            "Text truncated to {} characters",
            ctx.limits.text_char_cap
        )
    });
    Ok(Converted::text(capped.text).with_warning(warning))
}

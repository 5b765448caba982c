use serde_json::Value;

use crate::encoding;
use crate::error::{ConversionError, ConvertResult};
use crate::format::FormatTag;
use crate::normalize::flatten::flatten;
use crate::types::Converted;

use super::registry::StrategyContext;

const FLATTENED_WARNING: &str = "Nested JSON structure was flattened into a single-level object";

/// Decode with the detected charset; flatten objects, re-serialize everything else as is.
pub fn convert_json(content: &[u8], _ctx: &StrategyContext) -> ConvertResult<Converted> {
    let fail = |e: serde_json::Error| ConversionError::processing(FormatTag::Json, e.to_string());

    let text = encoding::decode(content);
    let parsed: Value = serde_json::from_str(text.trim_start_matches('\u{feff}')).map_err(fail)?;

    match &parsed {
        Value::Object(top) => {
            let flat = flatten(&parsed);
            let warning = (flat.len() > top.len()).then(|| FLATTENED_WARNING.to_string());
            let out = serde_json::to_string_pretty(&flat).map_err(fail)?;
            Ok(Converted::text(out).with_warning(warning))
        }
        _ => Ok(Converted::text(serde_json::to_string_pretty(&parsed).map_err(fail)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertOptions;

    fn ctx() -> StrategyContext {
        StrategyContext::new("data.json", &ConvertOptions::default())
    }

    #[test]
    fn nested_object_is_flattened_with_warning() {
        let out = convert_json(br#"{"a": {"b": 1, "c": [true]}}"#, &ctx()).unwrap();
        let v: Value = serde_json::from_str(out.content.as_text().unwrap()).unwrap();
        assert_eq!(v, serde_json::json!({"a.b": 1, "a.c[0]": true}));
        assert_eq!(out.warning.as_deref(), Some(FLATTENED_WARNING));
    }

    #[test]
    fn flat_object_has_no_warning() {
        let out = convert_json(br#"{"a": 1, "b": "x"}"#, &ctx()).unwrap();
        assert!(out.warning.is_none());
    }

    #[test]
    fn arrays_pass_through() {
        let out = convert_json(br#"[{"a": {"b": 1}}]"#, &ctx()).unwrap();
        let v: Value = serde_json::from_str(out.content.as_text().unwrap()).unwrap();
        assert_eq!(v, serde_json::json!([{"a": {"b": 1}}]));
        assert!(out.warning.is_none());
    }

    #[test]
    fn invalid_json_is_a_processing_error() {
        let err = convert_json(b"{nope", &ctx()).unwrap_err();
        assert!(err.to_string().starts_with("JSON processing error:"));
    }
}

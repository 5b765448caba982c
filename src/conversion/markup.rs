//! Generic XML to object conversion, plus the vendor-catalog strategy built on it.
//!
//! The object shape:
//!
//! - the document is `{ <root name>: <root element> }`;
//! - attributes live under `"$"`;
//! - an element with neither attributes nor children is its trimmed text;
//! - otherwise non-blank text lives under `"_"`;
//! - child elements are grouped by name, always as arrays.

use quick_xml::Reader;
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::encoding;
use crate::error::{ConversionError, ConvertResult};
use crate::format::FormatTag;
use crate::normalize::catalog;
use crate::types::Converted;

use super::registry::StrategyContext;

/// Errors from [`xml_to_value`].
#[derive(Debug, Error)]
pub enum MarkupError {
    #[error(transparent)]
    Xml(#[from] quick_xml::Error),
    #[error(transparent)]
    Attribute(#[from] AttrError),
    #[error("{0}")]
    Structure(&'static str),
}

#[derive(Default)]
struct Frame {
    name: String,
    attrs: Map<String, Value>,
    text: String,
    children: Map<String, Value>,
}

impl Frame {
    fn open(e: &BytesStart<'_>) -> Result<Self, MarkupError> {
        let mut attrs = Map::new();
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            attrs.insert(key, Value::String(attr.unescape_value()?.into_owned()));
        }
        Ok(Self {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            attrs,
            ..Self::default()
        })
    }

    fn close(self) -> (String, Value) {
        let text = self.text.trim();
        if self.attrs.is_empty() && self.children.is_empty() {
            return (self.name, Value::String(text.to_string()));
        }
        let mut obj = Map::new();
        if !self.attrs.is_empty() {
            obj.insert("$".to_string(), Value::Object(self.attrs));
        }
        if !text.is_empty() {
            obj.insert("_".to_string(), Value::String(text.to_string()));
        }
        obj.extend(self.children);
        (self.name, Value::Object(obj))
    }

    fn push_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            _ => {
                self.children.insert(name, Value::Array(vec![value]));
            }
        }
    }
}

/// Parse an XML document into the generic object shape.
pub fn xml_to_value(xml: &str) -> Result<Value, MarkupError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    let mut finish = |frame: Frame, stack: &mut Vec<Frame>| -> Result<(), MarkupError> {
        let (name, value) = frame.close();
        match stack.last_mut() {
            Some(parent) => parent.push_child(name, value),
            None if root.is_none() => root = Some((name, value)),
            None => return Err(MarkupError::Structure("multiple root elements")),
        }
        Ok(())
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(Frame::open(&e)?),
            Event::Empty(e) => {
                let frame = Frame::open(&e)?;
                finish(frame, &mut stack)?;
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or(MarkupError::Structure("unexpected closing tag"))?;
                finish(frame, &mut stack)?;
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&t.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(MarkupError::Structure("unexpected end of document"));
    }
    let (name, value) = root.ok_or(MarkupError::Structure("document has no root element"))?;
    let mut doc = Map::new();
    doc.insert(name, value);
    Ok(Value::Object(doc))
}

fn parse(content: &[u8], format: FormatTag) -> ConvertResult<Value> {
    let xml = encoding::decode(content);
    xml_to_value(&xml).map_err(|e| ConversionError::processing(format, e.to_string()))
}

fn pretty(value: &impl serde::Serialize, format: FormatTag) -> ConvertResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| ConversionError::processing(format, e.to_string()))
}

/// Strategy for `.xml`: the object tree as indented JSON.
pub fn convert_markup(content: &[u8], _ctx: &StrategyContext) -> ConvertResult<Converted> {
    let doc = parse(content, FormatTag::Markup)?;
    Ok(Converted::text(pretty(&doc, FormatTag::Markup)?))
}

/// Strategy for `.yml`: catalog summary when the document is a vendor catalog, generic markup
/// otherwise.
pub fn convert_vendor_catalog(content: &[u8], ctx: &StrategyContext) -> ConvertResult<Converted> {
    let format = FormatTag::VendorCatalogMarkup;
    let doc = parse(content, format)?;

    if !catalog::is_vendor_catalog(&doc) {
        return Ok(Converted::text(pretty(&doc, format)?));
    }
    let summary = catalog::transform_catalog(&doc)
        .ok_or_else(|| ConversionError::processing(format, "catalog has no shop element"))?;
    let warning = summary
        .yandex_market_catalog
        .size_warning(ctx.limits.catalog_offer_warning);
    Ok(Converted::text(pretty(&summary, format)?).with_warning(warning))
}

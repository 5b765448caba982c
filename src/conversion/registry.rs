//! Strategy registry: a dispatch table from [`FormatTag`] to conversion function.
//!
//! Adding a format is a [`StrategyRegistry::register`] call; nothing else branches on the tag.

use std::collections::HashMap;
use std::fmt;

use crate::config::{ConvertOptions, StreamingLimits};
use crate::error::{ConversionError, ConvertResult};
use crate::format::FormatTag;
use crate::types::Converted;

use super::{csv, excel, html, json, markup, office, pdf, text};

/// Per-file inputs a strategy may consult besides the raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyContext {
    pub file_name: String,
    pub limits: StreamingLimits,
    pub include_original_row_numbers: bool,
    pub include_file_name: bool,
    pub include_sheet_name: bool,
}

impl StrategyContext {
    pub fn new(file_name: impl Into<String>, options: &ConvertOptions) -> Self {
        Self {
            file_name: file_name.into(),
            limits: options.limits,
            include_original_row_numbers: options.include_original_row_numbers,
            include_file_name: options.include_file_name,
            include_sheet_name: options.include_sheet_name,
        }
    }
}

/// A conversion function.
pub type StrategyFn = fn(&[u8], &StrategyContext) -> ConvertResult<Converted>;

/// Mapping from format to strategy.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<FormatTag, StrategyFn>,
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats = self.formats();
        formats.sort();
        f.debug_struct("StrategyRegistry")
            .field("formats", &formats)
            .finish()
    }
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in strategy.
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        r.register(FormatTag::LegacyWordDocument, office::convert_legacy_word_document);
        r.register(FormatTag::WordDocument, office::convert_word_document);
        r.register(FormatTag::Markup, markup::convert_markup);
        r.register(FormatTag::VendorCatalogMarkup, markup::convert_vendor_catalog);
        r.register(FormatTag::Spreadsheet, excel::convert_spreadsheet);
        r.register(FormatTag::TabularText, csv::convert_csv);
        r.register(FormatTag::Pdf, pdf::convert_pdf);
        r.register(FormatTag::PlainText, text::convert_plain_text);
        r.register(FormatTag::LegacyPresentation, office::convert_legacy_presentation);
        r.register(FormatTag::Presentation, office::convert_presentation);
        r.register(FormatTag::WebMarkup, html::convert_html);
        r.register(FormatTag::OpenDocumentText, office::convert_open_document_text);
        r.register(FormatTag::OpenDocumentPresentation, office::convert_open_document_presentation);
        r.register(FormatTag::OpenDocumentSpreadsheet, office::convert_open_document_spreadsheet);
        r.register(FormatTag::Json, json::convert_json);
        r
    }

    /// Register (or replace) the strategy for `format`, returning the previous one.
    pub fn register(&mut self, format: FormatTag, strategy: StrategyFn) -> Option<StrategyFn> {
        self.strategies.insert(format, strategy)
    }

    pub fn unregister(&mut self, format: FormatTag) -> Option<StrategyFn> {
        self.strategies.remove(&format)
    }

    pub fn get(&self, format: FormatTag) -> Option<StrategyFn> {
        self.strategies.get(&format).copied()
    }

    pub fn contains(&self, format: FormatTag) -> bool {
        self.strategies.contains_key(&format)
    }

    /// Registered formats, in no particular order.
    pub fn formats(&self) -> Vec<FormatTag> {
        self.strategies.keys().copied().collect()
    }

    /// Run the strategy registered for `format`.
    pub fn convert(
        &self,
        format: FormatTag,
        content: &[u8],
        ctx: &StrategyContext,
    ) -> ConvertResult<Converted> {
        let strategy = self.get(format).ok_or_else(|| {
            ConversionError::unsupported(format!(
                "No conversion strategy registered for format: {format}"
            ))
        })?;
        strategy(content, ctx)
    }
}

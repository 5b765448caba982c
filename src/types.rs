//! Core data model types for conversion.
//!
//! A batch entry becomes a [`ConversionRequest`]; each request produces one [`ConversionResult`]
//! whose [`Content`] is either flat text or a set of [`SheetResult`]s; the batch is assembled into
//! a [`BatchResult`].

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{ConversionError, ConvertResult, ErrorKind};
use crate::format::FormatTag;

/// Upper bound on a sanitized file name, in characters.
pub const MAX_FILE_NAME_CHARS: usize = 255;

/// A single cell value in a [`SheetRow`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Boolean.
    Bool(bool),
    /// 64-bit signed integer (also used for integral spreadsheet numbers).
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// UTF-8 string. Dates, durations and cell errors are rendered into this form.
    Utf8(String),
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Utf8(s.to_string())
    }
}

/// One materialized row: column label to cell value, in column order.
///
/// `orig_row` is the 1-based row number in the source sheet, present only when requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SheetRow {
    #[serde(flatten)]
    pub cells: IndexMap<String, CellValue>,
    #[serde(rename = "origRow", skip_serializing_if = "Option::is_none")]
    pub orig_row: Option<u32>,
}

impl SheetRow {
    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }
}

/// Rows of a sheet: either the plain sequence, or an explicit truncation wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SheetRows {
    Rows(Vec<SheetRow>),
    Truncated {
        data: Vec<SheetRow>,
        truncated: bool,
        #[serde(rename = "totalRows")]
        total_rows: usize,
    },
}

impl SheetRows {
    /// Retained rows, regardless of truncation.
    pub fn rows(&self) -> &[SheetRow] {
        match self {
            Self::Rows(rows) => rows,
            Self::Truncated { data, .. } => data,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::Truncated { .. })
    }
}

/// A single sheet of structured output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    pub data: SheetRows,
}

/// Converted content: exactly one of flat text or named sheets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Content {
    Text(String),
    Sheets(IndexMap<String, SheetResult>),
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Sheets(_) => None,
        }
    }

    pub fn as_sheets(&self) -> Option<&IndexMap<String, SheetResult>> {
        match self {
            Self::Sheets(s) => Some(s),
            Self::Text(_) => None,
        }
    }
}

/// What a strategy returns: content plus an optional warning. Metadata is attached later.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub content: Content,
    pub warning: Option<String>,
}

impl Converted {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Content::Text(text.into()),
            warning: None,
        }
    }

    pub fn sheets(sheets: IndexMap<String, SheetResult>) -> Self {
        Self {
            content: Content::Sheets(sheets),
            warning: None,
        }
    }

    pub fn with_warning(mut self, warning: Option<String>) -> Self {
        self.warning = warning;
        self
    }
}

/// Per-file metadata attached after conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub file_name: String,
    pub file_size: usize,
    pub file_type: FormatTag,
    pub processed_at: DateTime<Utc>,
}

/// The result of converting one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionResult {
    #[serde(flatten)]
    pub content: Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub metadata: FileMetadata,
}

/// One batch entry as supplied by the host: raw bytes plus an optional declared name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInput {
    pub file_name: Option<String>,
    pub content: Vec<u8>,
}

impl FileInput {
    pub fn new(file_name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            content: content.into(),
        }
    }

    /// An entry whose host item carried no file name.
    pub fn unnamed(content: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: None,
            content: content.into(),
        }
    }
}

/// One batch entry at pipeline entry.
///
/// Construction enforces the invariants: the name is present and sanitized, the content is
/// non-empty and within the size ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub index: usize,
    pub file_name: String,
    pub content: Vec<u8>,
}

impl ConversionRequest {
    /// Validate and build a request.
    ///
    /// Checks run in order: name present, content non-empty, content within `max_bytes`, name
    /// sanitization.
    pub fn new(
        index: usize,
        file_name: Option<&str>,
        content: Vec<u8>,
        max_bytes: usize,
    ) -> ConvertResult<Self> {
        let raw_name = match file_name {
            Some(n) if !n.is_empty() => n,
            _ => {
                return Err(ConversionError::file_type(format!(
                    "File does not contain a valid name (item {index})"
                )));
            }
        };
        if content.is_empty() {
            return Err(ConversionError::empty("File is empty or contains no data"));
        }
        if content.len() > max_bytes {
            return Err(ConversionError::too_large(format!(
                "File is too large ({} bytes, maximum {} MB)",
                content.len(),
                max_bytes / (1024 * 1024)
            )));
        }
        Ok(Self {
            index,
            file_name: sanitize_file_name(raw_name)?,
            content,
        })
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Sanitize a declared file name.
///
/// Names containing traversal segments or separators are rejected; reserved and control
/// characters become `_`; the result is capped at [`MAX_FILE_NAME_CHARS`]. An empty name maps to
/// `unknown_file` for direct callers; [`ConversionRequest::new`] rejects empty names first.
pub fn sanitize_file_name(file_name: &str) -> ConvertResult<String> {
    if file_name.is_empty() {
        return Ok("unknown_file".to_string());
    }
    if file_name.contains("..") || file_name.contains('/') || file_name.contains('\\') {
        return Err(ConversionError::file_type(
            "Invalid file name: contains path traversal characters",
        ));
    }

    Ok(file_name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            '\u{0}'..='\u{1f}' | '\u{7f}'..='\u{9f}' => '_',
            other => other,
        })
        .take(MAX_FILE_NAME_CHARS)
        .collect())
}

/// Failure record used in grouped output when the batch runs with partial success enabled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedFile {
    pub error: ErrorRecord,
    pub metadata: FailedFileMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedFileMetadata {
    pub file_name: Option<String>,
    pub index: usize,
}

/// One entry of a grouped record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FileEntry {
    Converted(ConversionResult),
    Failed(FailedFile),
}

impl FileEntry {
    pub fn as_converted(&self) -> Option<&ConversionResult> {
        match self {
            Self::Converted(r) => Some(r),
            Self::Failed(_) => None,
        }
    }
}

/// The single aggregate record of grouped mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedRecord {
    pub files: Vec<FileEntry>,
    pub total_files: usize,
    pub processed_at: DateTime<Utc>,
}

/// One record per sheet in separate-items mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetItem {
    pub rows: SheetRows,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,
    pub file_type: FormatTag,
    pub file_size: usize,
    pub processed_at: DateTime<Utc>,
}

/// Output of a batch: one grouped record, or a flat sequence of per-sheet records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchResult {
    Grouped(GroupedRecord),
    SeparateItems(Vec<SheetItem>),
}

impl BatchResult {
    pub fn as_grouped(&self) -> Option<&GroupedRecord> {
        match self {
            Self::Grouped(g) => Some(g),
            Self::SeparateItems(_) => None,
        }
    }

    pub fn as_separate_items(&self) -> Option<&[SheetItem]> {
        match self {
            Self::SeparateItems(items) => Some(items),
            Self::Grouped(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_reserved_and_control_characters() {
        assert_eq!(sanitize_file_name("a<b>c:d\"e|f?g*h.txt").unwrap(), "a_b_c_d_e_f_g_h.txt");
        assert_eq!(sanitize_file_name("tab\there\u{85}.csv").unwrap(), "tab_here_.csv");
        assert_eq!(sanitize_file_name("").unwrap(), "unknown_file");
    }

    #[test]
    fn sanitize_rejects_traversal() {
        for bad in ["../etc/passwd", "dir/file.txt", "dir\\file.txt", "a..b"] {
            let err = sanitize_file_name(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::FileTypeError, "{bad}");
        }
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(300) + ".txt";
        assert_eq!(sanitize_file_name(&long).unwrap().chars().count(), MAX_FILE_NAME_CHARS);
    }

    #[test]
    fn request_validation_order() {
        let err = ConversionRequest::new(3, None, vec![1], 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileTypeError);
        assert!(err.message().contains("item 3"));

        let err = ConversionRequest::new(0, Some("a.txt"), Vec::new(), 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyFileError);

        let err = ConversionRequest::new(0, Some("a.txt"), vec![0; 11], 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileTooLargeError);

        let req = ConversionRequest::new(0, Some("a?.txt"), vec![b'x'], 10).unwrap();
        assert_eq!(req.file_name, "a_.txt");
    }

    #[test]
    fn sheet_rows_serialize_plain_or_wrapped() {
        let mut row = SheetRow::default();
        row.cells.insert("A".into(), CellValue::Int64(1));
        row.orig_row = Some(2);

        let plain = serde_json::to_value(SheetRows::Rows(vec![row.clone()])).unwrap();
        assert_eq!(plain, serde_json::json!([{"A": 1, "origRow": 2}]));

        let wrapped = serde_json::to_value(SheetRows::Truncated {
            data: vec![row],
            truncated: true,
            total_rows: 5,
        })
        .unwrap();
        assert_eq!(wrapped["truncated"], serde_json::json!(true));
        assert_eq!(wrapped["totalRows"], serde_json::json!(5));
    }

    #[test]
    fn content_serializes_as_text_or_sheets_key() {
        let v = serde_json::to_value(Content::Text("hi".into())).unwrap();
        assert_eq!(v, serde_json::json!({"text": "hi"}));
    }
}

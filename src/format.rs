//! Format resolution.
//!
//! A [`FormatTag`] is resolved once per request by [`resolve_format`]:
//!
//! - the lower-cased file-name extension is matched against the supported set;
//! - if it is absent or unknown, the content's magic signature is sniffed with `infer`;
//! - legacy compound-file (CFB) word-processing and presentation containers are positively
//!   fingerprinted and rejected with an actionable message.

use std::fmt;
use std::path::Path;

use serde::{Serialize, Serializer};
use tracing::warn;

use crate::error::{ConversionError, ConvertResult};

/// First eight bytes of an OLE2 compound file (legacy `.doc`/`.ppt`/`.xls`).
pub const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const LEGACY_DOC_MESSAGE: &str = "Legacy DOC files (Word 97-2003) are not supported. \
Please save the file as DOCX (Word 2007+) and try again.";
const LEGACY_PPT_MESSAGE: &str = "Legacy PPT files (PowerPoint 97-2003) are not supported. \
Please save the file as PPTX (PowerPoint 2007+) and try again.";

/// Supported logical formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatTag {
    /// Office Open XML word-processing document (`.docx`).
    WordDocument,
    /// Word 97-2003 document (`.doc`).
    LegacyWordDocument,
    /// Generic XML markup (`.xml`).
    Markup,
    /// Product-catalog markup (`.yml`).
    VendorCatalogMarkup,
    /// Office Open XML workbook (`.xlsx`).
    Spreadsheet,
    /// Delimited text (`.csv`).
    TabularText,
    /// Portable Document Format.
    Pdf,
    /// Plain text (`.txt`).
    PlainText,
    /// Office Open XML presentation (`.pptx`).
    Presentation,
    /// PowerPoint 97-2003 presentation (`.ppt`).
    LegacyPresentation,
    /// HTML (`.html`, `.htm`).
    WebMarkup,
    /// OpenDocument text (`.odt`).
    OpenDocumentText,
    /// OpenDocument presentation (`.odp`).
    OpenDocumentPresentation,
    /// OpenDocument spreadsheet (`.ods`).
    OpenDocumentSpreadsheet,
    /// JSON document.
    Json,
}

impl FormatTag {
    /// Every supported tag, in registration order.
    pub const ALL: [FormatTag; 15] = [
        FormatTag::LegacyWordDocument,
        FormatTag::WordDocument,
        FormatTag::Markup,
        FormatTag::VendorCatalogMarkup,
        FormatTag::Spreadsheet,
        FormatTag::TabularText,
        FormatTag::Pdf,
        FormatTag::PlainText,
        FormatTag::LegacyPresentation,
        FormatTag::Presentation,
        FormatTag::WebMarkup,
        FormatTag::OpenDocumentText,
        FormatTag::OpenDocumentPresentation,
        FormatTag::OpenDocumentSpreadsheet,
        FormatTag::Json,
    ];

    /// Parse a format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "doc" => Some(Self::LegacyWordDocument),
            "docx" => Some(Self::WordDocument),
            "xml" => Some(Self::Markup),
            "yml" => Some(Self::VendorCatalogMarkup),
            "xlsx" => Some(Self::Spreadsheet),
            "csv" => Some(Self::TabularText),
            "pdf" => Some(Self::Pdf),
            "txt" => Some(Self::PlainText),
            "ppt" => Some(Self::LegacyPresentation),
            "pptx" => Some(Self::Presentation),
            "html" | "htm" => Some(Self::WebMarkup),
            "odt" => Some(Self::OpenDocumentText),
            "odp" => Some(Self::OpenDocumentPresentation),
            "ods" => Some(Self::OpenDocumentSpreadsheet),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Canonical extension, used as `fileType` in result metadata.
    pub fn extension(self) -> &'static str {
        match self {
            Self::LegacyWordDocument => "doc",
            Self::WordDocument => "docx",
            Self::Markup => "xml",
            Self::VendorCatalogMarkup => "yml",
            Self::Spreadsheet => "xlsx",
            Self::TabularText => "csv",
            Self::Pdf => "pdf",
            Self::PlainText => "txt",
            Self::LegacyPresentation => "ppt",
            Self::Presentation => "pptx",
            Self::WebMarkup => "html",
            Self::OpenDocumentText => "odt",
            Self::OpenDocumentPresentation => "odp",
            Self::OpenDocumentSpreadsheet => "ods",
            Self::Json => "json",
        }
    }

    /// Upper-case label used to prefix processing errors (`"DOCX processing error: ..."`).
    pub fn label(self) -> String {
        self.extension().to_ascii_uppercase()
    }

    /// Legacy binary containers that are rejected when fingerprinted as CFB.
    pub fn is_legacy_container(self) -> bool {
        matches!(self, Self::LegacyWordDocument | Self::LegacyPresentation)
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl Serialize for FormatTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.extension())
    }
}

/// Lower-cased extension of `file_name`, if any.
pub fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_ascii_lowercase())
}

/// Sniff the format from the content's magic signature.
pub fn sniff_format(content: &[u8]) -> Option<FormatTag> {
    let kind = infer::get(content)?;
    FormatTag::from_extension(kind.extension())
}

/// Whether `content` starts with the OLE2 compound-file signature.
pub fn is_compound_file(content: &[u8]) -> bool {
    content.len() >= CFB_SIGNATURE.len() && content[..CFB_SIGNATURE.len()] == CFB_SIGNATURE
}

/// Reject legacy binary word-processing/presentation containers early.
pub fn reject_legacy_container(format: FormatTag, content: &[u8]) -> ConvertResult<()> {
    if !is_compound_file(content) {
        return Ok(());
    }
    match format {
        FormatTag::LegacyWordDocument => Err(ConversionError::unsupported(LEGACY_DOC_MESSAGE)),
        FormatTag::LegacyPresentation => Err(ConversionError::unsupported(LEGACY_PPT_MESSAGE)),
        _ => Ok(()),
    }
}

/// Resolve the logical format of a request from its (sanitized) name and content.
pub fn resolve_format(file_name: &str, content: &[u8]) -> ConvertResult<FormatTag> {
    let ext = extension_of(file_name);
    let by_extension = ext.as_deref().and_then(FormatTag::from_extension);

    let format = match by_extension {
        Some(f) => f,
        None => match sniff_format(content) {
            Some(f) => f,
            None => {
                let shown = ext.as_deref().unwrap_or("unknown");
                warn!(file = file_name, ext = shown, "file type detection failed");
                return Err(ConversionError::unsupported(format!(
                    "Unsupported file type: {shown}"
                )));
            }
        },
    };

    reject_legacy_container(format, content)?;
    Ok(format)
}

use serde::Serialize;
use thiserror::Error;

use crate::format::FormatTag;

/// Convenience result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConversionError>;

/// Error type returned by conversion functions.
///
/// This is a single error enum shared by validation, format resolution and every registered
/// strategy. Decoder failures never escape as their native error types: strategies wrap them in
/// [`ConversionError::Processing`] with the decoder message preserved.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionError {
    /// The input item is malformed (missing name, invalid name, bad parameter).
    #[error("file type error: {message}")]
    FileType { message: String },

    /// The input exceeds the configured size ceiling.
    #[error("file too large: {message}")]
    FileTooLarge { message: String },

    /// The format could not be resolved, is not registered, or is an explicitly rejected legacy
    /// binary container.
    #[error("unsupported format: {message}")]
    UnsupportedFormat { message: String },

    /// The input has no bytes, or the conversion produced blank text.
    #[error("empty file: {message}")]
    EmptyFile { message: String },

    /// A registered strategy failed while decoding.
    #[error("{} processing error: {message}", format.label())]
    Processing { format: FormatTag, message: String },
}

/// Discriminant of [`ConversionError`], suitable for matching and for serialized error records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    FileTypeError,
    FileTooLargeError,
    UnsupportedFormatError,
    EmptyFileError,
    ProcessingError,
}

impl ConversionError {
    pub fn file_type(message: impl Into<String>) -> Self {
        Self::FileType {
            message: message.into(),
        }
    }

    pub fn too_large(message: impl Into<String>) -> Self {
        Self::FileTooLarge {
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::EmptyFile {
            message: message.into(),
        }
    }

    pub fn processing(format: FormatTag, message: impl Into<String>) -> Self {
        Self::Processing {
            format,
            message: message.into(),
        }
    }

    /// The error kind enumerant.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileType { .. } => ErrorKind::FileTypeError,
            Self::FileTooLarge { .. } => ErrorKind::FileTooLargeError,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormatError,
            Self::EmptyFile { .. } => ErrorKind::EmptyFileError,
            Self::Processing { .. } => ErrorKind::ProcessingError,
        }
    }

    /// The human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::FileType { message }
            | Self::FileTooLarge { message }
            | Self::UnsupportedFormat { message }
            | Self::EmptyFile { message }
            | Self::Processing { message, .. } => message,
        }
    }

    /// Validation failures are raised before any decoder runs.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Processing { .. })
    }
}

//! `doc-convert` turns uploaded documents into normalized output: plain text for prose formats,
//! and column-lettered sheets for tabular ones.
//!
//! The primary entrypoint is [`pipeline::convert_batch`], which converts a batch of
//! [`types::FileInput`]s with bounded concurrency and returns a [`types::BatchResult`] in input
//! order. Single files go through [`conversion::convert_file`].
//!
//! ## What you can convert
//!
//! Formats are resolved from the file extension first, then from the content signature:
//!
//! - **Text output**: `.docx`, `.pptx`, `.odt`, `.odp`, `.ods`, `.pdf`, `.txt`, `.html`/`.htm`,
//!   `.xml`, `.yml` (product catalogs), `.json`
//! - **Sheet output**: `.xlsx` (every worksheet), `.csv` (one sheet named `Sheet1`)
//!
//! Legacy `.doc`/`.ppt` binaries are rejected with a message asking for the modern format.
//!
//! Workbook rows are keyed by column letter (`A`, `B`, ..., `AA`), CSV rows by header, and both
//! only carry populated cells.
//! Large inputs switch to an incremental read path with the same truncation caps as the
//! whole-buffer path (see [`config::StreamingLimits`]).
//!
//! ## Quick example
//!
//! ```
//! use doc_convert::config::ConvertOptions;
//! use doc_convert::pipeline::convert_batch;
//! use doc_convert::types::FileInput;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), doc_convert::ConversionError> {
//! let inputs = vec![FileInput::new("people.csv", "name,age\nAnn,31\n")];
//! let out = convert_batch(inputs, &ConvertOptions::default()).await?;
//!
//! let grouped = out.as_grouped().unwrap();
//! let sheets = grouped.files[0].as_converted().unwrap().content.as_sheets().unwrap();
//! assert_eq!(sheets["Sheet1"].data.rows().len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`format`]: extension and signature based format resolution
//! - [`conversion`]: strategy registry, per-format strategies, observers
//! - [`normalize`]: JSON flattening, sheet materialization, catalog reshaping
//! - [`streaming`]: whole-buffer vs incremental reads
//! - [`execution`]: ordered bounded-concurrency scheduler
//! - [`pipeline`]: batch entrypoint and result assembly
//! - [`error`]: the error taxonomy shared by all of the above

pub mod config;
pub mod conversion;
pub mod encoding;
pub mod error;
pub mod execution;
pub mod format;
pub mod normalize;
pub mod pipeline;
pub mod streaming;
pub mod types;

pub use config::{ConvertOptions, FailurePolicy, NodeParameters, StreamingLimits};
pub use error::{ConversionError, ConvertResult, ErrorKind};
pub use format::FormatTag;
pub use pipeline::{convert_batch, convert_batch_with};

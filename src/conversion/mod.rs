//! Per-file conversion.
//!
//! Most callers should use [`convert_file`] (from [`unified`]) which:
//!
//! - validates and sanitizes the input
//! - resolves the format (extension first, then magic signature)
//! - dispatches to the strategy registered in a [`StrategyRegistry`]
//! - attaches metadata and reports to an optional [`ConversionObserver`]
//!
//! Format-specific strategies live in [`office`], [`pdf`], [`markup`], [`html`], [`json`],
//! [`csv`], [`excel`] and [`text`].

pub mod csv;
pub mod excel;
pub mod html;
pub mod json;
pub mod markup;
pub mod observability;
pub mod office;
pub mod pdf;
pub mod registry;
pub mod text;
pub mod unified;

pub use observability::{
    CompositeObserver, ConversionContext, ConversionObserver, ConversionSeverity, ConversionStats,
    FileObserver, TracingObserver,
};
pub use registry::{StrategyContext, StrategyFn, StrategyRegistry};
pub use unified::{convert_file, convert_request};

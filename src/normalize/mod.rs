//! Shape normalizers shared by the conversion strategies.

pub mod catalog;
pub mod flatten;
pub mod sheet;

pub use flatten::flatten;
pub use sheet::column_letter;

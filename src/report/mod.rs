//! Result types and their renderings.
//!
//! - `result`: the serialisable [`AnalysisResult`]
//! - `table`: CSV tables for spreadsheets
//! - `format`: a plain-text summary

pub mod format;
pub mod result;
pub mod table;

pub use format::format_summary;
pub use result::*;
pub use table::{diagnostics_csv, species_csv};

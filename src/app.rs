//! Engine entry points.
//!
//! This module is what front-ends call:
//! - hand over raw endpoints and an [`AnalysisConfig`](crate::domain::AnalysisConfig)
//! - optionally pass a [`RunControl`] for progress, cancellation or a fixed
//!   `generated_at` timestamp
//! - receive an [`AnalysisResult`](crate::report::AnalysisResult) or an
//!   [`SsdError`](crate::error::SsdError)

pub mod pipeline;

pub use crate::fit::bootstrap::RunControl;
pub use pipeline::{curve_grid, run_analysis, run_analysis_with};

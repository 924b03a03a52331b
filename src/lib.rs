//! `ssd-engine` library crate.
//!
//! Fits species sensitivity distributions to aggregated toxicity endpoints and
//! derives a protective hazardous concentration (HCp):
//!
//! - clean and aggregate endpoints to one value per species
//! - fit Log-Normal, Log-Logistic, Weibull and Gamma by maximum likelihood
//! - weight the fits by AICc and invert the weighted CDF for the HCp
//! - bootstrap a confidence interval and apply the protection clause
//!
//! The entry point is [`app::run_analysis`].

pub mod app;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod math;
pub mod models;
pub mod report;

pub use app::{RunControl, run_analysis, run_analysis_with};
pub use domain::{AnalysisConfig, RawEndpoint};
pub use error::SsdError;
pub use report::AnalysisResult;

//! Error taxonomy for an SSD run.
//!
//! Only whole-run failures reach the caller. Per-family fit failures and failed
//! bootstrap iterations are recovered locally and surface as warnings.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SsdError {
    /// Too few species survived cleaning/aggregation.
    #[error("Not enough valid data: {found} species with valid endpoints (minimum {required} required).")]
    InsufficientData { found: usize, required: usize },

    /// One or more required taxonomic groups are not represented.
    #[error("Missing required taxonomic group(s): {}.", missing.join(", "))]
    MissingTaxonomicGroup { missing: Vec<String> },

    /// No distribution family could be fitted to the observed data.
    #[error("Failed to fit any valid distribution to the data: {reason}")]
    AllModelsFailed { reason: String },

    /// A bootstrap resample is unusable (e.g. zero variance).
    ///
    /// The bootstrap engine drops such iterations; this never propagates out of
    /// [`crate::app::run_analysis`].
    #[error("Degenerate bootstrap resample: {0}")]
    DegenerateResample(String),

    /// The analysis configuration is inconsistent or out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SsdError {
    /// Short, stable identifier for the error kind (handy for UI/log routing).
    pub fn kind(&self) -> &'static str {
        match self {
            SsdError::InsufficientData { .. } => "insufficient_data",
            SsdError::MissingTaxonomicGroup { .. } => "missing_taxonomic_group",
            SsdError::AllModelsFailed { .. } => "all_models_failed",
            SsdError::DegenerateResample(_) => "degenerate_resample",
            SsdError::InvalidConfig(_) => "invalid_config",
        }
    }
}

//! The analysis result handed back to callers.
//!
//! Every numeric field is a finite `f64` or an `Option`, so the whole value
//! survives a JSON round trip unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{AggregationMode, AnalysisMode, BroadGroup, Family, Params};
use crate::fit::bootstrap::{ConfidenceInterval, CurveBand};
use crate::fit::gof::{GoodnessOfFit, InformationCriterion};
use crate::fit::guideline::Guideline;

/// Per-family outcome on the observed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FitOutcome {
    Fitted {
        params: Params,
        log_likelihood: f64,
        aicc: InformationCriterion,
        gof: GoodnessOfFit,
        /// Akaike weight (or 0/1 in single mode).
        weight: f64,
        /// The family's own quantile at the HCp percentile.
        hcp: f64,
    },
    Failed {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyDiagnostics {
    pub family: Family,
    pub outcome: FitOutcome,
}

impl FamilyDiagnostics {
    pub fn weight(&self) -> f64 {
        match &self.outcome {
            FitOutcome::Fitted { weight, .. } => *weight,
            FitOutcome::Failed { .. } => 0.0,
        }
    }
}

/// One row of the aggregated species table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRow {
    pub species: String,
    pub taxonomic_group: String,
    pub broad_group: BroadGroup,
    pub value: f64,
    pub endpoint_count: usize,
    /// Empirical percentile `i / (n + 1) * 100` of the i-th smallest value.
    pub plotting_position: f64,
}

/// Weighted CDF on a log-spaced grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsdCurve {
    pub concentrations: Vec<f64>,
    /// Mixture CDF in percent of species affected.
    pub percent_affected: Vec<f64>,
    /// Bootstrap percentile band, in percent, when the bootstrap produced one.
    pub band: Option<CurveBand>,
}

/// The settings a result was produced with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub aggregation: AggregationMode,
    pub analysis_mode: AnalysisMode,
    pub selected_family: Option<Family>,
    pub bootstrap_iterations: usize,
    pub confidence_level: f64,
    pub random_seed: u64,
    pub species_count: usize,
    pub rows_read: usize,
    pub rows_used: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Hazardous concentration for `hcp_percentile` percent of species.
    pub hcp: f64,
    pub hcp_percentile: f64,
    pub interval: Option<ConfidenceInterval>,
    /// Absent when no interval could be computed.
    pub guideline: Option<Guideline>,
    pub diagnostics: Vec<FamilyDiagnostics>,
    pub species: Vec<SpeciesRow>,
    pub curve: SsdCurve,
    pub parameters: RunParameters,
    /// In the order they were raised.
    pub warnings: Vec<String>,
}

impl AnalysisResult {
    /// Model weights for every family (0 for failed or unselected families).
    pub fn weights(&self) -> Vec<(Family, f64)> {
        self.diagnostics.iter().map(|d| (d.family, d.weight())).collect()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - handed to the engine by the data-source collaborator (`RawEndpoint`)
//! - used in-memory during fitting (`SpeciesValue`, `Params`)
//! - returned to the caller inside an `AnalysisResult`

use serde::{Deserialize, Serialize};

/// Media the toxicity test was run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Freshwater,
    Marine,
    #[default]
    Unspecified,
}

/// Exposure duration class of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExposureTerm {
    Chronic,
    Subchronic,
    Acute,
    #[default]
    Unspecified,
}

/// A raw endpoint value as delivered by the data source.
///
/// Databases and spreadsheets mix numbers with textual markers such as
/// `"not reported"` or `"NR"`. Those are treated as missing, never as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndpointValue {
    Numeric(f64),
    Text(String),
}

impl EndpointValue {
    /// The value as a finite, strictly positive concentration, if it is one.
    pub fn positive_value(&self) -> Option<f64> {
        let v = match self {
            EndpointValue::Numeric(v) => *v,
            EndpointValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        (v.is_finite() && v > 0.0).then_some(v)
    }
}

impl From<f64> for EndpointValue {
    fn from(value: f64) -> Self {
        EndpointValue::Numeric(value)
    }
}

impl From<&str> for EndpointValue {
    fn from(value: &str) -> Self {
        EndpointValue::Text(value.to_string())
    }
}

/// One observed toxicity record for a single chemical/filter selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEndpoint {
    pub species: String,
    pub taxonomic_group: String,
    pub endpoint_value: EndpointValue,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub exposure_term: ExposureTerm,
}

impl RawEndpoint {
    pub fn new(
        species: impl Into<String>,
        taxonomic_group: impl Into<String>,
        endpoint_value: impl Into<EndpointValue>,
    ) -> Self {
        Self {
            species: species.into(),
            taxonomic_group: taxonomic_group.into(),
            endpoint_value: endpoint_value.into(),
            media_type: MediaType::Unspecified,
            exposure_term: ExposureTerm::Unspecified,
        }
    }

    pub fn with_media(mut self, media_type: MediaType) -> Self {
        self.media_type = media_type;
        self
    }

    pub fn with_exposure(mut self, exposure_term: ExposureTerm) -> Self {
        self.exposure_term = exposure_term;
        self
    }
}

/// Broad taxonomic category used for grouping and required-group checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BroadGroup {
    Fish,
    Invertebrate,
    Plant,
    Amphibian,
    Other,
}

impl BroadGroup {
    pub fn display_name(self) -> &'static str {
        match self {
            BroadGroup::Fish => "Fish",
            BroadGroup::Invertebrate => "Invertebrate",
            BroadGroup::Plant => "Plant",
            BroadGroup::Amphibian => "Amphibian",
            BroadGroup::Other => "Other",
        }
    }
}

/// One aggregated toxicity value per species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesValue {
    pub species: String,
    /// Taxonomic label as supplied (first seen for the species).
    pub taxonomic_group: String,
    pub broad_group: BroadGroup,
    /// Aggregated concentration; always finite and `> 0`.
    pub value: f64,
    /// Number of endpoints that contributed to `value`.
    pub endpoint_count: usize,
}

/// How multiple endpoints for the same species are collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// `exp(mean(ln v))`
    #[default]
    GeometricMean,
    /// `min(v)`
    MostSensitive,
}

/// Whether to average the four families or use a single one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    Averaged,
    Single,
}

/// Distribution families supported by the engine.
///
/// The first two are fitted to `ln x`, the latter two to `x` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    LogNormal,
    LogLogistic,
    Weibull,
    Gamma,
}

impl Family {
    pub const ALL: [Family; 4] = [
        Family::LogNormal,
        Family::LogLogistic,
        Family::Weibull,
        Family::Gamma,
    ];

    /// Human-readable label for reports.
    pub fn display_name(self) -> &'static str {
        match self {
            Family::LogNormal => "Log-Normal",
            Family::LogLogistic => "Log-Logistic",
            Family::Weibull => "Weibull",
            Family::Gamma => "Gamma",
        }
    }

    /// Whether the family is estimated on log-transformed concentrations.
    pub fn fits_log_scale(self) -> bool {
        matches!(self, Family::LogNormal | Family::LogLogistic)
    }

    /// Parameter count used for information criteria.
    ///
    /// Shape, location and scale all count, for every family, so AICc values stay
    /// comparable.
    pub fn param_count(self) -> usize {
        3
    }
}

/// Distribution parameters in the original-concentration parametrisation.
///
/// | family       | shape          | scale       |
/// |--------------|----------------|-------------|
/// | Log-Normal   | σ of `ln x`    | `exp(μ)`    |
/// | Log-Logistic | β = 1/s        | `exp(μ)`    |
/// | Weibull      | k              | λ           |
/// | Gamma        | a              | θ           |
///
/// `location` is a threshold: densities are evaluated at `x - location`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Params {
    pub shape: f64,
    pub location: f64,
    pub scale: f64,
}

impl Params {
    pub fn new(shape: f64, location: f64, scale: f64) -> Self {
        Self {
            shape,
            location,
            scale,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.shape.is_finite()
            && self.shape > 0.0
            && self.scale.is_finite()
            && self.scale > 0.0
            && self.location.is_finite()
    }
}

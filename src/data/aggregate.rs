//! Endpoint cleaning and per-species aggregation.
//!
//! Steps, in order:
//!
//! 1. media filter (when configured)
//! 2. group rows by trimmed species id, keeping the first-seen taxonomic label
//! 3. drop values that are not finite and positive (text markers count as missing)
//! 4. keep only the best-ranked exposure term present for the species
//! 5. collapse to one value (geometric mean or minimum)
//!
//! The result is sorted by value, ties broken by species id, so downstream
//! tables and plotting positions are deterministic.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::data::taxonomy::broad_group;
use crate::domain::{AggregationMode, AnalysisConfig, ExposureTerm, RawEndpoint, SpeciesValue};
use crate::error::SsdError;
use crate::math::geometric_mean;

/// Output of [`aggregate`].
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedData {
    /// One value per species, ascending.
    pub species: Vec<SpeciesValue>,
    pub warnings: Vec<String>,
    /// Rows handed to the cleaner.
    pub rows_read: usize,
    /// Rows that contributed to an aggregated value.
    pub rows_used: usize,
}

impl CleanedData {
    pub fn values(&self) -> Vec<f64> {
        self.species.iter().map(|s| s.value).collect()
    }

    /// Smallest aggregated value (the most sensitive species).
    pub fn min_value(&self) -> Option<f64> {
        self.species.first().map(|s| s.value)
    }
}

struct SpeciesRows {
    id: String,
    label: String,
    endpoints: Vec<(f64, ExposureTerm)>,
}

/// Clean `rows` and collapse them to one value per species.
pub fn aggregate(rows: &[RawEndpoint], config: &AnalysisConfig) -> Result<CleanedData, SsdError> {
    let mut order: Vec<SpeciesRows> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        if let Some(media) = config.media {
            if row.media_type != media {
                continue;
            }
        }

        let id = row.species.trim();
        if id.is_empty() {
            continue;
        }
        let slot = *index.entry(id.to_string()).or_insert_with(|| {
            order.push(SpeciesRows {
                id: id.to_string(),
                label: row.taxonomic_group.trim().to_string(),
                endpoints: Vec::new(),
            });
            order.len() - 1
        });

        if let Some(v) = row.endpoint_value.positive_value() {
            order[slot].endpoints.push((v, row.exposure_term));
        }
    }

    let mut warnings = Vec::new();
    let mut species = Vec::with_capacity(order.len());
    let mut rows_used = 0;

    for entry in order {
        let values = preferred_values(&entry.endpoints, &config.exposure_preference);
        let value = match collapse(&values, config.aggregation) {
            Some(v) => v,
            None => {
                let message = format!("Species '{}' excluded: no valid positive endpoint values.", entry.id);
                warn!("{message}");
                warnings.push(message);
                continue;
            }
        };

        rows_used += values.len();
        species.push(SpeciesValue {
            broad_group: broad_group(&entry.label),
            species: entry.id,
            taxonomic_group: entry.label,
            value,
            endpoint_count: values.len(),
        });
    }

    species.sort_by(|a, b| a.value.total_cmp(&b.value).then_with(|| a.species.cmp(&b.species)));

    debug!(
        rows_read = rows.len(),
        rows_used,
        species = species.len(),
        "aggregated endpoints"
    );

    if species.len() < config.min_species_count {
        return Err(SsdError::InsufficientData {
            found: species.len(),
            required: config.min_species_count,
        });
    }

    let missing = missing_groups(&species, &config.required_groups);
    if !missing.is_empty() {
        return Err(SsdError::MissingTaxonomicGroup { missing });
    }

    Ok(CleanedData {
        species,
        warnings,
        rows_read: rows.len(),
        rows_used,
    })
}

/// Values whose exposure term has the best rank present; all values when no
/// preference is configured.
fn preferred_values(endpoints: &[(f64, ExposureTerm)], preference: &[ExposureTerm]) -> Vec<f64> {
    if preference.is_empty() {
        return endpoints.iter().map(|(v, _)| *v).collect();
    }
    let rank = |term: ExposureTerm| preference.iter().position(|&p| p == term).unwrap_or(preference.len());

    let Some(best) = endpoints.iter().map(|(_, t)| rank(*t)).min() else {
        return Vec::new();
    };
    endpoints
        .iter()
        .filter(|(_, t)| rank(*t) == best)
        .map(|(v, _)| *v)
        .collect()
}

fn collapse(values: &[f64], mode: AggregationMode) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    match mode {
        AggregationMode::GeometricMean => geometric_mean(values),
        AggregationMode::MostSensitive => values.iter().copied().reduce(f64::min),
    }
}

fn missing_groups(species: &[SpeciesValue], required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|group| {
            let group = group.trim();
            !species.iter().any(|s| {
                s.broad_group.display_name().eq_ignore_ascii_case(group) || s.taxonomic_group.eq_ignore_ascii_case(group)
            })
        })
        .cloned()
        .collect()
}

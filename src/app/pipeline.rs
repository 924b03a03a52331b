//! The analysis pipeline.
//!
//! Cleaner -> fitters -> scorer -> averager on the observed data, then the
//! bootstrap over the aggregated values, then the protection clause. Callers
//! (UI, batch jobs, tests) only see [`run_analysis`] and the returned
//! [`AnalysisResult`].

use chrono::Utc;
use tracing::{info, warn};

use crate::data::aggregate::{CleanedData, aggregate};
use crate::domain::{AnalysisConfig, AnalysisMode, Family, RawEndpoint};
use crate::error::SsdError;
use crate::fit::averaging::ModelAverage;
use crate::fit::bootstrap::{BootstrapOutcome, BootstrapSettings, RunControl, TrialPlan, run_bootstrap};
use crate::fit::fitter::{FamilyFits, fit_families};
use crate::fit::gof::goodness_of_fit;
use crate::fit::guideline::finalize;
use crate::report::{AnalysisResult, FamilyDiagnostics, FitOutcome, RunParameters, SpeciesRow, SsdCurve};

/// Log-units added on each side of the data range for the reported curve.
const CURVE_PADDING_LN: f64 = 2.0;

/// Run a full analysis with no progress reporting or cancellation.
pub fn run_analysis(rows: &[RawEndpoint], config: &AnalysisConfig) -> Result<AnalysisResult, SsdError> {
    run_analysis_with(rows, config, &RunControl::default())
}

/// Run a full analysis, reporting bootstrap progress and honouring cancellation.
pub fn run_analysis_with(
    rows: &[RawEndpoint],
    config: &AnalysisConfig,
    control: &RunControl<'_>,
) -> Result<AnalysisResult, SsdError> {
    config.validate()?;

    // 1) Clean and aggregate.
    let cleaned = aggregate(rows, config)?;
    let mut warnings = cleaned.warnings.clone();
    let values = cleaned.values();
    let p = config.hcp_probability();

    // 2) Fit every family on the observed data; GOF is diagnostic only.
    let fits = fit_families(&values, &Family::ALL, p, true);
    for failure in &fits.failed {
        push_warning(
            &mut warnings,
            format!("{} fit failed: {}", failure.family.display_name(), failure.reason),
        );
    }
    if fits.fitted.iter().any(|m| !m.aicc.small_sample_corrected) {
        push_warning(
            &mut warnings,
            format!(
                "AICc is undefined for n={} with k=3 parameters; models are weighted by uncorrected AIC.",
                values.len()
            ),
        );
    }

    // 3) Weight and invert.
    let selected = match config.analysis_mode {
        AnalysisMode::Single => config.selected_family,
        AnalysisMode::Averaged => None,
    };
    let average = build_average(&fits, selected)?;
    let hcp = average.hcp(p).ok_or_else(|| SsdError::AllModelsFailed {
        reason: "weighted HCp could not be inverted".to_string(),
    })?;
    info!(hcp, percentile = config.hcp_percentile, species = values.len(), "observed HCp");

    // 4) Bootstrap.
    let grid = curve_grid(&values, config.curve_points);
    let families = config.active_families();
    let plan = TrialPlan {
        families: &families,
        selected,
        p,
        grid: &grid,
    };
    let settings = BootstrapSettings {
        iterations: config.bootstrap_iterations,
        confidence_level: config.confidence_level,
        max_failure_rate: config.max_failure_rate,
        seed: config.random_seed,
        parallel: config.parallel,
    };
    let BootstrapOutcome {
        interval,
        band,
        warnings: boot_warnings,
        ..
    } = run_bootstrap(&values, &plan, &settings, control);
    warnings.extend(boot_warnings);

    // 5) Protection clause.
    let min_value = cleaned.min_value().unwrap_or(0.0);
    let guideline = interval.as_ref().map(|ci| finalize(ci.lower, min_value));
    if let Some(message) = guideline.as_ref().and_then(|g| g.clamp_warning()) {
        push_warning(&mut warnings, message);
    }

    let diagnostics = diagnostics(&fits, &average, &values, p);
    let curve = SsdCurve {
        percent_affected: grid.iter().map(|&x| average.cdf(x) * 100.0).collect(),
        concentrations: grid,
        band: band.map(|mut b| {
            b.lower.iter_mut().chain(b.upper.iter_mut()).for_each(|v| *v *= 100.0);
            b
        }),
    };

    Ok(AnalysisResult {
        hcp,
        hcp_percentile: config.hcp_percentile,
        interval,
        guideline,
        diagnostics,
        species: species_rows(&cleaned),
        curve,
        parameters: RunParameters {
            aggregation: config.aggregation,
            analysis_mode: config.analysis_mode,
            selected_family: selected,
            bootstrap_iterations: config.bootstrap_iterations,
            confidence_level: config.confidence_level,
            random_seed: config.random_seed,
            species_count: cleaned.species.len(),
            rows_read: cleaned.rows_read,
            rows_used: cleaned.rows_used,
            generated_at: control.generated_at.unwrap_or_else(Utc::now),
        },
        warnings,
    })
}

fn build_average(fits: &FamilyFits, selected: Option<Family>) -> Result<ModelAverage, SsdError> {
    let reasons = || {
        fits.failed
            .iter()
            .map(|f| format!("{}: {}", f.family.display_name(), f.reason))
            .collect::<Vec<_>>()
            .join("; ")
    };

    match selected {
        Some(family) => {
            if !fits.fitted.iter().any(|m| m.family == family) {
                return Err(SsdError::AllModelsFailed { reason: reasons() });
            }
            ModelAverage::single(fits.fitted.clone(), family)
        }
        None => {
            if fits.fitted.is_empty() {
                return Err(SsdError::AllModelsFailed { reason: reasons() });
            }
            ModelAverage::akaike(fits.fitted.clone())
        }
    }
}

/// One row per family in canonical order.
fn diagnostics(fits: &FamilyFits, average: &ModelAverage, values: &[f64], p: f64) -> Vec<FamilyDiagnostics> {
    Family::ALL
        .iter()
        .filter_map(|&family| {
            if let Some(model) = fits.fitted.iter().find(|m| m.family == family) {
                let outcome = match model.quantile(p) {
                    Some(hcp) => FitOutcome::Fitted {
                        params: model.params,
                        log_likelihood: model.log_likelihood,
                        aicc: model.aicc,
                        gof: model
                            .gof
                            .unwrap_or_else(|| goodness_of_fit(family, &model.params, values)),
                        weight: average.weight_of(family),
                        hcp,
                    },
                    None => FitOutcome::Failed {
                        reason: "could not derive a valid positive HCp".to_string(),
                    },
                };
                return Some(FamilyDiagnostics { family, outcome });
            }
            fits.failed.iter().find(|f| f.family == family).map(|f| FamilyDiagnostics {
                family,
                outcome: FitOutcome::Failed {
                    reason: f.reason.clone(),
                },
            })
        })
        .collect()
}

fn species_rows(cleaned: &CleanedData) -> Vec<SpeciesRow> {
    let n = cleaned.species.len() as f64;
    cleaned
        .species
        .iter()
        .enumerate()
        .map(|(i, s)| SpeciesRow {
            species: s.species.clone(),
            taxonomic_group: s.taxonomic_group.clone(),
            broad_group: s.broad_group,
            value: s.value,
            endpoint_count: s.endpoint_count,
            plotting_position: (i + 1) as f64 / (n + 1.0) * 100.0,
        })
        .collect()
}

/// `points` log-spaced concentrations spanning the data, padded on both sides.
pub fn curve_grid(values: &[f64], points: usize) -> Vec<f64> {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !(lo > 0.0 && hi.is_finite()) || points < 2 {
        return Vec::new();
    }

    let a = lo.ln() - CURVE_PADDING_LN;
    let b = hi.ln() + CURVE_PADDING_LN;
    let step = (b - a) / (points - 1) as f64;
    (0..points).map(|i| (a + step * i as f64).exp()).collect()
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

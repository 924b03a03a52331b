//! Non-parametric bootstrap of the HCp.
//!
//! Each iteration resamples the aggregated species values with replacement,
//! refits the active families, re-weights them and records the HCp plus the
//! weighted CDF on the report grid.
//!
//! - every iteration owns an RNG seeded from `(seed, iteration)`, so the outcome
//!   does not depend on thread scheduling
//! - iterations run on the rayon pool when `parallel` is set
//! - failed iterations are dropped and counted; cancelled ones are counted
//!   separately and never treated as failures

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::Family;
use crate::error::SsdError;
use crate::fit::averaging::ModelAverage;
use crate::fit::fitter::fit_families;
use crate::math::{is_degenerate, percentile_sorted};

/// Golden-ratio increment used to spread per-iteration seeds.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Progress reporting, cancellation and timestamp hooks for a run.
#[derive(Clone, Copy, Default)]
pub struct RunControl<'a> {
    /// Called with `(completed, total)` after every finished iteration.
    pub progress: Option<&'a (dyn Fn(usize, usize) + Sync)>,
    /// Checked before each iteration; once set, remaining iterations are skipped.
    pub cancel: Option<&'a AtomicBool>,
    /// Stamped on the result instead of the wall clock when set.
    pub generated_at: Option<DateTime<Utc>>,
}

impl<'a> RunControl<'a> {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    fn report(&self, completed: usize, total: usize) {
        if let Some(progress) = self.progress {
            progress(completed, total);
        }
    }
}

impl std::fmt::Debug for RunControl<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunControl")
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel.is_some())
            .field("generated_at", &self.generated_at)
            .finish()
    }
}

/// What each iteration fits and evaluates.
#[derive(Debug, Clone, Copy)]
pub struct TrialPlan<'a> {
    pub families: &'a [Family],
    /// `Some` in single-distribution mode.
    pub selected: Option<Family>,
    /// HCp fraction in `(0, 1)`.
    pub p: f64,
    /// Concentrations at which the weighted CDF is recorded.
    pub grid: &'a [f64],
}

#[derive(Debug, Clone, Copy)]
pub struct BootstrapSettings {
    pub iterations: usize,
    pub confidence_level: f64,
    pub max_failure_rate: f64,
    pub seed: u64,
    pub parallel: bool,
}

/// Result of one successful iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub hcp: f64,
    pub curve: Vec<f64>,
}

/// Percentile interval of the bootstrapped HCp and its bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
    pub requested: usize,
    pub successful: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// `failed / (successful + failed)`.
    pub failure_rate: f64,
    /// Failure rate exceeded the configured maximum.
    pub low_confidence: bool,
}

/// Pointwise percentile band around the weighted CDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveBand {
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct BootstrapOutcome {
    pub interval: Option<ConfidenceInterval>,
    pub band: Option<CurveBand>,
    /// Successful HCp replicates in iteration order.
    pub replicates: Vec<f64>,
    pub warnings: Vec<String>,
}

enum Iteration {
    Done(Trial),
    Failed(SsdError),
    Skipped,
}

/// Seed for iteration `i`; stable across sequential and parallel runs.
pub fn iteration_seed(seed: u64, i: usize) -> u64 {
    seed.wrapping_add((i as u64).wrapping_mul(SEED_STRIDE))
}

/// Draw `values.len()` values with replacement.
pub fn resample<R: Rng>(values: &[f64], rng: &mut R) -> Vec<f64> {
    let n = values.len();
    (0..n).map(|_| values[rng.gen_range(0..n)]).collect()
}

/// Fit, weight and evaluate one resample. Pure: same input, same output.
pub fn run_one_trial(resample: &[f64], plan: &TrialPlan<'_>) -> Result<Trial, SsdError> {
    if is_degenerate(resample) {
        return Err(SsdError::DegenerateResample("resample has zero variance".to_string()));
    }

    let fits = fit_families(resample, plan.families, plan.p, false);
    if fits.fitted.is_empty() {
        let reasons: Vec<String> = fits
            .failed
            .iter()
            .map(|f| format!("{}: {}", f.family.display_name(), f.reason))
            .collect();
        return Err(SsdError::AllModelsFailed {
            reason: reasons.join("; "),
        });
    }

    let average = match plan.selected {
        Some(family) => ModelAverage::single(fits.fitted, family)?,
        None => ModelAverage::akaike(fits.fitted)?,
    };
    let hcp = average.hcp(plan.p).ok_or_else(|| SsdError::AllModelsFailed {
        reason: "weighted HCp could not be inverted".to_string(),
    })?;
    let curve = plan.grid.iter().map(|&x| average.cdf(x)).collect();

    Ok(Trial { hcp, curve })
}

/// Run the full bootstrap over `values`.
pub fn run_bootstrap(
    values: &[f64],
    plan: &TrialPlan<'_>,
    settings: &BootstrapSettings,
    control: &RunControl<'_>,
) -> BootstrapOutcome {
    let total = settings.iterations;
    let mut outcome = BootstrapOutcome::default();

    if total == 0 {
        push_warning(
            &mut outcome.warnings,
            "Bootstrap disabled (0 iterations); no confidence interval reported.".to_string(),
        );
        return outcome;
    }

    let completed = AtomicUsize::new(0);
    let iterate = |i: usize| -> Iteration {
        if control.is_cancelled() {
            return Iteration::Skipped;
        }
        let mut rng = StdRng::seed_from_u64(iteration_seed(settings.seed, i));
        let sample = resample(values, &mut rng);
        let result = match run_one_trial(&sample, plan) {
            Ok(trial) => Iteration::Done(trial),
            Err(err) => Iteration::Failed(err),
        };
        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
        control.report(done, total);
        result
    };

    let iterations: Vec<Iteration> = if settings.parallel {
        (0..total).into_par_iter().map(&iterate).collect()
    } else {
        (0..total).map(&iterate).collect()
    };

    let mut trials = Vec::with_capacity(total);
    let mut failed = 0;
    let mut cancelled = 0;
    for (i, it) in iterations.into_iter().enumerate() {
        match it {
            Iteration::Done(trial) => trials.push(trial),
            Iteration::Failed(err) => {
                debug!(iteration = i, kind = err.kind(), error = %err, "bootstrap iteration failed");
                failed += 1;
            }
            Iteration::Skipped => cancelled += 1,
        }
    }

    let successful = trials.len();
    let attempted = successful + failed;
    let failure_rate = if attempted > 0 {
        failed as f64 / attempted as f64
    } else {
        0.0
    };
    let low_confidence = failure_rate > settings.max_failure_rate;

    info!(requested = total, successful, failed, cancelled, "bootstrap finished");

    if cancelled > 0 {
        push_warning(
            &mut outcome.warnings,
            format!(
                "Bootstrap cancelled after {attempted} of {total} iterations; interval computed from a reduced sample count."
            ),
        );
    }
    if low_confidence {
        push_warning(
            &mut outcome.warnings,
            format!(
                "Bootstrap: {failed} of {attempted} iterations failed ({:.1}%), above the {:.1}% limit; the confidence interval may be unreliable.",
                failure_rate * 100.0,
                settings.max_failure_rate * 100.0
            ),
        );
    }
    if successful < 2 {
        push_warning(
            &mut outcome.warnings,
            format!("Bootstrap produced {successful} successful iteration(s); no confidence interval reported."),
        );
        outcome.replicates = trials.into_iter().map(|t| t.hcp).collect();
        return outcome;
    }

    let alpha = 1.0 - settings.confidence_level;
    let (q_lo, q_hi) = (100.0 * alpha / 2.0, 100.0 * (1.0 - alpha / 2.0));

    let replicates: Vec<f64> = trials.iter().map(|t| t.hcp).collect();
    let mut sorted = replicates.clone();
    sorted.sort_by(f64::total_cmp);
    let (Some(lower), Some(upper)) = (percentile_sorted(&sorted, q_lo), percentile_sorted(&sorted, q_hi)) else {
        return outcome;
    };

    outcome.band = curve_band(&trials, plan.grid.len(), q_lo, q_hi);
    outcome.interval = Some(ConfidenceInterval {
        lower,
        upper,
        level: settings.confidence_level,
        requested: total,
        successful,
        failed,
        cancelled,
        failure_rate,
        low_confidence,
    });
    outcome.replicates = replicates;
    outcome
}

fn curve_band(trials: &[Trial], points: usize, q_lo: f64, q_hi: f64) -> Option<CurveBand> {
    if points == 0 {
        return None;
    }
    let mut lower = Vec::with_capacity(points);
    let mut upper = Vec::with_capacity(points);
    let mut column = Vec::with_capacity(trials.len());

    for j in 0..points {
        column.clear();
        column.extend(trials.iter().map(|t| t.curve[j]));
        column.sort_by(f64::total_cmp);
        lower.push(percentile_sorted(&column, q_lo)?);
        upper.push(percentile_sorted(&column, q_hi)?);
    }

    Some(CurveBand { lower, upper })
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

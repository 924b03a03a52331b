use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use ssd_engine::data::{SampleConfig, generate_endpoints, quantile_values};
use ssd_engine::domain::{AggregationMode, AnalysisConfig, Family, Params, RawEndpoint};
use ssd_engine::fit::{ModelAverage, aicc, akaike_weights, fit_families};
use ssd_engine::report::{FitOutcome, diagnostics_csv, format_summary, species_csv};
use ssd_engine::{AnalysisResult, RunControl, SsdError, run_analysis, run_analysis_with};

const GROUPS: [&str; 4] = ["Fish", "Crustaceans", "Algae", "Insects"];

fn rows_from_values(values: &[f64]) -> Vec<RawEndpoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| RawEndpoint::new(format!("Species {:02}", i + 1), GROUPS[i % GROUPS.len()], v))
        .collect()
}

fn quick(config: AnalysisConfig, iterations: usize) -> AnalysisConfig {
    AnalysisConfig {
        bootstrap_iterations: iterations,
        ..config
    }
}

#[test]
fn log_normal_hc5_matches_closed_form() {
    let values = quantile_values(Family::LogNormal, &Params::new(1.0, 0.0, 10.0), 8).unwrap();
    let config = quick(AnalysisConfig::single(Family::LogNormal), 100);
    let result = run_analysis(&rows_from_values(&values), &config).unwrap();

    let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
    let mu = logs.iter().sum::<f64>() / 8.0;
    let sd = (logs.iter().map(|l| (l - mu).powi(2)).sum::<f64>() / 8.0).sqrt();
    let expected = (mu - 1.644_853_626_951_472_2 * sd).exp();

    assert_relative_eq!(result.hcp, expected, max_relative = 1e-6);
    assert!(result.hcp > 2.5 && result.hcp < 3.3, "hcp={}", result.hcp);

    let weights = result.weights();
    assert_eq!(weights.len(), 4);
    for (family, w) in weights {
        let expected = if family == Family::LogNormal { 1.0 } else { 0.0 };
        assert_eq!(w, expected, "{family:?}");
    }
}

#[test]
fn averaged_run_produces_full_diagnostics() {
    let mut sample = SampleConfig::new(Family::Weibull, Params::new(1.4, 0.0, 25.0), 15);
    sample.endpoints_per_species = 2;
    sample.within_species_sd = 0.3;
    let rows = generate_endpoints(&sample).unwrap();

    let result = run_analysis(&rows, &quick(AnalysisConfig::default(), 200)).unwrap();

    assert_eq!(result.diagnostics.len(), 4);
    let total: f64 = result.weights().iter().map(|(_, w)| w).sum();
    assert_relative_eq!(total, 1.0, epsilon = 1e-12);

    let family_hcps: Vec<f64> = result
        .diagnostics
        .iter()
        .filter_map(|d| match &d.outcome {
            FitOutcome::Fitted { hcp, weight, .. } if *weight > 0.0 => Some(*hcp),
            _ => None,
        })
        .collect();
    let lo = family_hcps.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = family_hcps.iter().copied().fold(0.0, f64::max);
    assert!(result.hcp >= lo * (1.0 - 1e-9) && result.hcp <= hi * (1.0 + 1e-9));

    let ci = result.interval.as_ref().unwrap();
    assert!(ci.lower <= ci.upper);
    assert_eq!(ci.requested, 200);
    let guideline = result.guideline.as_ref().unwrap();
    assert!(guideline.value <= ci.lower.max(0.0));

    assert_eq!(result.species.len(), 15);
    assert_eq!(result.curve.concentrations.len(), 200);
    let band = result.curve.band.as_ref().unwrap();
    assert_eq!(band.lower.len(), 200);

    let summary = format_summary(&result);
    assert!(summary.contains("HC5"));
    assert!(summary.contains("Log-Logistic"));
    assert_eq!(diagnostics_csv(&result).lines().count(), 5);
    assert_eq!(species_csv(&result).lines().count(), 16);
}

#[test]
fn interval_narrows_with_more_species() {
    let params = Params::new(1.0, 0.0, 10.0);
    let config = quick(AnalysisConfig::single(Family::LogNormal), 300);

    let width = |n: usize| {
        let values = quantile_values(Family::LogNormal, &params, n).unwrap();
        let ci = run_analysis(&rows_from_values(&values), &config).unwrap().interval.unwrap();
        ci.upper - ci.lower
    };

    let small = width(8);
    let large = width(64);
    assert!(large < small, "n=64 width {large} not below n=8 width {small}");
}

#[test]
fn result_round_trips_through_json() {
    let values = quantile_values(Family::Gamma, &Params::new(2.0, 0.0, 6.0), 12).unwrap();
    let result = run_analysis(&rows_from_values(&values), &quick(AnalysisConfig::default(), 50)).unwrap();

    let json = result.to_json().unwrap();
    let back = AnalysisResult::from_json(&json).unwrap();
    assert_eq!(back, result);
}

#[test]
fn same_seed_same_interval() {
    let values = quantile_values(Family::LogLogistic, &Params::new(2.5, 0.0, 4.0), 10).unwrap();
    let rows = rows_from_values(&values);
    let parallel = quick(AnalysisConfig::default(), 80);
    let sequential = AnalysisConfig {
        parallel: false,
        ..parallel.clone()
    };

    let a = run_analysis(&rows, &parallel).unwrap();
    let b = run_analysis(&rows, &sequential).unwrap();
    assert_eq!(a.hcp, b.hcp);
    assert_eq!(a.interval, b.interval);
    assert_eq!(a.curve, b.curve);
}

#[test]
fn fixed_timestamp_makes_runs_identical() {
    let values = quantile_values(Family::Weibull, &Params::new(1.6, 0.0, 9.0), 10).unwrap();
    let rows = rows_from_values(&values);
    let config = quick(AnalysisConfig::default(), 40);
    let stamp = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let control = RunControl {
        generated_at: Some(stamp),
        ..RunControl::default()
    };

    let a = run_analysis_with(&rows, &config, &control).unwrap();
    let b = run_analysis_with(&rows, &config, &control).unwrap();
    assert_eq!(a.parameters.generated_at, stamp);
    assert_eq!(a, b);
}

#[test]
fn zero_variance_fails_all_models() {
    let rows = rows_from_values(&[5.0; 8]);
    let err = run_analysis(&rows, &quick(AnalysisConfig::default(), 10)).unwrap_err();
    assert!(matches!(err, SsdError::AllModelsFailed { .. }), "{err:?}");
}

#[test]
fn aggregation_modes() {
    let mut rows = rows_from_values(&[3.0, 5.0, 9.0, 14.0, 20.0, 33.0, 50.0]);
    rows.push(RawEndpoint::new("Twice tested", "Fish", 2.0));
    rows.push(RawEndpoint::new("Twice tested", "Fish", 8.0));

    let gm = run_analysis(&rows, &quick(AnalysisConfig::default(), 10)).unwrap();
    let row = gm.species.iter().find(|s| s.species == "Twice tested").unwrap();
    assert_relative_eq!(row.value, 4.0, epsilon = 1e-12);
    assert_eq!(row.endpoint_count, 2);

    let config = AnalysisConfig {
        aggregation: AggregationMode::MostSensitive,
        ..quick(AnalysisConfig::default(), 10)
    };
    let min = run_analysis(&rows, &config).unwrap();
    assert_eq!(min.species[0].species, "Twice tested");
    assert_eq!(min.species[0].value, 2.0);
    assert_relative_eq!(min.species[0].plotting_position, 100.0 / 9.0, epsilon = 1e-12);
}

#[test]
fn insufficient_and_missing_groups() {
    let rows = rows_from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    let err = run_analysis(&rows, &AnalysisConfig::default()).unwrap_err();
    assert_eq!(err, SsdError::InsufficientData { found: 5, required: 8 });

    let rows = rows_from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    let config = AnalysisConfig {
        required_groups: vec!["Fish".to_string(), "Amphibian".to_string()],
        ..AnalysisConfig::default()
    };
    let err = run_analysis(&rows, &config).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Missing required taxonomic group(s): Amphibian."
    );
}

#[test]
fn tiny_samples_fall_back_to_aic() {
    let rows = rows_from_values(&[1.5, 4.0, 9.0, 30.0]);
    let config = AnalysisConfig {
        min_species_count: 3,
        ..quick(AnalysisConfig::default(), 20)
    };
    let result = run_analysis(&rows, &config).unwrap();
    assert!(result.warnings.iter().any(|w| w.contains("uncorrected AIC")));
}

#[test]
fn progress_and_cancellation() {
    let values = quantile_values(Family::LogNormal, &Params::new(0.8, 0.0, 3.0), 10).unwrap();
    let rows = rows_from_values(&values);
    let config = quick(AnalysisConfig::default(), 40);

    let calls = AtomicUsize::new(0);
    let progress = |_done: usize, total: usize| {
        assert_eq!(total, 40);
        calls.fetch_add(1, Ordering::Relaxed);
    };
    let control = RunControl {
        progress: Some(&progress),
        cancel: None,
        ..RunControl::default()
    };
    run_analysis_with(&rows, &config, &control).unwrap();
    assert_eq!(calls.load(Ordering::Relaxed), 40);

    let cancel = AtomicBool::new(true);
    let control = RunControl {
        progress: None,
        cancel: Some(&cancel),
        ..RunControl::default()
    };
    let result = run_analysis_with(&rows, &config, &control).unwrap();
    assert!(result.interval.is_none());
    assert!(result.guideline.is_none());
    assert!(result.hcp > 0.0);
    assert!(result.warnings.iter().any(|w| w.contains("cancelled")));
}

#[test]
fn invalid_config_is_rejected() {
    let rows = rows_from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    let config = AnalysisConfig {
        confidence_level: 1.5,
        ..AnalysisConfig::default()
    };
    let err = run_analysis(&rows, &config).unwrap_err();
    assert_eq!(err.kind(), "invalid_config");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn akaike_weights_are_a_distribution(criteria in prop::collection::vec(-500.0f64..500.0, 1..6)) {
        let w = akaike_weights(&criteria);
        prop_assert_eq!(w.len(), criteria.len());
        prop_assert!(w.iter().all(|&x| x >= 0.0));
        prop_assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn aicc_never_rewards_extra_parameters(
        ll in -1e3f64..1e3,
        k1 in 1usize..6,
        extra in 1usize..4,
        pad in 2usize..50,
    ) {
        let k2 = k1 + extra;
        let n = k2 + pad;
        let smaller = aicc(ll, k1, n);
        let larger = aicc(ll, k2, n);
        prop_assert!(smaller.small_sample_corrected && larger.small_sample_corrected);
        prop_assert!(smaller.value <= larger.value, "k={k1}: {} vs k={k2}: {}", smaller.value, larger.value);
    }

    #[test]
    fn fitted_weights_sum_to_one(logs in prop::collection::vec(-3.0f64..6.0, 8..20)) {
        let values: Vec<f64> = logs.iter().map(|l| l.exp()).collect();
        let fits = fit_families(&values, &Family::ALL, 0.05, false);
        prop_assume!(!fits.fitted.is_empty());

        let average = ModelAverage::akaike(fits.fitted).unwrap();
        let total: f64 = average.components.iter().map(|c| c.weight).sum();
        prop_assert!((total - 1.0).abs() < 1e-12);
        prop_assert!(average.components.iter().all(|c| c.weight >= 0.0));

        let hcp = average.hcp(0.05);
        prop_assert!(hcp.is_some_and(|h| h > 0.0));
    }
}

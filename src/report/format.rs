//! Plain-text run summary.
//!
//! Formatting lives here so the fitting code stays free of presentation
//! concerns and output changes stay local.

use crate::domain::AnalysisMode;
use crate::report::result::{AnalysisResult, FitOutcome};

/// Format the full run summary (dataset, per-family diagnostics, HCp, guideline).
pub fn format_summary(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let params = &result.parameters;
    let p = result.hcp_percentile;

    out.push_str("=== Species Sensitivity Distribution ===\n");
    out.push_str(&format!(
        "Species: n={} | endpoints used={} of {}\n",
        params.species_count, params.rows_used, params.rows_read
    ));
    out.push_str(&format!("Aggregation: {:?}\n", params.aggregation));
    match (params.analysis_mode, params.selected_family) {
        (AnalysisMode::Single, Some(family)) => {
            out.push_str(&format!("Mode: single distribution ({})\n", family.display_name()));
        }
        _ => out.push_str("Mode: model averaged (AICc weights)\n"),
    }

    out.push_str("\nModel diagnostics:\n");
    for d in &result.diagnostics {
        match &d.outcome {
            FitOutcome::Fitted {
                aicc,
                gof,
                weight,
                hcp,
                ..
            } => {
                let ic = if aicc.small_sample_corrected { "AICc" } else { "AIC " };
                out.push_str(&format!(
                    "  {:<13} {ic}={:>9.3} w={:.3} HC{}={} AD p={:.3} KS p={:.3}\n",
                    d.family.display_name(),
                    aicc.value,
                    weight,
                    fmt_pct(p),
                    fmt_conc(*hcp),
                    gof.ad_p_value,
                    gof.ks_p_value,
                ));
            }
            FitOutcome::Failed { reason } => {
                out.push_str(&format!("  {:<13} (failed) {reason}\n", d.family.display_name()));
            }
        }
    }

    out.push_str("\nResult:\n");
    out.push_str(&format!("- HC{}: {}\n", fmt_pct(p), fmt_conc(result.hcp)));
    match &result.interval {
        Some(ci) => {
            out.push_str(&format!(
                "- {:.0}% CI: [{}, {}] ({} of {} bootstrap iterations succeeded)\n",
                ci.level * 100.0,
                fmt_conc(ci.lower),
                fmt_conc(ci.upper),
                ci.successful,
                ci.requested,
            ));
        }
        None => out.push_str("- CI: not available\n"),
    }
    match &result.guideline {
        Some(g) => {
            let note = if g.clamped { " (protection clause applied)" } else { "" };
            out.push_str(&format!("- Guideline: {}{note}\n", fmt_conc(g.value)));
        }
        None => out.push_str("- Guideline: not available\n"),
    }

    if !result.warnings.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in &result.warnings {
            out.push_str(&format!("- {w}\n"));
        }
    }

    out
}

/// `5.0` -> `5`, `2.5` -> `2.5`.
fn fmt_pct(p: f64) -> String {
    if p.fract() == 0.0 {
        format!("{p:.0}")
    } else {
        format!("{p}")
    }
}

/// Four significant digits, switching to scientific notation for extremes.
pub(crate) fn fmt_conc(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-3..1e5).contains(&a) {
        format!("{v:.3e}")
    } else {
        let decimals = if a == 0.0 { 3 } else { (3 - a.log10().floor() as i32).clamp(0, 6) as usize };
        format!("{v:.decimals$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_concentrations() {
        assert_eq!(fmt_conc(2.84321), "2.843");
        assert_eq!(fmt_conc(123.456), "123.5");
        assert_eq!(fmt_conc(0.0123456), "0.01235");
        assert_eq!(fmt_conc(0.0), "0.000");
        assert_eq!(fmt_conc(2.5e-6), "2.500e-6");
    }

    #[test]
    fn formats_percentiles() {
        assert_eq!(fmt_pct(5.0), "5");
        assert_eq!(fmt_pct(2.5), "2.5");
    }
}

//! CSV renderings of the result tables.
//!
//! Meant to be easy to consume in spreadsheets or downstream scripts. Fields
//! containing commas or quotes are quoted.

use std::fmt::Write;

use crate::report::result::{AnalysisResult, FitOutcome};

/// One row per family: parameters, information criterion, GOF and weight.
pub fn diagnostics_csv(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "family,status,shape,location,scale,log_likelihood,aicc,aicc_corrected,ad_statistic,ad_p_value,ks_statistic,ks_p_value,weight,hcp,reason"
    );

    for d in &result.diagnostics {
        let name = d.family.display_name();
        let _ = match &d.outcome {
            FitOutcome::Fitted {
                params,
                log_likelihood,
                aicc,
                gof,
                weight,
                hcp,
            } => writeln!(
                out,
                "{name},fitted,{},{},{},{},{},{},{},{},{},{},{},{},",
                params.shape,
                params.location,
                params.scale,
                log_likelihood,
                aicc.value,
                aicc.small_sample_corrected,
                gof.ad_statistic,
                gof.ad_p_value,
                gof.ks_statistic,
                gof.ks_p_value,
                weight,
                hcp,
            ),
            FitOutcome::Failed { reason } => {
                writeln!(out, "{name},failed,,,,,,,,,,,0,,{}", escape(reason))
            }
        };
    }

    out
}

/// Aggregated species table with plotting positions.
pub fn species_csv(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "species,taxonomic_group,broad_group,value,endpoint_count,plotting_position"
    );

    for row in &result.species {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{:.4}",
            escape(&row.species),
            escape(&row.taxonomic_group),
            row.broad_group.display_name(),
            row.value,
            row.endpoint_count,
            row.plotting_position,
        );
    }

    out
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_awkward_fields() {
        assert_eq!(escape("Daphnia magna"), "Daphnia magna");
        assert_eq!(escape("Algae/Plants, mixed"), "\"Algae/Plants, mixed\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}

//! Protection clause for the final guideline value.
//!
//! The guideline is the lower bootstrap bound of the HCp, unless the most
//! sensitive species sits below it; then the guideline drops to that species'
//! value so no tested species is left unprotected.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guideline {
    pub value: f64,
    /// `true` when the protection clause replaced the bootstrap bound.
    pub clamped: bool,
    pub bootstrap_lower: f64,
    pub min_species_value: f64,
}

impl Guideline {
    /// Warning text for a clamped guideline.
    pub fn clamp_warning(&self) -> Option<String> {
        self.clamped.then(|| {
            format!(
                "Protection clause applied: most sensitive species value {} is below the HCp lower bound {}; guideline set to {}.",
                self.min_species_value, self.bootstrap_lower, self.value
            )
        })
    }
}

/// Apply the protection clause to the lower confidence bound.
pub fn finalize(bootstrap_lower: f64, min_species_value: f64) -> Guideline {
    if min_species_value < bootstrap_lower {
        Guideline {
            value: min_species_value,
            clamped: true,
            bootstrap_lower,
            min_species_value,
        }
    } else {
        Guideline {
            value: bootstrap_lower.max(0.0),
            clamped: false,
            bootstrap_lower,
            min_species_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_most_sensitive_species() {
        let g = finalize(7.0, 5.0);
        assert_eq!(g.value, 5.0);
        assert!(g.clamped);
        assert!(g.clamp_warning().unwrap().contains("Protection clause"));
    }

    #[test]
    fn keeps_lower_bound_when_species_are_covered() {
        let g = finalize(3.0, 5.0);
        assert_eq!(g.value, 3.0);
        assert!(!g.clamped);
        assert!(g.clamp_warning().is_none());
    }

    #[test]
    fn never_negative() {
        assert_eq!(finalize(-0.5, 2.0).value, 0.0);
    }
}

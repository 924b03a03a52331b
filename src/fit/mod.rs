//! Fitting, scoring and uncertainty.
//!
//! Responsibilities:
//!
//! - fit each distribution family by maximum likelihood
//! - score fits (AICc, Anderson–Darling, Kolmogorov–Smirnov)
//! - average families by Akaike weight and invert the mixture for the HCp
//! - bootstrap the HCp and apply the protection clause

pub mod averaging;
pub mod bootstrap;
pub mod fitter;
pub mod gof;
pub mod guideline;

pub use averaging::*;
pub use bootstrap::*;
pub use fitter::*;
pub use gof::*;
pub use guideline::*;

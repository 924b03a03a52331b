//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input records and enums (`RawEndpoint`, `MediaType`, `ExposureTerm`)
//! - aggregated species values (`SpeciesValue`)
//! - distribution families and their parameters (`Family`, `Params`)
//! - the run configuration (`AnalysisConfig`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;

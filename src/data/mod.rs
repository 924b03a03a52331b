//! Data preparation.
//!
//! - `aggregate`: clean raw endpoints and collapse them to one value per species
//! - `taxonomy`: database labels to broad taxonomic groups
//! - `sample`: synthetic datasets from a known SSD

pub mod aggregate;
pub mod sample;
pub mod taxonomy;

pub use aggregate::*;
pub use sample::*;
pub use taxonomy::*;

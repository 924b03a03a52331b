//! Numerical utilities: simplex minimization, log-space root finding and
//! descriptive statistics.

pub mod root;
pub mod simplex;
pub mod stats;

pub use root::*;
pub use simplex::*;
pub use stats::*;

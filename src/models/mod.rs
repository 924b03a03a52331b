//! SSD distribution family implementations.
//!
//! Each family is a variant of the closed [`crate::domain::Family`] enum; the
//! math lives here as small, pure functions so fitting and averaging code can
//! stay generic.

pub mod family;

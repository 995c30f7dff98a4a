//! Test helpers shared across crates.
//!
//! Provides UTF-8 temporary project trees and a `figment::Jail` wrapper that
//! speaks `anyhow`.

pub mod figment;
pub mod fs;

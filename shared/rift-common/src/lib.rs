//! Rift Analytics Common Library
//!
//! Shared domain types used by the analytics backend: match and participant
//! records, role normalization, queue identifiers, and client tiers.

pub mod types;

pub use types::*;

//! Shared domain models for the SubGate crates.

pub mod billing;

pub use billing::*;

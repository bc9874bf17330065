//! SubGate Observability Library
//!
//! Provides unified logging and tracing infrastructure for the SubGate crates.
//!
//! # Features
//! - Structured JSON logging with consistent schema
//! - Correlation ids tying audit entries to access attempts
//! - Domain event logging for security and billing operations

pub mod correlation;
pub mod domain_events;
pub mod init;

pub use correlation::*;
pub use domain_events::*;
pub use init::*;

// Re-export tracing for convenience
pub use tracing::{debug, error, info, span, trace, warn, Instrument, Level};
pub use tracing::instrument;

//! Error types for the access-mediation pipeline.
//!
//! Every failure is a value. Gate-local errors are typed enums; the pipeline
//! folds them into a single [`SecurityError`] whose `kind` carries the
//! classification, so no caller ever inspects message text to find out what
//! went wrong.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::authentication::AuthenticationError;
use crate::services::authorization::AuthorizationError;
use crate::services::risk::RiskAssessmentError;

/// Classification of a mediation failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityErrorKind {
    AuthenticationFailed,
    AuthorizationDenied,
    RiskAssessmentFailed,
    RateLimitExceeded,
    General,
}

impl std::fmt::Display for SecurityErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed => write!(f, "AUTHENTICATION_FAILED"),
            Self::AuthorizationDenied => write!(f, "AUTHORIZATION_DENIED"),
            Self::RiskAssessmentFailed => write!(f, "RISK_ASSESSMENT_FAILED"),
            Self::RateLimitExceeded => write!(f, "RATE_LIMIT_EXCEEDED"),
            Self::General => write!(f, "GENERAL"),
        }
    }
}

/// The one failure shape callers of the pipeline ever see.
///
/// A denial and a downstream business failure look identical except for
/// `kind`; "never tried" versus "tried and failed" is not distinguishable
/// from the message alone, by contract.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[error("{message}")]
pub struct SecurityError {
    pub message: String,
    pub kind: SecurityErrorKind,
    pub timestamp: DateTime<Utc>,
}

impl SecurityError {
    pub fn new(message: impl Into<String>, kind: SecurityErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
            timestamp: Utc::now(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(message, SecurityErrorKind::AuthenticationFailed)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(message, SecurityErrorKind::AuthorizationDenied)
    }

    pub fn risk(message: impl Into<String>) -> Self {
        Self::new(message, SecurityErrorKind::RiskAssessmentFailed)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(message, SecurityErrorKind::RateLimitExceeded)
    }

    /// Downstream business failure; only the message text survives.
    pub fn general(message: impl Into<String>) -> Self {
        Self::new(message, SecurityErrorKind::General)
    }
}

impl From<AuthenticationError> for SecurityError {
    fn from(err: AuthenticationError) -> Self {
        Self::authentication(err.to_string())
    }
}

impl From<AuthorizationError> for SecurityError {
    fn from(err: AuthorizationError) -> Self {
        Self::authorization(err.to_string())
    }
}

impl From<RiskAssessmentError> for SecurityError {
    fn from(err: RiskAssessmentError) -> Self {
        Self::risk(err.to_string())
    }
}

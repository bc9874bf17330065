//! Risk assessment gate: scores a request the caller has already proven
//! entitled to make, escalating with everything it cannot corroborate.
//!
//! The weights and thresholds below are the product contract for risk
//! scoring; tests pin every cell of the table.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::SecurityContext;
use crate::services::authorization::AuthzResult;

/// Timestamps older (or newer) than this are treated as replayed or skewed.
const STALE_WINDOW_MS: i64 = 300_000;

/// Score boundaries: below each bound maps to the level, top bucket is
/// critical.
const LOW_BELOW: u8 = 30;
const MEDIUM_BELOW: u8 = 60;
const HIGH_BELOW: u8 = 85;

const MAX_SCORE: u16 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Outcome of scoring one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskResult {
    pub level: RiskLevel,
    pub score: u8,
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RiskAssessmentError {
    /// Reserved for assessors backed by external signals (geo, reputation).
    #[error("Risk assessment failed: {0}")]
    SignalUnavailable(String),
}

#[async_trait]
pub trait RiskAssessmentService: Send + Sync {
    async fn assess_risk(
        &self,
        authz: &AuthzResult,
        context: &SecurityContext,
    ) -> Result<RiskResult, RiskAssessmentError>;
}

/// Default assessor: four additive heuristics over the request context.
pub struct HeuristicRiskAssessor;

impl HeuristicRiskAssessor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for HeuristicRiskAssessor {
    fn default() -> Self {
        Self::new()
    }
}

fn ip_risk(ip_address: Option<&str>) -> u8 {
    match ip_address {
        Some(ip) if ip.starts_with("10.") => 5,
        Some(ip) if ip.starts_with("192.168.") => 5,
        Some(ip) if ip.starts_with("127.") => 0,
        _ => 15,
    }
}

fn user_agent_risk(user_agent: Option<&str>) -> u8 {
    let agent = match user_agent {
        Some(agent) if !agent.is_empty() => agent.to_lowercase(),
        _ => return 30,
    };

    // Known browsers win before the automation substrings are consulted.
    if agent.contains("chrome") || agent.contains("firefox") || agent.contains("safari") {
        5
    } else if agent.contains("bot") {
        25
    } else if agent.contains("curl") {
        20
    } else {
        10
    }
}

fn time_risk(context: &SecurityContext) -> u8 {
    let skew_ms = (Utc::now() - context.timestamp).num_milliseconds().abs();
    if skew_ms > STALE_WINDOW_MS {
        15
    } else {
        0
    }
}

fn path_risk(path: &str) -> u8 {
    if path.contains("/admin") {
        25
    } else if path.contains("/delete") {
        20
    } else if path.contains("/cancel") {
        15
    } else {
        5
    }
}

fn level_for(score: u8) -> RiskLevel {
    if score < LOW_BELOW {
        RiskLevel::Low
    } else if score < MEDIUM_BELOW {
        RiskLevel::Medium
    } else if score < HIGH_BELOW {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

fn reason_for(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Request within normal parameters",
        RiskLevel::Medium => "Elevated risk indicators detected",
        RiskLevel::High => "Multiple high risk indicators detected",
        RiskLevel::Critical => "Critical risk threshold exceeded",
    }
}

#[async_trait]
impl RiskAssessmentService for HeuristicRiskAssessor {
    async fn assess_risk(
        &self,
        _authz: &AuthzResult,
        context: &SecurityContext,
    ) -> Result<RiskResult, RiskAssessmentError> {
        let total = u16::from(ip_risk(context.ip_address.as_deref()))
            + u16::from(user_agent_risk(context.user_agent.as_deref()))
            + u16::from(time_risk(context))
            + u16::from(path_risk(&context.request_path));

        let score = total.min(MAX_SCORE) as u8;
        let level = level_for(score);

        Ok(RiskResult {
            level,
            score,
            reason: reason_for(level).to_string(),
        })
    }
}

//! The mediation pipeline: every gate in order, one audit entry per outcome.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use subgate_config::SecurityConfig;
use subgate_observability::CorrelationId;

use crate::context::SecurityContext;
use crate::errors::SecurityError;
use crate::services::audit::{AuditService, TracingAuditService};
use crate::services::authentication::{AuthenticationService, SessionAuthenticator};
use crate::services::authorization::{AuthorizationService, PathPolicyAuthorizer};
use crate::services::rate_limit::RateLimitService;
use crate::services::risk::{HeuristicRiskAssessor, RiskAssessmentService, RiskLevel, RiskResult};

/// Proof that a request cleared the whole pipeline.
///
/// Fields are private and the only constructor lives in this module, so
/// holding a `SecureContext` *is* the proof: no other code can mint one, and
/// it deliberately does not implement `Deserialize`, so one cannot arrive
/// over a wire either. Scoped to a single request; never cache it.
#[derive(Debug, Clone, Serialize)]
pub struct SecureContext {
    user_id: Uuid,
    session_id: String,
    correlation_id: CorrelationId,
    risk: RiskResult,
    validated_at: DateTime<Utc>,
}

impl SecureContext {
    fn issue(
        user_id: Uuid,
        session_id: String,
        correlation_id: CorrelationId,
        risk: RiskResult,
    ) -> Self {
        Self {
            user_id,
            session_id,
            correlation_id,
            risk,
            validated_at: Utc::now(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn correlation_id(&self) -> CorrelationId {
        self.correlation_id
    }

    pub fn risk(&self) -> &RiskResult {
        &self.risk
    }

    pub fn validated_at(&self) -> DateTime<Utc> {
        self.validated_at
    }
}

/// Runs the gates in a fixed order and owns the grant decision.
pub struct SecurityMediator {
    authentication: Arc<dyn AuthenticationService>,
    authorization: Arc<dyn AuthorizationService>,
    risk_assessment: Arc<dyn RiskAssessmentService>,
    audit: Arc<dyn AuditService>,
    rate_limiter: Option<RateLimitService>,
}

impl SecurityMediator {
    pub fn new(
        authentication: Arc<dyn AuthenticationService>,
        authorization: Arc<dyn AuthorizationService>,
        risk_assessment: Arc<dyn RiskAssessmentService>,
        audit: Arc<dyn AuditService>,
    ) -> Self {
        Self {
            authentication,
            authorization,
            risk_assessment,
            audit,
            rate_limiter: None,
        }
    }

    /// Default gates: session authentication, path policy, heuristic risk,
    /// tracing audit. No rate limiter.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(SessionAuthenticator::new()),
            Arc::new(PathPolicyAuthorizer::new()),
            Arc::new(HeuristicRiskAssessor::new()),
            Arc::new(TracingAuditService::default()),
        )
    }

    /// Install a rate-limit pre-gate; it runs before authentication.
    pub fn with_rate_limiter(mut self, rate_limiter: RateLimitService) -> Self {
        self.rate_limiter = Some(rate_limiter);
        self
    }

    /// Default gates plus whatever the configuration enables.
    pub fn from_config(config: &SecurityConfig) -> Self {
        let mediator = Self::new(
            Arc::new(SessionAuthenticator::new()),
            Arc::new(PathPolicyAuthorizer::new()),
            Arc::new(HeuristicRiskAssessor::new()),
            Arc::new(TracingAuditService::new(config.service_name.clone())),
        );

        if config.rate_limit.enabled {
            mediator.with_rate_limiter(RateLimitService::new(config.rate_limit.requests_per_minute))
        } else {
            mediator
        }
    }

    /// Walk the pipeline for one request and audit the outcome exactly once.
    pub async fn mediate_access(
        &self,
        context: &SecurityContext,
        correlation_id: CorrelationId,
    ) -> Result<SecureContext, SecurityError> {
        let outcome = self.run_gates(context, correlation_id).await;

        match &outcome {
            Ok(_) => self.audit.log_secure_access(context, correlation_id).await,
            Err(error) => {
                self.audit
                    .log_security_failure(context, error, correlation_id)
                    .await
            }
        }

        outcome
    }

    async fn run_gates(
        &self,
        context: &SecurityContext,
        correlation_id: CorrelationId,
    ) -> Result<SecureContext, SecurityError> {
        if let Some(rate_limiter) = &self.rate_limiter {
            rate_limiter.check(context).await?;
        }

        let auth = self.authentication.authenticate(context).await?;
        let authz = self.authorization.authorize(&auth, context).await?;
        let risk = self.risk_assessment.assess_risk(&authz, context).await?;

        match risk.level {
            RiskLevel::Low | RiskLevel::Medium => {
                // Authentication has already rejected absent sessions.
                let session_id = context.session_id.clone().unwrap_or_default();
                Ok(SecureContext::issue(
                    auth.user_id,
                    session_id,
                    correlation_id,
                    risk,
                ))
            }
            RiskLevel::High | RiskLevel::Critical => Err(SecurityError::risk(format!(
                "High risk access denied for user: {}",
                auth.user_id
            ))),
        }
    }
}

//! Audit gate: records every mediation outcome, exactly once per attempt.
//!
//! Auditing is fire-and-forget by contract. The methods return nothing and
//! implementations swallow their own failures; a broken sink must never turn
//! into a denied request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use subgate_observability::{log_access_denied, log_access_granted, CorrelationId};

use crate::context::SecurityContext;
use crate::errors::{SecurityError, SecurityErrorKind};

#[async_trait]
pub trait AuditService: Send + Sync {
    async fn log_secure_access(&self, context: &SecurityContext, correlation_id: CorrelationId);

    async fn log_security_failure(
        &self,
        context: &SecurityContext,
        error: &SecurityError,
        correlation_id: CorrelationId,
    );
}

/// Default sink: emits structured domain events through the tracing pipeline.
pub struct TracingAuditService {
    service_name: String,
}

impl TracingAuditService {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

impl Default for TracingAuditService {
    fn default() -> Self {
        Self::new("security-service")
    }
}

#[async_trait]
impl AuditService for TracingAuditService {
    async fn log_secure_access(&self, context: &SecurityContext, correlation_id: CorrelationId) {
        // Granted implies authenticated, but the sink stays tolerant of
        // custom pipelines that grant without a user id.
        let user_id = context.user_id.unwrap_or_else(Uuid::nil);
        log_access_granted(
            &self.service_name,
            user_id,
            correlation_id,
            &context.request_path,
        );
    }

    async fn log_security_failure(
        &self,
        context: &SecurityContext,
        error: &SecurityError,
        correlation_id: CorrelationId,
    ) {
        log_access_denied(
            &self.service_name,
            context.user_id,
            correlation_id,
            &context.request_path,
            &error.to_string(),
        );
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Granted,
    Denied,
}

/// One recorded mediation outcome.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub correlation_id: CorrelationId,
    pub user_id: Option<Uuid>,
    pub request_path: String,
    pub outcome: AuditOutcome,
    pub error_kind: Option<SecurityErrorKind>,
    pub error_message: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only in-memory sink. Used by tests to assert on the trail and by
/// embedders that scrape audit state out-of-band.
pub struct InMemoryAuditService {
    records: Arc<RwLock<Vec<AuditRecord>>>,
}

impl InMemoryAuditService {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn records(&self) -> Vec<AuditRecord> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for InMemoryAuditService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditService for InMemoryAuditService {
    async fn log_secure_access(&self, context: &SecurityContext, correlation_id: CorrelationId) {
        let mut records = self.records.write().await;
        records.push(AuditRecord {
            correlation_id,
            user_id: context.user_id,
            request_path: context.request_path.clone(),
            outcome: AuditOutcome::Granted,
            error_kind: None,
            error_message: None,
            recorded_at: Utc::now(),
        });
    }

    async fn log_security_failure(
        &self,
        context: &SecurityContext,
        error: &SecurityError,
        correlation_id: CorrelationId,
    ) {
        let mut records = self.records.write().await;
        records.push(AuditRecord {
            correlation_id,
            user_id: context.user_id,
            request_path: context.request_path.clone(),
            outcome: AuditOutcome::Denied,
            error_kind: Some(error.kind),
            error_message: Some(error.to_string()),
            recorded_at: Utc::now(),
        });
    }
}

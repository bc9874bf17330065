//! Domain event logging for SubGate services.
//!
//! Provides structured logging for access-mediation and billing events with
//! a consistent schema.

use crate::correlation::CorrelationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of a domain operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    Success,
    Failure,
    Partial,
    Skipped,
}

impl std::fmt::Display for OperationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
            Self::Partial => write!(f, "partial"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Categories of domain events for filtering and routing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Auth,
    Authorization,
    Risk,
    RateLimit,
    Security,
    Billing,
    System,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "auth"),
            Self::Authorization => write!(f, "authorization"),
            Self::Risk => write!(f, "risk"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Security => write!(f, "security"),
            Self::Billing => write!(f, "billing"),
            Self::System => write!(f, "system"),
        }
    }
}

/// A structured domain event for logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
    /// Category of the event
    pub category: EventCategory,
    /// Specific event type (e.g., "access_granted", "subscription_created")
    pub event_type: String,
    /// Entity type being operated on (e.g., "subscription", "user")
    pub entity_type: Option<String>,
    /// Entity ID
    pub entity_id: Option<String>,
    /// Result of the operation
    pub result: OperationResult,
    /// Duration in milliseconds (if applicable)
    pub duration_ms: Option<u64>,
    /// Error message if failed
    pub error: Option<String>,
    /// Correlation id of the access attempt this event belongs to
    pub correlation_id: Option<CorrelationId>,
    /// User context
    pub user_id: Option<Uuid>,
    /// Service that emitted the event
    pub service: String,
    /// Additional structured metadata
    pub metadata: Option<serde_json::Value>,
}

impl DomainEvent {
    /// Create a new domain event builder
    pub fn new(
        service: impl Into<String>,
        category: EventCategory,
        event_type: impl Into<String>,
    ) -> DomainEventBuilder {
        DomainEventBuilder {
            service: service.into(),
            category,
            event_type: event_type.into(),
            entity_type: None,
            entity_id: None,
            result: OperationResult::Success,
            duration_ms: None,
            error: None,
            correlation_id: None,
            user_id: None,
            metadata: None,
        }
    }
}

/// Builder for constructing domain events
pub struct DomainEventBuilder {
    service: String,
    category: EventCategory,
    event_type: String,
    entity_type: Option<String>,
    entity_id: Option<String>,
    result: OperationResult,
    duration_ms: Option<u64>,
    error: Option<String>,
    correlation_id: Option<CorrelationId>,
    user_id: Option<Uuid>,
    metadata: Option<serde_json::Value>,
}

impl DomainEventBuilder {
    pub fn entity(mut self, entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn result(mut self, result: OperationResult) -> Self {
        self.result = result;
        self
    }

    pub fn success(mut self) -> Self {
        self.result = OperationResult::Success;
        self
    }

    pub fn failure(mut self, error: impl Into<String>) -> Self {
        self.result = OperationResult::Failure;
        self.error = Some(error.into());
        self
    }

    pub fn duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    pub fn correlation(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Build and emit the event as a log
    pub fn emit(self) {
        let event = self.build();
        let json = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());

        match event.result {
            OperationResult::Success => tracing::info!(
                target: "domain_event",
                category = %event.category,
                event_type = %event.event_type,
                result = "success",
                "DomainEvent: {}", json
            ),
            OperationResult::Failure => tracing::error!(
                target: "domain_event",
                category = %event.category,
                event_type = %event.event_type,
                result = "failure",
                error = ?event.error,
                "DomainEvent: {}", json
            ),
            OperationResult::Partial => tracing::warn!(
                target: "domain_event",
                category = %event.category,
                event_type = %event.event_type,
                result = "partial",
                "DomainEvent: {}", json
            ),
            OperationResult::Skipped => tracing::debug!(
                target: "domain_event",
                category = %event.category,
                event_type = %event.event_type,
                result = "skipped",
                "DomainEvent: {}", json
            ),
        }
    }

    /// Build the event without emitting
    pub fn build(self) -> DomainEvent {
        DomainEvent {
            timestamp: Utc::now(),
            category: self.category,
            event_type: self.event_type,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            result: self.result,
            duration_ms: self.duration_ms,
            error: self.error,
            correlation_id: self.correlation_id,
            user_id: self.user_id,
            service: self.service,
            metadata: self.metadata,
        }
    }
}

// ============================================================================
// Convenience functions for common domain events
// ============================================================================

/// Log a granted access decision
pub fn log_access_granted(
    service: &str,
    user_id: Uuid,
    correlation_id: CorrelationId,
    path: &str,
) {
    DomainEvent::new(service, EventCategory::Security, "access_granted")
        .entity("user", user_id.to_string())
        .user(user_id)
        .correlation(correlation_id)
        .metadata(serde_json::json!({ "path": path }))
        .success()
        .emit();
}

/// Log a denied access decision
pub fn log_access_denied(
    service: &str,
    user_id: Option<Uuid>,
    correlation_id: CorrelationId,
    path: &str,
    error: &str,
) {
    let mut builder = DomainEvent::new(service, EventCategory::Security, "access_denied")
        .correlation(correlation_id)
        .metadata(serde_json::json!({ "path": path }))
        .failure(error);

    if let Some(uid) = user_id {
        builder = builder.entity("user", uid.to_string()).user(uid);
    }

    builder.emit();
}

/// Log a subscription lifecycle event
pub fn log_subscription_event(
    service: &str,
    event_type: &str,
    user_id: Uuid,
    subscription_id: Uuid,
    metadata: Option<serde_json::Value>,
) {
    let mut builder = DomainEvent::new(service, EventCategory::Billing, event_type)
        .entity("subscription", subscription_id.to_string())
        .user(user_id)
        .success();

    if let Some(meta) = metadata {
        builder = builder.metadata(meta);
    }

    builder.emit();
}

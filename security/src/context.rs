//! Per-request security context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Everything the mediation pipeline knows about one access attempt.
///
/// Built once at the edge, read by every gate, never mutated. Absent fields
/// are facts in their own right: a missing user id fails authentication and a
/// missing user agent raises risk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SecurityContext {
    pub user_id: Option<Uuid>,
    pub session_id: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_path: String,
    pub timestamp: DateTime<Utc>,
}

impl SecurityContext {
    /// Start building a context; `timestamp` defaults to now.
    pub fn builder() -> SecurityContextBuilder {
        SecurityContextBuilder {
            user_id: None,
            session_id: None,
            ip_address: None,
            user_agent: None,
            request_path: String::new(),
            timestamp: None,
        }
    }
}

/// Builder for [`SecurityContext`].
pub struct SecurityContextBuilder {
    user_id: Option<Uuid>,
    session_id: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    request_path: String,
    timestamp: Option<DateTime<Utc>>,
}

impl SecurityContextBuilder {
    pub fn user_id(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn ip_address(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn request_path(mut self, request_path: impl Into<String>) -> Self {
        self.request_path = request_path.into();
        self
    }

    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn build(self) -> SecurityContext {
        SecurityContext {
            user_id: self.user_id,
            session_id: self.session_id,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            request_path: self.request_path,
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
        }
    }
}

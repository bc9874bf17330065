//! Authorization gate: decides whether an authenticated user may touch a path.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::context::SecurityContext;
use crate::services::authentication::AuthResult;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthzStatus {
    Authorized,
}

impl std::fmt::Display for AuthzStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authorized => write!(f, "AUTHORIZED"),
        }
    }
}

/// Proof that authorization passed, consumed by the risk gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthzResult {
    pub user_id: Uuid,
    pub status: AuthzStatus,
    pub authorized_at: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Authorization denied: insufficient permissions for path {path}")]
    InsufficientPermissions { path: String },
}

#[async_trait]
pub trait AuthorizationService: Send + Sync {
    async fn authorize(
        &self,
        auth: &AuthResult,
        context: &SecurityContext,
    ) -> Result<AuthzResult, AuthorizationError>;
}

/// Default authorizer: substring policy over the request path.
///
/// Rules are ordered and the order is observable: subscription paths are
/// granted before the admin rule is consulted, so a path containing both
/// segments passes this gate and is left for risk scoring to judge. Unmatched
/// paths are granted (allow by default); flipping that fallback to deny is a
/// product decision, not a code cleanup.
pub struct PathPolicyAuthorizer;

impl PathPolicyAuthorizer {
    pub fn new() -> Self {
        Self
    }

    fn permits(&self, path: &str) -> bool {
        if path.contains("/subscriptions") {
            return true;
        }
        if path.contains("/admin") {
            return false;
        }
        true
    }
}

impl Default for PathPolicyAuthorizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorizationService for PathPolicyAuthorizer {
    async fn authorize(
        &self,
        auth: &AuthResult,
        context: &SecurityContext,
    ) -> Result<AuthzResult, AuthorizationError> {
        if self.permits(&context.request_path) {
            Ok(AuthzResult {
                user_id: auth.user_id,
                status: AuthzStatus::Authorized,
                authorized_at: Utc::now(),
            })
        } else {
            Err(AuthorizationError::InsufficientPermissions {
                path: context.request_path.clone(),
            })
        }
    }
}

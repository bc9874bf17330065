//! Authentication gate: establishes who is calling.
//!
//! The default implementation validates identity *presence* only; verifying
//! credentials (passwords, token signatures) belongs to the upstream identity
//! provider. Swap in another [`AuthenticationService`] to consult a real
//! session store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::context::SecurityContext;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthStatus {
    Authenticated,
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authenticated => write!(f, "AUTHENTICATED"),
        }
    }
}

/// Proof that authentication passed, consumed by the authorization gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResult {
    pub user_id: Uuid,
    pub status: AuthStatus,
    pub authenticated_at: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthenticationError {
    #[error("Authentication failed: no user identity present")]
    MissingUserId,
    #[error("Authentication failed: missing or empty session id")]
    MissingSession,
    /// Reserved for implementations backed by a real session store.
    #[error("Authentication failed: session expired")]
    SessionExpired,
    /// Reserved for implementations that consult account state.
    #[error("Authentication failed: user account is blocked")]
    UserBlocked,
}

#[async_trait]
pub trait AuthenticationService: Send + Sync {
    async fn authenticate(
        &self,
        context: &SecurityContext,
    ) -> Result<AuthResult, AuthenticationError>;
}

/// Default authenticator: a caller is whoever the edge says they are, as long
/// as both a user id and a non-empty session id arrived.
pub struct SessionAuthenticator;

impl SessionAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SessionAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthenticationService for SessionAuthenticator {
    async fn authenticate(
        &self,
        context: &SecurityContext,
    ) -> Result<AuthResult, AuthenticationError> {
        let user_id = context.user_id.ok_or(AuthenticationError::MissingUserId)?;

        match context.session_id.as_deref() {
            Some(session) if !session.is_empty() => Ok(AuthResult {
                user_id,
                status: AuthStatus::Authenticated,
                authenticated_at: Utc::now(),
            }),
            _ => Err(AuthenticationError::MissingSession),
        }
    }
}

//! Single entry point callers use to run business operations behind the
//! pipeline.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinError;
use tracing::{info, warn};

use subgate_observability::CorrelationId;

use crate::context::SecurityContext;
use crate::errors::SecurityError;
use crate::mediator::SecurityMediator;

/// Facade over [`SecurityMediator`]: one call, one correlation id, one
/// isolated task, one log line.
pub struct SecurityFacade {
    mediator: Arc<SecurityMediator>,
}

impl SecurityFacade {
    pub fn new(mediator: Arc<SecurityMediator>) -> Self {
        Self { mediator }
    }

    /// Facade over the default pipeline.
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(SecurityMediator::with_defaults()))
    }

    /// Mediate `context` and, only if every gate passed, run `operation`.
    ///
    /// The whole attempt executes on its own spawned task, so a panicking
    /// operation takes down neither the caller nor any concurrent attempt;
    /// the panic message comes back as a `General` error instead. A denied
    /// request never invokes `operation`. There is no retry here: callers
    /// that want another attempt make another call and get a fresh
    /// correlation id.
    pub async fn secure_access<T, F, Fut>(
        &self,
        context: SecurityContext,
        operation: F,
    ) -> Result<T, SecurityError>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, String>> + Send + 'static,
    {
        let correlation_id = CorrelationId::new();
        let user_hint = context.user_id;
        let path = context.request_path.clone();
        let started = Instant::now();
        let mediator = Arc::clone(&self.mediator);

        let handle = tokio::spawn(async move {
            mediator.mediate_access(&context, correlation_id).await?;

            match operation().await {
                Ok(value) => Ok(value),
                Err(message) => Err(SecurityError::general(message)),
            }
        });

        let outcome = match handle.await {
            Ok(result) => result,
            Err(join_error) => Err(recover_task_failure(join_error)),
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(_) => info!(
                user_id = ?user_hint,
                correlation_id = %correlation_id,
                path = %path,
                duration_ms,
                "✓ Secure access completed"
            ),
            Err(error) => warn!(
                user_id = ?user_hint,
                correlation_id = %correlation_id,
                path = %path,
                duration_ms,
                kind = %error.kind,
                "Secure access failed: {}", error
            ),
        }

        outcome
    }
}

/// Map a crashed or cancelled task back into the caller's error shape,
/// keeping the panic message when there was one.
fn recover_task_failure(join_error: JoinError) -> SecurityError {
    if join_error.is_panic() {
        let payload = join_error.into_panic();
        let message = if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else {
            "Secured operation panicked".to_string()
        };
        SecurityError::general(message)
    } else {
        SecurityError::general("Secured operation was cancelled")
    }
}

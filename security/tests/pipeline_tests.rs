use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_test::assert_ok;
use uuid::Uuid;

use subgate_security::{
    AuditOutcome, AuthResult, AuthenticationError, AuthenticationService, AuthorizationError,
    AuthorizationService, AuthzResult, HeuristicRiskAssessor, InMemoryAuditService,
    PathPolicyAuthorizer, RiskAssessmentError, RiskAssessmentService, RiskResult,
    SecurityContext, SecurityErrorKind, SecurityFacade, SecurityMediator, SessionAuthenticator,
};

// Counting wrappers around the default gates, for call-order assertions

struct CountingAuthenticator {
    inner: SessionAuthenticator,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AuthenticationService for CountingAuthenticator {
    async fn authenticate(
        &self,
        context: &SecurityContext,
    ) -> Result<AuthResult, AuthenticationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.authenticate(context).await
    }
}

struct CountingAuthorizer {
    inner: PathPolicyAuthorizer,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl AuthorizationService for CountingAuthorizer {
    async fn authorize(
        &self,
        auth: &AuthResult,
        context: &SecurityContext,
    ) -> Result<AuthzResult, AuthorizationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.authorize(auth, context).await
    }
}

struct CountingRiskAssessor {
    inner: HeuristicRiskAssessor,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl RiskAssessmentService for CountingRiskAssessor {
    async fn assess_risk(
        &self,
        authz: &AuthzResult,
        context: &SecurityContext,
    ) -> Result<RiskResult, RiskAssessmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.assess_risk(authz, context).await
    }
}

struct CountingPipeline {
    mediator: Arc<SecurityMediator>,
    audit: Arc<InMemoryAuditService>,
    authenticate_calls: Arc<AtomicUsize>,
    authorize_calls: Arc<AtomicUsize>,
    risk_calls: Arc<AtomicUsize>,
}

fn counting_pipeline() -> CountingPipeline {
    let authenticate_calls = Arc::new(AtomicUsize::new(0));
    let authorize_calls = Arc::new(AtomicUsize::new(0));
    let risk_calls = Arc::new(AtomicUsize::new(0));
    let audit = Arc::new(InMemoryAuditService::new());

    let mediator = Arc::new(SecurityMediator::new(
        Arc::new(CountingAuthenticator {
            inner: SessionAuthenticator::new(),
            calls: authenticate_calls.clone(),
        }),
        Arc::new(CountingAuthorizer {
            inner: PathPolicyAuthorizer::new(),
            calls: authorize_calls.clone(),
        }),
        Arc::new(CountingRiskAssessor {
            inner: HeuristicRiskAssessor::new(),
            calls: risk_calls.clone(),
        }),
        audit.clone(),
    ));

    CountingPipeline {
        mediator,
        audit,
        authenticate_calls,
        authorize_calls,
        risk_calls,
    }
}

fn trusted_context(user_id: Uuid) -> SecurityContext {
    SecurityContext::builder()
        .user_id(user_id)
        .session_id("session-abc")
        .ip_address("10.0.0.5")
        .user_agent("Mozilla Chrome")
        .request_path("/api/v1/subscriptions")
        .build()
}

#[tokio::test]
async fn test_trusted_subscription_request_runs_operation() {
    let user_id = Uuid::new_v4();
    let facade = SecurityFacade::with_defaults();

    let result = facade
        .secure_access(trusted_context(user_id), || async {
            Ok::<_, String>("subscription-list")
        })
        .await;

    assert_eq!(assert_ok!(result), "subscription-list");
}

#[tokio::test]
async fn test_stale_admin_request_is_denied_and_operation_skipped() {
    let pipeline = counting_pipeline();
    let facade = SecurityFacade::new(pipeline.mediator.clone());
    let user_id = Uuid::new_v4();
    let operation_calls = Arc::new(AtomicUsize::new(0));
    let op_calls = operation_calls.clone();

    // Authorized through the subscriptions rule, then denied on risk:
    // 15 (unknown ip) + 30 (empty agent) + 15 (stale) + 25 (admin path) = 85.
    let context = SecurityContext::builder()
        .user_id(user_id)
        .session_id("session-abc")
        .ip_address("203.0.113.9")
        .user_agent("")
        .request_path("/api/v1/subscriptions/admin")
        .timestamp(Utc::now() - Duration::milliseconds(600_000))
        .build();

    let err = facade
        .secure_access(context, move || async move {
            op_calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind, SecurityErrorKind::RiskAssessmentFailed);
    assert_eq!(
        err.to_string(),
        format!("High risk access denied for user: {}", user_id)
    );
    assert_eq!(operation_calls.load(Ordering::SeqCst), 0);

    // Authorization did run; the denial came from the risk decision.
    assert_eq!(pipeline.authorize_calls.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.risk_calls.load(Ordering::SeqCst), 1);

    let records = pipeline.audit.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].outcome, AuditOutcome::Denied);
}

#[tokio::test]
async fn test_missing_user_short_circuits_later_gates() {
    let pipeline = counting_pipeline();

    let context = SecurityContext::builder()
        .session_id("session-abc")
        .ip_address("10.0.0.5")
        .user_agent("Mozilla Chrome")
        .request_path("/api/v1/subscriptions")
        .build();

    let err = pipeline
        .mediator
        .mediate_access(&context, subgate_security::CorrelationId::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, SecurityErrorKind::AuthenticationFailed);
    assert_eq!(pipeline.authenticate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.authorize_calls.load(Ordering::SeqCst), 0);
    assert_eq!(pipeline.risk_calls.load(Ordering::SeqCst), 0);

    // The failed attempt is still audited exactly once.
    assert_eq!(pipeline.audit.len().await, 1);
}

#[tokio::test]
async fn test_every_gate_runs_once_on_the_happy_path() {
    let pipeline = counting_pipeline();
    let facade = SecurityFacade::new(pipeline.mediator.clone());

    let result = facade
        .secure_access(trusted_context(Uuid::new_v4()), || async {
            Ok::<_, String>(())
        })
        .await;
    assert_ok!(result);

    assert_eq!(pipeline.authenticate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.authorize_calls.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.risk_calls.load(Ordering::SeqCst), 1);
    assert_eq!(pipeline.audit.len().await, 1);
}

#[tokio::test]
async fn test_concurrent_calls_get_distinct_correlation_ids() {
    let pipeline = counting_pipeline();
    let facade = SecurityFacade::new(pipeline.mediator.clone());

    let (a, b) = tokio::join!(
        facade.secure_access(trusted_context(Uuid::new_v4()), || async {
            Ok::<_, String>("a")
        }),
        facade.secure_access(trusted_context(Uuid::new_v4()), || async {
            Ok::<_, String>("b")
        }),
    );
    assert_ok!(a);
    assert_ok!(b);

    let records = pipeline.audit.records().await;
    assert_eq!(records.len(), 2);
    assert_ne!(records[0].correlation_id, records[1].correlation_id);
    assert_eq!(records[0].outcome, AuditOutcome::Granted);
    assert_eq!(records[1].outcome, AuditOutcome::Granted);
}

#[tokio::test]
async fn test_admin_path_without_subscriptions_is_denied_by_authorization() {
    let pipeline = counting_pipeline();

    let context = SecurityContext::builder()
        .user_id(Uuid::new_v4())
        .session_id("session-abc")
        .ip_address("10.0.0.5")
        .user_agent("Mozilla Chrome")
        .request_path("/api/v1/admin/users")
        .build();

    let err = pipeline
        .mediator
        .mediate_access(&context, subgate_security::CorrelationId::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind, SecurityErrorKind::AuthorizationDenied);
    assert_eq!(pipeline.risk_calls.load(Ordering::SeqCst), 0);

    let records = pipeline.audit.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].error_kind,
        Some(SecurityErrorKind::AuthorizationDenied)
    );
}

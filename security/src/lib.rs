// Access mediation pipeline - library only (no HTTP server)
pub mod context;
pub mod errors;
pub mod facade;
pub mod mediator;
pub mod services;

pub use context::{SecurityContext, SecurityContextBuilder};
pub use errors::{SecurityError, SecurityErrorKind};
pub use facade::SecurityFacade;
pub use mediator::{SecureContext, SecurityMediator};
pub use services::audit::{
    AuditOutcome, AuditRecord, AuditService, InMemoryAuditService, TracingAuditService,
};
pub use services::authentication::{
    AuthResult, AuthStatus, AuthenticationError, AuthenticationService, SessionAuthenticator,
};
pub use services::authorization::{
    AuthorizationError, AuthorizationService, AuthzResult, AuthzStatus, PathPolicyAuthorizer,
};
pub use services::rate_limit::RateLimitService;
pub use services::risk::{
    HeuristicRiskAssessor, RiskAssessmentError, RiskAssessmentService, RiskLevel, RiskResult,
};

// Re-exported so embedders can name correlation ids without a second import.
pub use subgate_observability::CorrelationId;

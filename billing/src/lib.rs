// Subscription business operations - library only (no HTTP server)
pub mod errors;
pub mod services;

pub use errors::ServiceError;
pub use services::subscriptions::SubscriptionService;

pub mod audit;
pub mod authentication;
pub mod authorization;
pub mod rate_limit;
pub mod risk;

pub use audit::*;
pub use authentication::*;
pub use authorization::*;
pub use rate_limit::*;
pub use risk::*;

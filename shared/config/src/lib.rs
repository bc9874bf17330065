//! Environment-backed configuration for the SubGate crates.
//!
//! Loading never fails: missing or malformed values fall back to defaults so
//! a partially configured environment still yields a usable pipeline.

use tracing::warn;

/// Settings for the optional rate-limit gate.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitSettings {
    /// Whether the rate-limit gate is installed at all.
    pub enabled: bool,
    /// Allowed requests per minute per caller key.
    pub requests_per_minute: u32,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_minute: 120,
        }
    }
}

/// Top-level configuration for the access-mediation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct SecurityConfig {
    pub service_name: String,
    pub rate_limit: RateLimitSettings,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            service_name: "subgate".to_string(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

impl SecurityConfig {
    /// Load configuration from the environment (and a `.env` file if present).
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let defaults = RateLimitSettings::default();

        Self {
            service_name: std::env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "subgate".to_string()),
            rate_limit: RateLimitSettings {
                enabled: std::env::var("RATE_LIMIT_ENABLED")
                    .map(|v| v == "true")
                    .unwrap_or(defaults.enabled),
                requests_per_minute: parse_env_u32(
                    "RATE_LIMIT_PER_MINUTE",
                    defaults.requests_per_minute,
                ),
            },
        }
    }
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    match std::env::var(key) {
        Ok(raw) => match raw.parse::<u32>() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, default, "Ignoring unparseable numeric setting");
                default
            }
        },
        Err(_) => default,
    }
}

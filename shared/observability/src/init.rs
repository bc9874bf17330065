//! Tracing initialization for SubGate services.
//!
//! Library crates never install a subscriber on their own; the embedding
//! binary calls one of the `init_tracing*` functions exactly once at startup.
//! Calling them again is harmless, which keeps test binaries that share a
//! process out of trouble.

use std::env;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Output format for emitted log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line, for log shippers.
    Json,
    /// Human-readable multi-line output, for terminals.
    Pretty,
}

impl LogFormat {
    fn from_env_value(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name for log attribution
    pub service_name: String,
    /// Environment (dev, staging, prod)
    pub environment: String,
    pub format: LogFormat,
    /// Log level filter (e.g., "info", "debug", "subgate=debug,info")
    pub level: String,
    /// Whether to log span enter/close events
    pub log_spans: bool,
    /// Whether to include file/line in logs
    pub include_location: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        let format = env::var("LOG_FORMAT")
            .map(|raw| LogFormat::from_env_value(&raw))
            .unwrap_or(LogFormat::Pretty);

        Self {
            service_name: "subgate".to_string(),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()),
            format,
            level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            log_spans: env::var("LOG_SPANS").map(|v| v == "true").unwrap_or(false),
            include_location: env::var("LOG_LOCATION").map(|v| v == "true").unwrap_or(true),
        }
    }
}

impl TracingConfig {
    /// Create config for a specific service
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Set log level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn json(mut self) -> Self {
        self.format = LogFormat::Json;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.format = LogFormat::Pretty;
        self
    }

    /// Enable span enter/close logging
    pub fn with_spans(mut self) -> Self {
        self.log_spans = true;
        self
    }

    /// Set environment
    pub fn with_environment(mut self, env: impl Into<String>) -> Self {
        self.environment = env.into();
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }

    fn span_events(&self) -> FmtSpan {
        if self.log_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

/// Initialize tracing with the given configuration.
///
/// Safe to call more than once; subsequent calls leave the already installed
/// subscriber in place.
///
/// # Example
/// ```ignore
/// use subgate_observability::{init_tracing, TracingConfig};
///
/// init_tracing(TracingConfig::for_service("security-service"));
/// ```
pub fn init_tracing(config: TracingConfig) {
    let installed = match config.format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(config.span_events())
                .with_current_span(true)
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_target(true);

            tracing_subscriber::registry()
                .with(config.filter())
                .with(layer)
                .try_init()
                .is_ok()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_span_events(config.span_events())
                .with_file(config.include_location)
                .with_line_number(config.include_location)
                .with_target(true);

            tracing_subscriber::registry()
                .with(config.filter())
                .with(layer)
                .try_init()
                .is_ok()
        }
    };

    if installed {
        tracing::info!(
            service = %config.service_name,
            environment = %config.environment,
            format = ?config.format,
            "Tracing initialized"
        );
    } else {
        tracing::debug!(
            service = %config.service_name,
            "Tracing already initialized, keeping existing subscriber"
        );
    }
}

/// Quick initialization with defaults for a service
///
/// # Example
/// ```ignore
/// subgate_observability::init_tracing_for("security-service");
/// ```
pub fn init_tracing_for(service_name: &str) {
    init_tracing(TracingConfig::for_service(service_name));
}

/// Initialize tracing based on environment variables only
pub fn init_tracing_from_env() {
    let service = env::var("SERVICE_NAME").unwrap_or_else(|_| "subgate".to_string());
    init_tracing(TracingConfig::for_service(service));
}

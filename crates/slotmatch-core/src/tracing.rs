//! Tracing setup shared by every slotmatch crate.
//!
//! Call [`init_tracing`] once at startup; `RUST_LOG` overrides the default
//! filter. The service runs with JSON output, tests and local tooling with
//! the compact format.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Errors that can occur during tracing initialization.
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set the global subscriber (already initialized).
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// Invalid env filter directive.
    #[error("failed to parse env filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// Compact single-line format (default).
    #[default]
    Compact,
    /// JSON format for the deployed service.
    Json,
}

/// Configuration for tracing initialization.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default level when `RUST_LOG` is not set.
    pub default_level: Level,
    /// Output format.
    pub output_format: TracingOutputFormat,
    /// Whether to emit span enter/close events.
    pub include_span_events: bool,
    /// Custom env filter directive (overrides `default_level` if set).
    pub env_filter: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: Level::INFO,
            output_format: TracingOutputFormat::Compact,
            include_span_events: false,
            env_filter: None,
        }
    }
}

impl TracingConfig {
    /// Config for the deployed scheduling service: JSON with span events.
    #[must_use]
    pub fn service() -> Self {
        Self {
            output_format: TracingOutputFormat::Json,
            include_span_events: true,
            ..Self::default()
        }
    }

    /// Set the default log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Set a custom env filter directive.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }
}

/// Initialize tracing with the given configuration.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or the
/// env filter directive is invalid.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = if let Some(ref filter) = config.env_filter {
        EnvFilter::try_new(filter)?
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("slotmatch={}", config.default_level)))
    };

    let span_events = if config.include_span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    match config.output_format {
        TracingOutputFormat::Compact => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_span_events(span_events));
            tracing::subscriber::set_global_default(subscriber)?;
        }
        TracingOutputFormat::Json => {
            let subscriber = tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_span_events(span_events));
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.default_level, Level::INFO);
        assert_eq!(config.output_format, TracingOutputFormat::Compact);
        assert!(!config.include_span_events);
    }

    #[test]
    fn service_config() {
        let config = TracingConfig::service();
        assert_eq!(config.output_format, TracingOutputFormat::Json);
        assert!(config.include_span_events);
    }

    #[test]
    fn builder_methods() {
        let config = TracingConfig::default()
            .with_level(Level::DEBUG)
            .with_env_filter("slotmatch=trace");
        assert_eq!(config.default_level, Level::DEBUG);
        assert_eq!(config.env_filter, Some("slotmatch=trace".to_string()));
    }
}

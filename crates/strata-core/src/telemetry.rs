//! Tracing subscriber setup.
//!
//! Libraries in this workspace only emit `tracing` events. Binaries and test
//! harnesses call [`init_tracing`] once to install a subscriber.

#[cfg(feature = "telemetry")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::StrataResult;
use serde::{Deserialize, Serialize};

/// Tracing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Whether a subscriber should be installed at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json_output: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info,strata=debug,sqlx=warn".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            log_level: default_log_level(),
            json_output: false,
        }
    }
}

/// Installs the global tracing subscriber.
///
/// Calling this twice is harmless: the second installation attempt is
/// reported at debug level and ignored.
#[cfg(feature = "telemetry")]
pub fn init_tracing(config: &TelemetryConfig) -> StrataResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| crate::StrataError::Configuration(format!("Invalid log filter: {}", e)))?;

    let result = if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }

    tracing::info!(
        log_level = %config.log_level,
        json_output = config.json_output,
        "Tracing initialized"
    );

    Ok(())
}

/// Placeholder for when the telemetry feature is disabled.
#[cfg(not(feature = "telemetry"))]
pub fn init_tracing(_config: &TelemetryConfig) -> StrataResult<()> {
    Ok(())
}

//! Logging configuration and initialization
//!
//! All crate code logs through the `log` facade; this wires it to
//! `env_logger`.

use serde::{Deserialize, Serialize};

/// Environment variable checked first for the log filter
pub const LOG_ENV: &str = "HAND_AR_LOG";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when neither `HAND_AR_LOG` nor `RUST_LOG` is set
    pub default_level: String,
    /// Include timestamps in console output
    pub timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_level: "info".to_string(),
            timestamps: true,
        }
    }
}

impl LogConfig {
    /// Filter string to use, in priority order:
    /// `HAND_AR_LOG`, then `RUST_LOG`, then `default_level`
    pub fn resolve_filter(&self) -> String {
        std::env::var(LOG_ENV)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or_else(|_| self.default_level.clone())
    }
}

/// Initialize the global logger.
///
/// Fails if a logger has already been installed.
pub fn init_logging(config: &LogConfig) -> Result<(), log::SetLoggerError> {
    let filter = config.resolve_filter();

    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&filter);
    if !config.timestamps {
        builder.format_timestamp(None);
    }
    builder.try_init()?;

    log::info!(
        "Logging initialized (hand-ar v{}, filter \"{}\")",
        env!("CARGO_PKG_VERSION"),
        filter
    );
    Ok(())
}

//! Logging and detection metrics

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, LogConfig};
pub use metrics::{DetectionStats, DetectionStatsSnapshot};

/// botd-logs library
///
/// Joins web access logs with bot-detection telemetry and shapes telemetry
/// payloads into bot-detection rows.

pub mod config;
pub mod core;
pub mod error;
pub mod table;
pub mod telemetry;

// Re-exports for convenience
pub use config::{Config, LogPaths};
pub use crate::core::{AlignReport, LogAligner};
pub use error::{BotdError, Result};
pub use telemetry::TelemetryRecorder;

/// Error types for botd-logs
///
/// Only genuinely fatal conditions live here. Malformed access rows and an
/// exhausted bot-detection log are recovered inside the aligner and never
/// surface as errors.

use thiserror::Error;

/// Main error type for botd-logs operations
#[derive(Error, Debug)]
pub enum BotdError {
    /// I/O errors (missing input, unwritable output, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error tied to one of the configured log files
    #[error("Cannot access {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Pattern compilation error
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Telemetry payload that cannot be turned into a bot-detection row
    #[error("Invalid telemetry payload: {0}")]
    InvalidPayload(String),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for botd-logs operations
pub type Result<T> = std::result::Result<T, BotdError>;

impl From<toml::de::Error> for BotdError {
    fn from(err: toml::de::Error) -> Self {
        BotdError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BotdError {
    fn from(err: toml::ser::Error) -> Self {
        BotdError::Config(err.to_string())
    }
}

/// Convert BotdError to a user-friendly error message
impl BotdError {
    /// Attach a file path to an I/O error
    pub fn file<P: AsRef<std::path::Path>>(path: P, source: std::io::Error) -> Self {
        BotdError::File {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            BotdError::Io(e) => {
                format!("File system error. Check paths and permissions. Details: {}", e)
            }
            BotdError::File { path, source } => {
                format!("Could not read or write '{}'. Details: {}", path, source)
            }
            BotdError::Pattern(e) => {
                format!("Internal pattern failed to compile: {}", e)
            }
            BotdError::Serialization(e) => {
                format!("Telemetry is not valid JSON: {}", e)
            }
            BotdError::Config(msg) => {
                format!("Configuration issue: {}", msg)
            }
            BotdError::InvalidPayload(reason) => {
                format!("Telemetry payload rejected: {}", reason)
            }
            BotdError::Generic(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_user_messages() {
        let err = BotdError::InvalidPayload("expected an object".to_string());
        assert!(err.user_message().contains("expected an object"));

        let err = BotdError::Config("bad marker".to_string());
        assert!(err.user_message().contains("Configuration"));
    }

    #[test]
    fn test_error_display() {
        let err = BotdError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "access_log.csv",
        ));
        let display = format!("{}", err);
        assert!(display.starts_with("IO error"));
        assert!(display.contains("access_log.csv"));
    }

    #[test]
    fn test_file_error_names_path() {
        let err = BotdError::file(
            "/var/www/html/BotD/access_log.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().contains("/var/www/html/BotD/access_log.csv"));
        assert!(err.user_message().contains("no such file"));
    }

    #[test]
    fn test_toml_error_becomes_config() {
        let parse: std::result::Result<toml::Value, _> = toml::from_str("paths = [");
        let err: BotdError = parse.unwrap_err().into();
        assert!(matches!(err, BotdError::Config(_)));
    }
}

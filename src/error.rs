//! Error types for Tabsight.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for Tabsight operations.
#[derive(Error, Debug)]
pub enum TabsightError {
    /// Source table failed to load (missing file, corrupt format, etc.)
    #[error("Load error: {0}")]
    Load(String),

    /// Hosted model call failed (rate limits, auth, timeouts, etc.)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Configuration errors (invalid config file, missing API key, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Report export/import errors (unwritable path, corrupt JSON, etc.)
    #[error("Export error: {0}")]
    Export(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TabsightError {
    /// Creates a load error with the given message.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Creates a generation error with the given message.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an export error with the given message.
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Load(_) => "Load Error",
            Self::Generation(_) => "Generation Error",
            Self::Config(_) => "Configuration Error",
            Self::Export(_) => "Export Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using TabsightError.
pub type Result<T> = std::result::Result<T, TabsightError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_load() {
        let err = TabsightError::load("data.xlsx not found");
        assert_eq!(err.to_string(), "Load error: data.xlsx not found");
        assert_eq!(err.category(), "Load Error");
    }

    #[test]
    fn test_error_display_generation() {
        let err = TabsightError::generation("Rate limited. Please wait.");
        assert_eq!(err.to_string(), "Generation error: Rate limited. Please wait.");
        assert_eq!(err.category(), "Generation Error");
    }

    #[test]
    fn test_error_display_config() {
        let err = TabsightError::config("GROQ_API_KEY environment variable not set");
        assert_eq!(
            err.to_string(),
            "Configuration error: GROQ_API_KEY environment variable not set"
        );
        assert_eq!(err.category(), "Configuration Error");
    }

    #[test]
    fn test_error_display_export() {
        let err = TabsightError::export("failed to write report");
        assert_eq!(err.to_string(), "Export error: failed to write report");
        assert_eq!(err.category(), "Export Error");
    }

    #[test]
    fn test_error_display_internal() {
        let err = TabsightError::internal("unexpected state");
        assert_eq!(err.to_string(), "Internal error: unexpected state");
        assert_eq!(err.category(), "Internal Error");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TabsightError>();
    }
}

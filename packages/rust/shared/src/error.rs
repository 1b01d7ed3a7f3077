//! Error types for Docmill.
//!
//! Library crates use [`DocmillError`] via `thiserror`. Consumers embedding
//! the pipeline are expected to wrap this with their own reporting layer.

/// Top-level error type for all Docmill operations.
#[derive(Debug, thiserror::Error)]
pub enum DocmillError {
    /// Configuration validation error. The only class that fails a run
    /// before it starts.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error during fetch (timeout, connect, non-2xx).
    #[error("transport error: {0}")]
    Transport(String),

    /// Headless rendering capability error.
    #[error("render error: {0}")]
    Render(String),

    /// Reader-mode capability error (empty or error response).
    #[error("reader error: {0}")]
    Reader(String),

    /// Malformed sitemap, XML, or frontmatter.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error (invalid URL, empty result set, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocmillError>;

impl DocmillError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DocmillError::config("forced_mode set twice");
        assert_eq!(err.to_string(), "config error: forced_mode set twice");

        let err = DocmillError::Transport("https://a.example: timed out".into());
        assert!(err.to_string().starts_with("transport error:"));
    }
}

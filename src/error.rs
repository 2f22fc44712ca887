//! Error types for Serena.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("Web error: {0}")]
    Web(String),
}

impl Error {
    pub fn config(s: impl Into<String>) -> Self {
        Error::Config(s.into())
    }

    pub fn upstream(s: impl Into<String>) -> Self {
        Error::Upstream(s.into())
    }
}

/// A command was invoked without the argument it needs.
///
/// Carries a command-specific example that is shown back to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageError {
    pub command: &'static str,
    pub example: &'static str,
}

impl UsageError {
    pub fn new(command: &'static str, example: &'static str) -> Self {
        Self { command, example }
    }

    /// Text sent back to the chat.
    pub fn user_message(&self) -> String {
        format!("❗ {}", self.example)
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{} is missing its argument: {}", self.command, self.example)
    }
}

impl std::error::Error for UsageError {}

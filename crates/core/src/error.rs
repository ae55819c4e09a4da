//! Error types for Conch.

use std::any::Any;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for Conch operations.
pub type Result<T> = std::result::Result<T, ConchError>;

/// Main error type for Conch.
#[derive(Debug, Error)]
pub enum ConchError {
    /// Discovery and instantiation left nothing to offer.
    #[error("No commands found in {searched} location(s)")]
    NoCommands { searched: usize },

    #[error("Failed to read input")]
    Input(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A location that could not be turned into command types.
#[derive(Debug, Clone)]
pub struct LocationFailure {
    /// The offending location (or a manifest inside it).
    pub location: PathBuf,

    /// Human-readable cause.
    pub reason: String,
}

impl LocationFailure {
    /// Creates a new location failure.
    pub fn new(location: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure raised by a command while being constructed or executed.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct CommandError {
    message: String,

    #[source]
    source: Option<BoxedSource>,
}

impl CommandError {
    /// Creates an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxedSource>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Converts a caught panic payload into an error.
    pub fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let detail = if let Some(text) = payload.downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = payload.downcast_ref::<String>() {
            text.clone()
        } else {
            "non-string panic payload".to_string()
        };

        Self::new(format!("panicked: {}", detail))
    }

    /// The top-level message, without the cause chain.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The message followed by every underlying cause, colon-separated.
    pub fn detail(&self) -> String {
        let mut detail = self.message.clone();
        let mut cause = self
            .source
            .as_deref()
            .map(|source| source as &(dyn std::error::Error + 'static));

        while let Some(err) = cause {
            detail.push_str(": ");
            detail.push_str(&err.to_string());
            cause = err.source();
        }

        detail
    }
}

//! Error types for DocChat

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the DocChat system
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Documents directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Malformed stream frame ({reason}): {line}")]
    MalformedStreamFrame { line: String, reason: String },

    #[error("Text extraction failed: {0}")]
    Extraction(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Stable name of the error class, suitable for clients to branch on
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnsupportedFormat(_) => "UnsupportedFormat",
            Error::DirectoryNotFound(_) => "DirectoryNotFound",
            Error::Upstream(_) => "UpstreamError",
            Error::InvalidConfiguration(_) => "InvalidConfiguration",
            Error::MalformedStreamFrame { .. } => "MalformedStreamFrame",
            Error::Extraction(_) => "ExtractionError",
            Error::InvalidInput(_) => "InvalidInput",
            Error::Serialization(_) => "SerializationError",
            Error::Timeout(_) => "Timeout",
            Error::Io(_) => "IoError",
            Error::Other(_) => "InternalError",
        }
    }

    /// Build a frame error, keeping only a prefix of very long lines
    pub fn malformed_frame(line: &[u8], reason: impl ToString) -> Self {
        const MAX_LINE: usize = 256;
        let text = String::from_utf8_lossy(line);
        let text = text.trim_end();
        let line = match text.char_indices().nth(MAX_LINE) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        };
        Error::MalformedStreamFrame {
            line,
            reason: reason.to_string(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

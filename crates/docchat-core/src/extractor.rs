//! Text extraction capability

use async_trait::async_trait;
use std::path::Path;

use crate::Result;

/// File extensions accepted for ingestion, lowercase and without the dot
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "pdf", "docx", "csv"];

/// Lowercased extension of `path` when it is one of [`SUPPORTED_EXTENSIONS`]
pub fn supported_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SUPPORTED_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Trait for text extractors
///
/// Implementations turn a file on disk into raw text, keyed by its extension.
/// Extensions outside the supported set fail with `Error::UnsupportedFormat`.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the raw text of a file
    async fn extract(&self, path: &Path) -> Result<String>;
}

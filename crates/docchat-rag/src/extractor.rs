//! File text extraction keyed by extension

use async_trait::async_trait;
use regex::Regex;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::LazyLock;

use docchat_core::{Error, Result, TextExtractor, supported_extension};

/// Paragraph ends, line breaks and text runs of a WordprocessingML body
static DOCX_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)</w:p>|<w:br\s*/>|<w:tab\s*/>|<w:t(?:\s[^>]*)?>(.*?)</w:t>")
        .expect("static regex")
});

/// Extracts plain text from `.txt`, `.md`, `.csv`, `.pdf` and `.docx` files
#[derive(Debug, Clone, Copy, Default)]
pub struct FileTextExtractor;

impl FileTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let ext = supported_extension(path).ok_or_else(|| {
            let ext = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_else(|| "(none)".to_string());
            Error::UnsupportedFormat(ext)
        })?;

        tracing::debug!(path = %path.display(), format = %ext, "extracting text");

        match ext.as_str() {
            "txt" | "md" | "csv" => {
                let bytes = tokio::fs::read(path).await?;
                String::from_utf8(bytes).map_err(|e| {
                    Error::Extraction(format!("{} is not valid UTF-8: {}", path.display(), e))
                })
            }
            "pdf" => {
                let bytes = tokio::fs::read(path).await?;
                run_blocking(move || extract_pdf_text(&bytes)).await
            }
            "docx" => {
                let bytes = tokio::fs::read(path).await?;
                run_blocking(move || extract_docx_text(&bytes)).await
            }
            other => Err(Error::UnsupportedFormat(format!(".{other}"))),
        }
    }
}

async fn run_blocking<F>(job: F) -> Result<String>
where
    F: FnOnce() -> Result<String> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| Error::Extraction(format!("extraction task failed: {e}")))?
}

fn extract_pdf_text(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::Extraction(format!("PDF extraction failed: {e}")))
}

fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Extraction(format!("DOCX is not a zip container: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| Error::Extraction(format!("DOCX has no document body: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| Error::Extraction(format!("DOCX body unreadable: {e}")))?;

    Ok(docx_body_text(&xml))
}

/// Plain text of a `word/document.xml` body, one line per paragraph
pub(crate) fn docx_body_text(xml: &str) -> String {
    let mut text = String::new();
    for token in DOCX_TOKEN.captures_iter(xml) {
        match token.get(1) {
            Some(run) => text.push_str(&unescape_xml(run.as_str())),
            None if token[0].starts_with("<w:tab") => text.push('\t'),
            None => text.push('\n'),
        }
    }
    text
}

fn unescape_xml(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

//! Directory ingestion pipeline

use std::path::{Path, PathBuf};
use std::sync::Arc;

use docchat_core::{
    EmbeddedChunk, EmbeddingProvider, Error, IngestReport, Result, TextExtractor, VectorStore,
    supported_extension,
};

use crate::chunker::Chunker;

/// Turns a directory of documents into stored, embedded chunks
pub struct IngestionPipeline {
    extractor: Arc<dyn TextExtractor>,
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl IngestionPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        chunker: Chunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            extractor,
            chunker,
            embedder,
            store,
        }
    }

    /// Ingest every supported file directly under `dir`.
    ///
    /// Files are processed one at a time in file-name order and each file's
    /// chunks are embedded sequentially, then stored as one batch. The first
    /// failure aborts the run; batches already stored stay stored.
    pub async fn ingest(&self, dir: &Path) -> Result<IngestReport> {
        let files = list_documents(dir).await?;
        tracing::info!(dir = %dir.display(), files = files.len(), "starting ingestion");

        let mut report = IngestReport::default();
        for path in files {
            let chunks = self.ingest_file(&path).await?;
            report.document_count += 1;
            report.chunk_count += chunks;
        }

        tracing::info!(
            documents = report.document_count,
            chunks = report.chunk_count,
            "ingestion finished"
        );
        Ok(report)
    }

    async fn ingest_file(&self, path: &Path) -> Result<usize> {
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let text = self.extractor.extract(path).await?;
        let pieces = self.chunker.chunk(&text);
        if pieces.is_empty() {
            tracing::debug!(source = %source, "no text to index");
            return Ok(0);
        }

        let mut batch = Vec::with_capacity(pieces.len());
        for content in pieces {
            let vector = self.embedder.embed(&content).await?;
            batch.push(EmbeddedChunk { content, vector });
        }

        let count = batch.len();
        self.store.upsert(&source, batch).await?;
        tracing::info!(source = %source, chunks = count, "indexed document");
        Ok(count)
    }
}

/// Regular files directly under `dir` with a supported extension, sorted by name
pub async fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => {}
        _ => return Err(Error::DirectoryNotFound(dir.to_path_buf())),
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if supported_extension(&path).is_none() {
            continue;
        }
        if tokio::fs::metadata(&path).await?.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

//! Word-window chunking

use serde::{Deserialize, Serialize};

use docchat_core::{Error, Result};

/// Configuration for chunking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Words per window
    pub chunk_size: usize,
    /// Words shared by consecutive windows
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
        }
    }
}

/// Splits text into overlapping fixed-size word windows
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a chunker, rejecting configurations that cannot make progress
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::InvalidConfiguration(
                "chunk size must be at least one word".to_string(),
            ));
        }
        if config.overlap >= config.chunk_size {
            return Err(Error::InvalidConfiguration(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                config.overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkerConfig {
        self.config
    }

    /// Split `text` into whitespace-joined word windows.
    ///
    /// Text of at most `chunk_size` words is a single chunk. Longer text is
    /// covered by windows advancing `chunk_size - overlap` words at a time; the
    /// last window may be shorter. Text without words yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_size;
        if words.len() <= size {
            return vec![words.join(" ")];
        }

        let step = size - self.config.overlap;
        let mut chunks = Vec::with_capacity(words.len().div_ceil(step));
        let mut start = 0;

        loop {
            let end = (start + size).min(words.len());
            chunks.push(words[start..end].join(" "));

            if end == words.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }
}

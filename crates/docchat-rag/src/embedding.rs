//! Hash-based embeddings for offline runs

use async_trait::async_trait;

use docchat_core::{EmbeddingProvider, Error, Result};

/// Deterministic bag-of-words embedder.
///
/// Words and bigrams are hashed into a fixed number of buckets and the result
/// is L2-normalized, so texts sharing vocabulary land close under cosine
/// similarity. Needs no model server. Buckets come from MD5 digests, so vectors
/// stored in a persistent collection stay valid across builds.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(Error::InvalidConfiguration(
                "embedding dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn bucket(&self, feature: &str) -> usize {
        let digest = md5::compute(feature.as_bytes());
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest.0[..8]);
        (u64::from_le_bytes(prefix) % self.dimension as u64) as usize
    }

    /// Generate the embedding synchronously
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let normalized: String = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect();
        let words: Vec<&str> = normalized.split_whitespace().collect();

        let mut vector = vec![0.0f32; self.dimension];
        for word in &words {
            vector[self.bucket(word)] += 1.0;
        }
        for pair in words.windows(2) {
            vector[self.bucket(&format!("{} {}", pair[0], pair[1]))] += 0.5;
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_text(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

//! Ollama configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

use docchat_core::{Error, Result};

/// Configuration for the Ollama client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub finetuned_model: String,
    pub embedding_dimension: usize,
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://ollama:11434".to_string(),
            chat_model: "gemma2:9b-instruct-q3_K_M".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            finetuned_model: "gemma2-finetuned".to_string(),
            embedding_dimension: 768,
            timeout_secs: 300,
        }
    }
}

impl OllamaConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let config = Self {
            base_url: env::var("OLLAMA_URL").unwrap_or(defaults.base_url),
            chat_model: env::var("OLLAMA_CHAT_MODEL").unwrap_or(defaults.chat_model),
            embedding_model: env::var("OLLAMA_EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            finetuned_model: env::var("OLLAMA_FINETUNED_MODEL")
                .unwrap_or(defaults.finetuned_model),
            embedding_dimension: parse_var("EMBEDDING_DIMENSION", defaults.embedding_dimension)?,
            timeout_secs: parse_var("OLLAMA_TIMEOUT_SECS", defaults.timeout_secs)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create configuration for an explicit server URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.url()?;
        if self.embedding_dimension == 0 {
            return Err(Error::InvalidConfiguration(
                "EMBEDDING_DIMENSION must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Base URL with a trailing slash so relative endpoints join beneath it
    pub fn url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            Error::InvalidConfiguration(format!("invalid OLLAMA_URL '{}': {}", self.base_url, e))
        })?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            Error::InvalidConfiguration(format!("{name} has an invalid value: '{raw}'"))
        }),
        Err(_) => Ok(default),
    }
}

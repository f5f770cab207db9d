//! Pipeline configuration loaded from the environment.
//!
//! All knobs come from environment variables (a `.env` file is honored by
//! the binary via `dotenvy`). Components never read the environment
//! themselves; they receive a constructed [`Config`].

use std::env;

use crate::error::{Error, Result};

/// Default maximum characters per chunk.
pub const DEFAULT_MAX_CHARS: usize = 1200;

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: u64 = 4;

/// Default Qdrant collection name.
pub const DEFAULT_COLLECTION: &str = "docrag";

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OpenAI API key (embeddings and chat)
    pub openai_api_key: String,
    /// Qdrant gRPC endpoint
    pub qdrant_url: String,
    /// Qdrant collection name
    pub collection: String,
    /// Embedding model
    pub embed_model: String,
    /// Chat model used for answer generation
    pub chat_model: String,
    /// Maximum characters per chunk
    pub max_chars: usize,
    /// Default top-K for retrieval
    pub top_k: u64,
    /// HTTP timeout for remote PDF fetches, seconds
    pub fetch_timeout_secs: u64,
}

impl Config {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Configuration("OPENAI_API_KEY is not set".to_string()))?;

        Ok(Self {
            openai_api_key,
            qdrant_url: env::var("QDRANT_URL")
                .unwrap_or_else(|_| "http://localhost:6334".to_string()),
            collection: env::var("DOCRAG_COLLECTION")
                .unwrap_or_else(|_| DEFAULT_COLLECTION.to_string()),
            embed_model: env::var("DOCRAG_EMBED_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            chat_model: env::var("DOCRAG_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            max_chars: parse_env("DOCRAG_MAX_CHARS", DEFAULT_MAX_CHARS)?,
            top_k: parse_env("DOCRAG_TOP_K", DEFAULT_TOP_K)?,
            fetch_timeout_secs: parse_env("DOCRAG_FETCH_TIMEOUT", 30)?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Configuration(format!("{} has an invalid value: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

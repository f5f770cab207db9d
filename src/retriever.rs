//! Similarity retrieval: query text in, grounding chunk texts out.

use std::sync::Arc;

use tracing::debug;

use crate::embeddings::EmbedBackend;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::scope::QueryScope;

/// Retrieves the top-K most similar chunk texts for a query.
pub struct Retriever {
    embedder: Arc<EmbedBackend>,
    index: Arc<VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<EmbedBackend>, index: Arc<VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Return the chunk texts most similar to `query`, best match first.
    ///
    /// An empty result is not an error; it signals that no grounding
    /// context is available for this scope.
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: u64,
        scope: &QueryScope,
    ) -> Result<Vec<String>> {
        let query_vector = self.embedder.embed_one(query).await?;

        let hits = self
            .index
            .search(query_vector, top_k, scope.filter())
            .await?;

        debug!("Retrieved {} chunks for query", hits.len());

        Ok(hits.into_iter().map(|hit| hit.metadata.text).collect())
    }
}

//! The ingestion and query pipeline.
//!
//! Wires extractor, chunker, embedder, index, and composer together and
//! exposes the functional boundary the outer layer calls. Components are
//! injected already constructed; the pipeline never reaches into
//! process-global state.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

use crate::chunker::chunk_text;
use crate::composer::{AnswerComposer, QuizQuestion};
use crate::config::Config;
use crate::embeddings::{EmbedBackend, EmbeddingService};
use crate::error::{Error, Result};
use crate::extract::TextExtractor;
use crate::index::{ChunkMetadata, ChunkRecord, QdrantIndex, VectorIndex};
use crate::integrations::OpenAIClient;
use crate::retriever::Retriever;
use crate::scope::{DeleteScope, DocumentScope, QueryScope};
use crate::session::ChatSession;

/// Outcome of one document ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    pub chunks_indexed: usize,
}

/// Document QA pipeline.
pub struct Pipeline {
    extractor: TextExtractor,
    embedder: Arc<EmbedBackend>,
    index: Arc<VectorIndex>,
    composer: AnswerComposer,
    max_chars: usize,
}

impl Pipeline {
    /// Assemble a pipeline from already constructed backends.
    pub fn new(
        config: &Config,
        embedder: EmbedBackend,
        index: VectorIndex,
        llm: OpenAIClient,
    ) -> Result<Self> {
        let embedder = Arc::new(embedder);
        let index = Arc::new(index);
        let retriever = Retriever::new(Arc::clone(&embedder), Arc::clone(&index));
        let composer = AnswerComposer::new(llm, retriever, &config.chat_model, config.top_k);

        Ok(Self {
            extractor: TextExtractor::new(Duration::from_secs(config.fetch_timeout_secs))?,
            embedder,
            index,
            composer,
            max_chars: config.max_chars,
        })
    }

    /// Connect the production backends (OpenAI + Qdrant) from config.
    pub fn connect(config: &Config) -> Result<Self> {
        let embedder = EmbedBackend::OpenAI(EmbeddingService::new(
            &config.openai_api_key,
            &config.embed_model,
        )?);
        let index = VectorIndex::Qdrant(QdrantIndex::connect(
            &config.qdrant_url,
            &config.collection,
        )?);
        let llm = OpenAIClient::new(&config.openai_api_key)?;

        Self::new(config, embedder, index, llm)
    }

    /// Extract, chunk, embed, and index one document.
    pub async fn ingest_document(
        &self,
        source: &str,
        scope: &DocumentScope,
    ) -> Result<IngestReport> {
        scope.validate()?;
        let text = self.extractor.extract(source).await?;
        self.ingest_text(&text, scope).await
    }

    /// The post-extraction half of ingestion, for callers that already
    /// hold raw text.
    ///
    /// The batch either commits fully or not at all: an embedding
    /// failure means nothing is upserted.
    pub async fn ingest_text(&self, text: &str, scope: &DocumentScope) -> Result<IngestReport> {
        scope.validate()?;

        let chunks = chunk_text(text, self.max_chars);
        if chunks.is_empty() {
            return Err(Error::Validation(
                "no text found in the provided document".to_string(),
            ));
        }
        info!("Created {} chunks for pdf_id={}", chunks.len(), scope.pdf_id);

        let embeddings = self.embedder.embed_batch(&chunks).await?;
        let dimension = embeddings
            .first()
            .map(|v| v.len())
            .filter(|&len| len > 0)
            .ok_or_else(|| Error::Embedding("backend returned an empty embedding".to_string()))?;

        self.index.ensure_collection(dimension).await?;

        let records = chunk_records(chunks, embeddings, scope);
        let chunks_indexed = records.len();
        self.index.upsert(records).await?;

        info!(
            "Indexed {} chunks for pdf_id={} (company_id={})",
            chunks_indexed, scope.pdf_id, scope.company_id
        );
        Ok(IngestReport { chunks_indexed })
    }

    /// Remove every chunk of `pdf_id` within the scope.
    pub async fn delete_document(&self, pdf_id: &str, scope: &DeleteScope) -> Result<bool> {
        if pdf_id.trim().is_empty() {
            return Err(Error::Validation("pdf_id must not be empty".to_string()));
        }

        self.index.delete(scope.filter(pdf_id)).await?;
        info!("Deleted chunks for pdf_id={}", pdf_id);
        Ok(true)
    }

    /// Answer a question with retrieved grounding context.
    pub async fn answer_query(
        &self,
        question: &str,
        scope: &QueryScope,
        session: &mut ChatSession,
    ) -> Result<String> {
        self.composer.answer(question, scope, session).await
    }

    /// Rewrite an answer into a simplified register.
    pub async fn simplify(&self, answer: &str) -> Result<String> {
        self.composer.simplify(answer).await
    }

    /// Generate multiple-choice questions from the scope's documents.
    pub async fn generate_quiz(
        &self,
        scope: &QueryScope,
        num_questions: usize,
    ) -> Result<Vec<QuizQuestion>> {
        self.composer.generate_quiz(scope, num_questions).await
    }
}

/// Build indexed records for one ingestion batch.
///
/// Ids follow `doc-<unix_timestamp>-<nonce>-<index>`; the random nonce
/// keeps ids from colliding when two ingestions start within the same
/// second.
fn chunk_records(
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    scope: &DocumentScope,
) -> Vec<ChunkRecord> {
    let ts = Utc::now().timestamp();
    let nonce: u16 = rand::random();

    chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(i, (text, vector))| ChunkRecord {
            id: format!("doc-{}-{:04x}-{}", ts, nonce, i),
            vector,
            metadata: ChunkMetadata {
                text,
                company_id: Some(scope.company_value()),
                user_id: scope.user_value(),
                pdf_id: Some(scope.pdf_id.clone()),
                source: scope.source.clone(),
                category: scope.category.clone(),
                namespace: scope.namespace.clone(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MetaValue;

    fn scope() -> DocumentScope {
        DocumentScope {
            user_id: Some("77".to_string()),
            source: Some("upload".to_string()),
            category: Some("physics".to_string()),
            namespace: None,
            ..DocumentScope::new("42", "pdf-1")
        }
    }

    #[test]
    fn chunk_records_copy_scope_metadata() {
        let records = chunk_records(
            vec!["one".to_string(), "two".to_string()],
            vec![vec![1.0], vec![2.0]],
            &scope(),
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].metadata.company_id, Some(MetaValue::Int(42)));
        assert_eq!(records[0].metadata.user_id, Some(MetaValue::Int(77)));
        assert_eq!(records[1].metadata.pdf_id.as_deref(), Some("pdf-1"));
        assert_eq!(records[1].metadata.text, "two");
    }

    #[test]
    fn chunk_ids_are_unique_within_and_across_batches() {
        let batch1 = chunk_records(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.0], vec![2.0]],
            &scope(),
        );
        let batch2 = chunk_records(vec!["a".to_string()], vec![vec![1.0]], &scope());

        assert_ne!(batch1[0].id, batch1[1].id);
        // Same second, different nonce: ids still differ.
        assert_ne!(batch1[0].id, batch2[0].id);
    }

    #[test]
    fn chunk_ids_follow_the_documented_pattern() {
        let records = chunk_records(vec!["a".to_string()], vec![vec![1.0]], &scope());
        let parts: Vec<&str> = records[0].id.split('-').collect();

        assert_eq!(parts[0], "doc");
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(u16::from_str_radix(parts[2], 16).is_ok());
        assert_eq!(parts[3], "0");
    }
}

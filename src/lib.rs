//! Document question answering over PDFs.
//!
//! Ingests PDF documents (local files or URLs), chunks the extracted
//! text, embeds the chunks, and stores them in a multi-tenant vector
//! index. Questions are answered by retrieving the most similar chunks
//! for the caller's tenant scope and composing a grounded LLM reply.
//!
//! [`Pipeline`] is the main entry point; the individual stages are
//! public for callers that need finer control.

pub mod chunker;
pub mod composer;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extract;
pub mod index;
pub mod integrations;
pub mod pipeline;
pub mod retriever;
pub mod scope;
pub mod session;

pub use chunker::chunk_text;
pub use composer::{AnswerComposer, QuizQuestion};
pub use config::Config;
pub use embeddings::{EmbedBackend, EmbeddingService, LocalEmbedder};
pub use error::{Error, Result};
pub use extract::TextExtractor;
pub use index::{
    ChunkMetadata, ChunkRecord, MemoryIndex, MetaValue, QdrantIndex, ScoredChunk, SearchFilter,
    VectorIndex,
};
pub use integrations::OpenAIClient;
pub use pipeline::{IngestReport, Pipeline};
pub use retriever::Retriever;
pub use scope::{DeleteScope, DocumentScope, QueryScope};
pub use session::{ChatSession, ChatTurn};

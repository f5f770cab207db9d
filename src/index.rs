//! Vector index integration.
//!
//! Chunk records (vector + tenant metadata) are stored in a cosine-metric
//! collection. Two backends live behind [`VectorIndex`]: Qdrant for
//! production and a brute-force in-memory index for tests and offline
//! runs. Both support concurrent upserts and searches without
//! caller-side locking.

use std::collections::HashMap;
use std::sync::RwLock;

use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, FieldCondition, Filter, Match,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Metadata value with lenient numeric coercion.
///
/// Tenant fields (`company_id`, `user_id`) arrive as strings from the
/// boundary layer; values that parse as integers are stored as integers,
/// anything else passes through as a string. Malformed input therefore
/// degrades filtering instead of aborting ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Int(i64),
    Str(String),
}

impl MetaValue {
    /// Coerce a raw string, preferring an integer representation.
    pub fn coerce(raw: &str) -> Self {
        match raw.trim().parse::<i64>() {
            Ok(n) => MetaValue::Int(n),
            Err(_) => MetaValue::Str(raw.to_string()),
        }
    }

    fn to_qdrant(&self) -> QdrantValue {
        match self {
            MetaValue::Int(n) => (*n).into(),
            MetaValue::Str(s) => s.clone().into(),
        }
    }

    fn to_match(&self) -> qdrant_client::qdrant::r#match::MatchValue {
        use qdrant_client::qdrant::r#match::MatchValue;
        match self {
            MetaValue::Int(n) => MatchValue::Integer(*n),
            MetaValue::Str(s) => MatchValue::Keyword(s.clone()),
        }
    }

    fn from_qdrant(value: &QdrantValue) -> Option<Self> {
        match &value.kind {
            Some(qdrant_client::qdrant::value::Kind::IntegerValue(n)) => Some(MetaValue::Int(*n)),
            Some(qdrant_client::qdrant::value::Kind::StringValue(s)) => {
                Some(MetaValue::Str(s.clone()))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for MetaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaValue::Int(n) => write!(f, "{}", n),
            MetaValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Tenant metadata stored alongside each chunk vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkMetadata {
    /// Raw chunk text
    pub text: String,
    pub company_id: Option<MetaValue>,
    pub user_id: Option<MetaValue>,
    pub pdf_id: Option<String>,
    pub source: Option<String>,
    pub category: Option<String>,
    pub namespace: Option<String>,
}

impl ChunkMetadata {
    fn to_payload(&self) -> HashMap<String, QdrantValue> {
        let mut payload: HashMap<String, QdrantValue> = HashMap::new();
        payload.insert("text".into(), self.text.clone().into());
        if let Some(company_id) = &self.company_id {
            payload.insert("company_id".into(), company_id.to_qdrant());
        }
        if let Some(user_id) = &self.user_id {
            payload.insert("user_id".into(), user_id.to_qdrant());
        }
        if let Some(pdf_id) = &self.pdf_id {
            payload.insert("pdf_id".into(), pdf_id.clone().into());
        }
        if let Some(source) = &self.source {
            payload.insert("source".into(), source.clone().into());
        }
        if let Some(category) = &self.category {
            payload.insert("category".into(), category.clone().into());
        }
        if let Some(namespace) = &self.namespace {
            payload.insert("namespace".into(), namespace.clone().into());
        }
        payload
    }

    /// Parse a payload back into metadata. Records without a `text` field
    /// are not usable as grounding context and yield `None`.
    fn from_payload(payload: &HashMap<String, QdrantValue>) -> Option<Self> {
        let text = payload.get("text")?.as_str()?.to_string();
        Some(Self {
            text,
            company_id: payload.get("company_id").and_then(MetaValue::from_qdrant),
            user_id: payload.get("user_id").and_then(MetaValue::from_qdrant),
            pdf_id: payload
                .get("pdf_id")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            source: payload
                .get("source")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            category: payload
                .get("category")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
            namespace: payload
                .get("namespace")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        })
    }
}

/// One indexed record: chunk id, embedding vector, tenant metadata.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

/// A search hit, similarity-descending.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub id: String,
    pub score: f32,
    pub metadata: ChunkMetadata,
}

/// Equality filter over tenant metadata fields.
#[derive(Debug, Default, Clone)]
pub struct SearchFilter {
    pub company_id: Option<MetaValue>,
    pub user_id: Option<MetaValue>,
    pub pdf_id: Option<String>,
    pub namespace: Option<String>,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain to a tenant (lenient coercion, see [`MetaValue`]).
    pub fn company(mut self, company_id: &str) -> Self {
        self.company_id = Some(MetaValue::coerce(company_id));
        self
    }

    pub fn user(mut self, user_id: &str) -> Self {
        self.user_id = Some(MetaValue::coerce(user_id));
        self
    }

    pub fn pdf(mut self, pdf_id: &str) -> Self {
        self.pdf_id = Some(pdf_id.to_string());
        self
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.company_id.is_none()
            && self.user_id.is_none()
            && self.pdf_id.is_none()
            && self.namespace.is_none()
    }

    fn matches(&self, meta: &ChunkMetadata) -> bool {
        if let Some(company_id) = &self.company_id {
            if meta.company_id.as_ref() != Some(company_id) {
                return false;
            }
        }
        if let Some(user_id) = &self.user_id {
            if meta.user_id.as_ref() != Some(user_id) {
                return false;
            }
        }
        if let Some(pdf_id) = &self.pdf_id {
            if meta.pdf_id.as_deref() != Some(pdf_id.as_str()) {
                return false;
            }
        }
        if let Some(namespace) = &self.namespace {
            if meta.namespace.as_deref() != Some(namespace.as_str()) {
                return false;
            }
        }
        true
    }

    fn into_qdrant_filter(self) -> Option<Filter> {
        let mut conditions = Vec::new();

        if let Some(company_id) = &self.company_id {
            conditions.push(field_condition("company_id", company_id.to_match()));
        }
        if let Some(user_id) = &self.user_id {
            conditions.push(field_condition("user_id", user_id.to_match()));
        }
        if let Some(pdf_id) = &self.pdf_id {
            conditions.push(field_condition(
                "pdf_id",
                qdrant_client::qdrant::r#match::MatchValue::Keyword(pdf_id.clone()),
            ));
        }
        if let Some(namespace) = &self.namespace {
            conditions.push(field_condition(
                "namespace",
                qdrant_client::qdrant::r#match::MatchValue::Keyword(namespace.clone()),
            ));
        }

        if conditions.is_empty() {
            None
        } else {
            Some(Filter::must(conditions))
        }
    }
}

fn field_condition(
    key: &str,
    value: qdrant_client::qdrant::r#match::MatchValue,
) -> qdrant_client::qdrant::Condition {
    FieldCondition {
        key: key.to_string(),
        r#match: Some(Match {
            match_value: Some(value),
        }),
        ..Default::default()
    }
    .into()
}

/// Vector index backend used by the pipeline.
pub enum VectorIndex {
    Qdrant(QdrantIndex),
    Memory(MemoryIndex),
}

impl VectorIndex {
    /// In-memory backend, mainly for tests and offline runs.
    pub fn memory() -> Self {
        VectorIndex::Memory(MemoryIndex::new())
    }

    /// Idempotently create the collection with the given dimension.
    ///
    /// Safe under concurrent first-time ingestions; an existing
    /// collection with a different dimension is an error.
    pub async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        match self {
            VectorIndex::Qdrant(index) => index.ensure_collection(dimension).await,
            VectorIndex::Memory(index) => index.ensure_collection(dimension),
        }
    }

    /// Write records; re-upserting an id overwrites.
    pub async fn upsert(&self, records: Vec<ChunkRecord>) -> Result<()> {
        match self {
            VectorIndex::Qdrant(index) => index.upsert(records).await,
            VectorIndex::Memory(index) => index.upsert(records),
        }
    }

    /// Top-K nearest records by cosine similarity, optionally filtered.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: SearchFilter,
    ) -> Result<Vec<ScoredChunk>> {
        match self {
            VectorIndex::Qdrant(index) => index.search(vector, top_k, filter).await,
            VectorIndex::Memory(index) => index.search(&vector, top_k, &filter),
        }
    }

    /// Remove all records matching the filter.
    pub async fn delete(&self, filter: SearchFilter) -> Result<()> {
        match self {
            VectorIndex::Qdrant(index) => index.delete(filter).await,
            VectorIndex::Memory(index) => index.delete(&filter).map(|_| ()),
        }
    }
}

/// Vector index backed by a Qdrant server.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
}

impl QdrantIndex {
    /// Connect to a Qdrant server.
    pub fn connect(url: &str, collection: impl Into<String>) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| Error::Index(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.into(),
        })
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<()> {
        if self.collection_exists().await? {
            return self.check_dimension(dimension).await;
        }

        info!("Creating collection '{}'", self.collection);
        let create = self
            .client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(dimension as u64, Distance::Cosine),
                ),
            )
            .await;

        match create {
            Ok(_) => Ok(()),
            // Lost a creation race: another ingestion created it first.
            Err(_) if self.collection_exists().await? => self.check_dimension(dimension).await,
            Err(e) => Err(Error::Index(e.to_string())),
        }
    }

    async fn collection_exists(&self) -> Result<bool> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| Error::Index(e.to_string()))?;

        Ok(collections
            .collections
            .iter()
            .any(|c| c.name == self.collection))
    }

    async fn check_dimension(&self, dimension: usize) -> Result<()> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| Error::Index(e.to_string()))?;

        let existing = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|c| match c {
                qdrant_client::qdrant::vectors_config::Config::Params(params) => Some(params.size),
                qdrant_client::qdrant::vectors_config::Config::ParamsMap(_) => None,
            });

        match existing {
            Some(size) if size != dimension as u64 => Err(Error::Index(format!(
                "dimension mismatch: collection '{}' has {}, embeddings have {}",
                self.collection, size, dimension
            ))),
            Some(_) => {
                debug!("Collection '{}' already exists", self.collection);
                Ok(())
            }
            None => {
                warn!(
                    "Could not determine dimension of collection '{}'",
                    self.collection
                );
                Ok(())
            }
        }
    }

    async fn upsert(&self, records: Vec<ChunkRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(|record| {
                let mut payload = record.metadata.to_payload();
                payload.insert("chunk_id".into(), record.id.clone().into());
                PointStruct::new(point_id(&record.id), record.vector, payload)
            })
            .collect();

        debug!("Upserting {} points to Qdrant", points.len());

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points))
            .await
            .map_err(|e| Error::Index(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: SearchFilter,
    ) -> Result<Vec<ScoredChunk>> {
        let mut search_builder =
            SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true);

        if let Some(qdrant_filter) = filter.into_qdrant_filter() {
            search_builder = search_builder.filter(qdrant_filter);
        }

        let results = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| Error::Index(e.to_string()))?;

        let hits = results
            .result
            .into_iter()
            .filter_map(|point| {
                let metadata = ChunkMetadata::from_payload(&point.payload)?;
                let id = point
                    .payload
                    .get("chunk_id")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string())?;
                Some(ScoredChunk {
                    id,
                    score: point.score,
                    metadata,
                })
            })
            .collect();

        Ok(hits)
    }

    async fn delete(&self, filter: SearchFilter) -> Result<()> {
        let Some(qdrant_filter) = filter.into_qdrant_filter() else {
            return Err(Error::Validation(
                "refusing to delete with an empty filter".to_string(),
            ));
        };

        self.client
            .delete_points(DeletePointsBuilder::new(&self.collection).points(qdrant_filter))
            .await
            .map_err(|e| Error::Index(e.to_string()))?;

        info!("Deleted points from '{}' by filter", self.collection);
        Ok(())
    }
}

/// Qdrant point ids must be UUIDs or integers; chunk ids are mapped to a
/// deterministic UUIDv5 so that re-upserting the same chunk id overwrites.
fn point_id(chunk_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, chunk_id.as_bytes()).to_string()
}

/// Brute-force in-memory index with the same contract as Qdrant.
#[derive(Default)]
pub struct MemoryIndex {
    inner: RwLock<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    dimension: Option<usize>,
    records: HashMap<String, ChunkRecord>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.inner.read().expect("index lock poisoned").records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sync counterpart of [`VectorIndex::ensure_collection`].
    pub fn ensure_collection(&self, dimension: usize) -> Result<()> {
        let mut inner = self.inner.write().expect("index lock poisoned");
        match inner.dimension {
            None => {
                inner.dimension = Some(dimension);
                Ok(())
            }
            Some(existing) if existing == dimension => Ok(()),
            Some(existing) => Err(Error::Index(format!(
                "dimension mismatch: collection has {}, embeddings have {}",
                existing, dimension
            ))),
        }
    }

    pub fn upsert(&self, records: Vec<ChunkRecord>) -> Result<()> {
        let mut inner = self.inner.write().expect("index lock poisoned");
        for record in records {
            if let Some(dimension) = inner.dimension {
                if record.vector.len() != dimension {
                    return Err(Error::Index(format!(
                        "dimension mismatch: collection has {}, record '{}' has {}",
                        dimension,
                        record.id,
                        record.vector.len()
                    )));
                }
            }
            inner.records.insert(record.id.clone(), record);
        }
        Ok(())
    }

    fn search(
        &self,
        vector: &[f32],
        top_k: u64,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredChunk>> {
        let inner = self.inner.read().expect("index lock poisoned");

        let mut hits: Vec<ScoredChunk> = inner
            .records
            .values()
            .filter(|record| filter.matches(&record.metadata))
            .map(|record| ScoredChunk {
                id: record.id.clone(),
                score: cosine_similarity(vector, &record.vector),
                metadata: record.metadata.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(top_k as usize);
        Ok(hits)
    }

    fn delete(&self, filter: &SearchFilter) -> Result<u64> {
        if filter.is_empty() {
            return Err(Error::Validation(
                "refusing to delete with an empty filter".to_string(),
            ));
        }

        let mut inner = self.inner.write().expect("index lock poisoned");
        let before = inner.records.len();
        inner.records.retain(|_, record| !filter.matches(&record.metadata));
        Ok((before - inner.records.len()) as u64)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, vector: Vec<f32>, company: &str, pdf: &str) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            vector,
            metadata: ChunkMetadata {
                text: format!("text of {}", id),
                company_id: Some(MetaValue::coerce(company)),
                user_id: None,
                pdf_id: Some(pdf.to_string()),
                source: None,
                category: None,
                namespace: None,
            },
        }
    }

    #[test]
    fn meta_value_coerces_integers() {
        assert_eq!(MetaValue::coerce("42"), MetaValue::Int(42));
        assert_eq!(MetaValue::coerce(" 7 "), MetaValue::Int(7));
        assert_eq!(MetaValue::coerce("-3"), MetaValue::Int(-3));
    }

    #[test]
    fn meta_value_passes_through_non_numeric() {
        assert_eq!(
            MetaValue::coerce("acme-corp"),
            MetaValue::Str("acme-corp".to_string())
        );
        assert_eq!(MetaValue::coerce("4.5"), MetaValue::Str("4.5".to_string()));
    }

    #[test]
    fn payload_round_trip_preserves_metadata() {
        let metadata = ChunkMetadata {
            text: "some chunk".to_string(),
            company_id: Some(MetaValue::Int(12)),
            user_id: Some(MetaValue::Str("u-9".to_string())),
            pdf_id: Some("pdf-1".to_string()),
            source: Some("upload".to_string()),
            category: Some("physics".to_string()),
            namespace: Some("prod".to_string()),
        };

        let payload = metadata.to_payload();
        let parsed = ChunkMetadata::from_payload(&payload).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn payload_string_fields_ignore_wrong_types() {
        let mut payload = HashMap::new();
        payload.insert("text".to_string(), QdrantValue::from("chunk".to_string()));
        payload.insert("pdf_id".to_string(), QdrantValue::from(7i64));
        payload.insert("source".to_string(), QdrantValue::from("upload".to_string()));

        let parsed = ChunkMetadata::from_payload(&payload).unwrap();
        assert_eq!(parsed.text, "chunk");
        assert_eq!(parsed.pdf_id, None);
        assert_eq!(parsed.source.as_deref(), Some("upload"));
    }

    #[test]
    fn payload_without_text_is_rejected() {
        let mut payload = HashMap::new();
        payload.insert("company_id".to_string(), QdrantValue::from(5i64));
        assert!(ChunkMetadata::from_payload(&payload).is_none());
    }

    #[test]
    fn filter_matches_on_all_set_fields() {
        let meta = ChunkMetadata {
            text: "t".to_string(),
            company_id: Some(MetaValue::Int(1)),
            user_id: None,
            pdf_id: Some("pdf-a".to_string()),
            source: None,
            category: None,
            namespace: Some("ns".to_string()),
        };

        assert!(SearchFilter::new().matches(&meta));
        assert!(SearchFilter::new().company("1").matches(&meta));
        assert!(SearchFilter::new().company("1").pdf("pdf-a").matches(&meta));
        assert!(!SearchFilter::new().company("2").matches(&meta));
        assert!(!SearchFilter::new().pdf("pdf-b").matches(&meta));
        assert!(!SearchFilter::new().namespace("other").matches(&meta));
        // A filter on a field the record lacks must not match.
        assert!(!SearchFilter::new().user("7").matches(&meta));
    }

    #[test]
    fn point_ids_are_stable_and_distinct() {
        assert_eq!(point_id("doc-1-0"), point_id("doc-1-0"));
        assert_ne!(point_id("doc-1-0"), point_id("doc-1-1"));
        assert!(Uuid::parse_str(&point_id("doc-1-0")).is_ok());
    }

    #[test]
    fn memory_ensure_collection_is_idempotent() {
        let index = MemoryIndex::new();
        index.ensure_collection(8).unwrap();
        index.ensure_collection(8).unwrap();

        let err = index.ensure_collection(16).unwrap_err();
        assert!(matches!(err, Error::Index(_)));
        assert!(err.to_string().contains("dimension mismatch"));
    }

    #[test]
    fn memory_upsert_overwrites_by_id() {
        let index = MemoryIndex::new();
        index.ensure_collection(2).unwrap();

        index
            .upsert(vec![record("doc-1-0", vec![1.0, 0.0], "1", "pdf-a")])
            .unwrap();
        index
            .upsert(vec![record("doc-1-0", vec![0.0, 1.0], "1", "pdf-a")])
            .unwrap();

        assert_eq!(index.len(), 1);
        let hits = index
            .search(&[0.0, 1.0], 10, &SearchFilter::new())
            .unwrap();
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn memory_upsert_rejects_wrong_dimension() {
        let index = MemoryIndex::new();
        index.ensure_collection(2).unwrap();

        let err = index
            .upsert(vec![record("doc-1-0", vec![1.0, 0.0, 0.0], "1", "pdf-a")])
            .unwrap_err();
        assert!(matches!(err, Error::Index(_)));
    }

    #[test]
    fn memory_search_respects_tenant_filter() {
        let index = MemoryIndex::new();
        index.ensure_collection(2).unwrap();
        index
            .upsert(vec![
                record("doc-1-0", vec![1.0, 0.0], "1", "pdf-a"),
                record("doc-1-1", vec![1.0, 0.0], "2", "pdf-b"),
            ])
            .unwrap();

        let hits = index
            .search(&[1.0, 0.0], 10, &SearchFilter::new().company("1"))
            .unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.company_id, Some(MetaValue::Int(1)));
    }

    #[test]
    fn memory_search_orders_by_similarity() {
        let index = MemoryIndex::new();
        index.ensure_collection(2).unwrap();
        index
            .upsert(vec![
                record("far", vec![0.0, 1.0], "1", "pdf-a"),
                record("near", vec![1.0, 0.0], "1", "pdf-a"),
            ])
            .unwrap();

        let hits = index
            .search(&[1.0, 0.1], 10, &SearchFilter::new())
            .unwrap();

        assert_eq!(hits[0].id, "near");
        assert_eq!(hits[1].id, "far");
    }

    #[test]
    fn memory_search_truncates_to_top_k() {
        let index = MemoryIndex::new();
        index.ensure_collection(2).unwrap();
        index
            .upsert(
                (0..10)
                    .map(|i| record(&format!("doc-1-{}", i), vec![1.0, 0.0], "1", "pdf-a"))
                    .collect(),
            )
            .unwrap();

        let hits = index.search(&[1.0, 0.0], 3, &SearchFilter::new()).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn memory_delete_by_pdf_scoped_to_company() {
        let index = MemoryIndex::new();
        index.ensure_collection(2).unwrap();
        index
            .upsert(vec![
                record("a0", vec![1.0, 0.0], "1", "pdf-x"),
                record("b0", vec![1.0, 0.0], "2", "pdf-x"),
            ])
            .unwrap();

        let deleted = index
            .delete(&SearchFilter::new().pdf("pdf-x").company("1"))
            .unwrap();
        assert_eq!(deleted, 1);

        // The other tenant's chunks for the same pdf_id survive.
        let hits = index
            .search(&[1.0, 0.0], 10, &SearchFilter::new().pdf("pdf-x"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.company_id, Some(MetaValue::Int(2)));
    }

    #[test]
    fn memory_delete_refuses_empty_filter() {
        let index = MemoryIndex::new();
        let err = index.delete(&SearchFilter::new()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn memory_search_isolates_namespaces() {
        let index = MemoryIndex::new();
        index.ensure_collection(2).unwrap();

        let mut in_ns = record("n0", vec![1.0, 0.0], "1", "pdf-a");
        in_ns.metadata.namespace = Some("staging".to_string());
        let out_ns = record("n1", vec![1.0, 0.0], "1", "pdf-a");
        index.upsert(vec![in_ns, out_ns]).unwrap();

        let hits = index
            .search(&[1.0, 0.0], 10, &SearchFilter::new().namespace("staging"))
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "n0");
    }

    #[test]
    fn cosine_similarity_handles_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);

        let aligned = cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]);
        assert!((aligned - 1.0).abs() < 1e-6);

        let orthogonal = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(orthogonal.abs() < 1e-6);
    }
}

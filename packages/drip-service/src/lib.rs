pub mod ingest;
pub mod rerank;
pub mod retrieve;

mod error;

use std::{fmt, future::Future, pin::Pin, sync::Arc, time::Duration};

use tokio::time;

pub use drip_storage::Visibility;
pub use error::{Error, Result, Stage};
pub use ingest::{FeedbackRequest, FeedbackResponse, IngestReport};
pub use rerank::{RankedReference, ScoringWeights};
pub use retrieve::{RetrievalRequest, RetrievalResponse};

use drip_config::{Config, EmbeddingProviderConfig};
use drip_providers::embedding;
use drip_storage::{AccessScope, RawHit, StoredPoint, memory::InMemoryStore, qdrant::QdrantStore};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// Nearest-neighbor index holding flattened brew records.
pub trait VectorStore
where
	Self: Send + Sync,
{
	fn upsert<'a>(&'a self, point: StoredPoint) -> BoxFuture<'a, drip_storage::Result<()>>;

	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: usize,
		scope: &'a AccessScope,
	) -> BoxFuture<'a, drip_storage::Result<Vec<RawHit>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}
impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

pub struct DripService {
	pub cfg: Config,
	pub store: Arc<dyn VectorStore>,
	pub providers: Providers,
}
impl DripService {
	pub fn new(cfg: Config, store: Arc<dyn VectorStore>) -> Self {
		Self { cfg, store, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn VectorStore>, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}

	/// Builds the service on the backend named by `storage.backend`, creating the Qdrant
	/// collection when it does not exist yet.
	pub async fn connect(cfg: Config) -> drip_storage::Result<Self> {
		let store: Arc<dyn VectorStore> = match cfg.storage.backend.as_str() {
			"memory" => Arc::new(InMemoryStore::new()),
			_ => {
				let qdrant = QdrantStore::new(&cfg.storage.qdrant)?;

				qdrant.ensure_collection().await?;

				Arc::new(qdrant)
			},
		};

		tracing::info!(backend = %cfg.storage.backend, "Vector store ready.");

		Ok(Self::new(cfg, store))
	}
}

/// Whether a dependency failure surfaces as a retrieval or an ingestion error.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Phase {
	Retrieval,
	Ingestion,
}
impl Phase {
	fn unavailable(self, stage: Stage, message: String) -> Error {
		match self {
			Self::Retrieval => Error::RetrievalUnavailable { stage, message },
			Self::Ingestion => Error::IngestionUnavailable { stage, message },
		}
	}
}

impl DripService {
	/// Runs one external call under `retrieval.timeout_ms`. Failures are logged with their cause
	/// and reported by stage only.
	pub(crate) async fn bounded<T, E, F>(&self, phase: Phase, stage: Stage, call: F) -> Result<T>
	where
		E: fmt::Display,
		F: Future<Output = std::result::Result<T, E>>,
	{
		let timeout_ms = self.cfg.retrieval.timeout_ms;

		match time::timeout(Duration::from_millis(timeout_ms), call).await {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(err)) => {
				tracing::warn!(error = %err, %stage, ?phase, "Dependency call failed.");

				Err(phase.unavailable(stage, format!("The {stage} dependency failed.")))
			},
			Err(_) => {
				tracing::warn!(timeout_ms, %stage, ?phase, "Dependency call timed out.");

				Err(phase.unavailable(
					stage,
					format!("The {stage} dependency timed out after {timeout_ms} ms."),
				))
			},
		}
	}

	pub(crate) async fn embed_text(&self, text: &str, phase: Phase) -> Result<Vec<f32>> {
		let cfg = &self.cfg.providers.embedding;
		let texts = [text.to_string()];
		let mut vectors = self
			.bounded(phase, Stage::Embedding, self.providers.embedding.embed(cfg, &texts))
			.await?;
		let expected = self.cfg.storage.qdrant.vector_dim as usize;

		match vectors.pop() {
			Some(vector) if vectors.is_empty() && vector.len() == expected => Ok(vector),
			other => {
				tracing::warn!(
					vectors = vectors.len() + usize::from(other.is_some()),
					dimensions = other.as_ref().map(Vec::len),
					expected,
					"Embedding provider returned an unexpected shape."
				);

				Err(phase.unavailable(
					Stage::Embedding,
					"The embedding dependency returned an unexpected vector.".to_string(),
				))
			},
		}
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl VectorStore for QdrantStore {
	fn upsert<'a>(&'a self, point: StoredPoint) -> BoxFuture<'a, drip_storage::Result<()>> {
		Box::pin(QdrantStore::upsert(self, point))
	}

	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: usize,
		scope: &'a AccessScope,
	) -> BoxFuture<'a, drip_storage::Result<Vec<RawHit>>> {
		Box::pin(QdrantStore::search(self, vector, limit as u64, scope))
	}
}

impl VectorStore for InMemoryStore {
	fn upsert<'a>(&'a self, point: StoredPoint) -> BoxFuture<'a, drip_storage::Result<()>> {
		Box::pin(InMemoryStore::upsert(self, point))
	}

	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		limit: usize,
		scope: &'a AccessScope,
	) -> BoxFuture<'a, drip_storage::Result<Vec<RawHit>>> {
		Box::pin(async move { InMemoryStore::search(self, &vector, limit, scope).await })
	}
}

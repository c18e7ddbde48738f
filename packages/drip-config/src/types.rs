use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	pub seed: Option<Seed>,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	/// One of "qdrant" or "memory".
	#[serde(default = "default_backend")]
	pub backend: String,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Request defaults and bounds for `/rag`.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub default_k: u32,
	pub max_k: u32,
	pub default_similarity_weight: f64,
	pub default_retrieval_multiplier: u32,
	pub max_retrieval_multiplier: u32,
	pub use_evaluation_reranking: bool,
	/// Upper bound for each embedding and vector-store call.
	pub timeout_ms: u64,
	/// Serve public references to callers without a tenant instead of rejecting them.
	pub allow_anonymous_public: bool,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			default_k: 3,
			max_k: 10,
			default_similarity_weight: 0.7,
			default_retrieval_multiplier: 3,
			max_retrieval_multiplier: 5,
			use_evaluation_reranking: true,
			timeout_ms: 30_000,
			allow_anonymous_public: false,
		}
	}
}

#[derive(Debug, Deserialize)]
pub struct Seed {
	pub path: PathBuf,
	#[serde(default = "default_seed_owner")]
	pub owner: String,
}

fn default_backend() -> String {
	"qdrant".to_string()
}

fn default_seed_owner() -> String {
	"dailydrip".to_string()
}

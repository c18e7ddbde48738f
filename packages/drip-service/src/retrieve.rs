use serde::{Deserialize, Serialize};
use serde_json::Value;

use drip_domain::codec;
use drip_storage::AccessScope;

use crate::{DripService, Error, Phase, RankedReference, Result, ScoringWeights, Stage};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrievalRequest {
	#[serde(default)]
	pub user_id: String,
	pub bean: Option<Value>,
	pub record: Option<Value>,
	pub query: Option<String>,
	pub k: Option<usize>,
	pub use_evaluation_reranking: Option<bool>,
	pub similarity_weight: Option<f64>,
	pub retrieval_multiplier: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResponse {
	pub query: String,
	pub results: Vec<RankedReference>,
}

impl DripService {
	/// Resolves request defaults from `[retrieval]`, validates them, and runs [`Self::retrieve`].
	pub async fn rag(&self, req: RetrievalRequest) -> Result<RetrievalResponse> {
		let cfg = &self.cfg.retrieval;
		let max_k = cfg.max_k as usize;
		let k = req.k.unwrap_or(cfg.default_k as usize);

		if k == 0 || k > max_k {
			return Err(Error::validation("k", format!("k must be in the range 1-{max_k}.")));
		}

		let similarity_weight = req.similarity_weight.unwrap_or(cfg.default_similarity_weight);

		if !similarity_weight.is_finite() || !(0.0..=1.0).contains(&similarity_weight) {
			return Err(Error::validation(
				"similarity_weight",
				"similarity_weight must be in the range 0.0-1.0.",
			));
		}

		let retrieval_multiplier =
			req.retrieval_multiplier.unwrap_or(cfg.default_retrieval_multiplier);

		if retrieval_multiplier == 0 || retrieval_multiplier > cfg.max_retrieval_multiplier {
			return Err(Error::validation(
				"retrieval_multiplier",
				format!(
					"retrieval_multiplier must be in the range 1-{}.",
					cfg.max_retrieval_multiplier
				),
			));
		}

		let use_reranking = req.use_evaluation_reranking.unwrap_or(cfg.use_evaluation_reranking);
		let weights = ScoringWeights { similarity_weight, retrieval_multiplier };
		let query = resolve_query_text(&req)?;
		let results = self.retrieve(&query, &req.user_id, k, &weights, use_reranking).await?;

		Ok(RetrievalResponse { query, results })
	}

	/// Fetches the nearest records visible to `tenant_id` and ranks the top `k`.
	///
	/// With reranking, `k * retrieval_multiplier` candidates are fetched so quality can promote
	/// records outside the raw top `k`.
	pub async fn retrieve(
		&self,
		query_text: &str,
		tenant_id: &str,
		k: usize,
		weights: &ScoringWeights,
		use_reranking: bool,
	) -> Result<Vec<RankedReference>> {
		let query_text = query_text.trim();

		if query_text.is_empty() {
			return Err(Error::InvalidQuery { message: "Query text is empty.".to_string() });
		}

		let scope = self.access_scope(tenant_id)?;

		if k == 0 {
			return Ok(Vec::new());
		}

		let fetch = if use_reranking {
			k.saturating_mul(weights.retrieval_multiplier.max(1) as usize)
		} else {
			k
		};
		let vector = self.embed_text(query_text, Phase::Retrieval).await?;
		let hits = self
			.bounded(Phase::Retrieval, Stage::VectorStore, self.store.search(vector, fetch, &scope))
			.await?;
		let hit_count = hits.len();
		let results = crate::rerank::rerank(hits, k, weights, use_reranking);

		tracing::info!(
			fetch,
			hit_count,
			returned = results.len(),
			use_reranking,
			"Retrieval finished."
		);

		Ok(results)
	}

	/// Records a query may see. A blank tenant sees public records only when
	/// `retrieval.allow_anonymous_public` is set.
	pub fn access_scope(&self, tenant_id: &str) -> Result<AccessScope> {
		let tenant_id = tenant_id.trim();

		if !tenant_id.is_empty() {
			return Ok(AccessScope::Tenant(tenant_id.to_string()));
		}
		if self.cfg.retrieval.allow_anonymous_public {
			return Ok(AccessScope::PublicOnly);
		}

		Err(Error::UnauthorizedQuery { message: "user_id is required.".to_string() })
	}
}

/// Picks the query text: an explicit `query`, else the bean of `record`, else `bean`.
pub fn resolve_query_text(req: &RetrievalRequest) -> Result<String> {
	if let Some(query) = req.query.as_deref().map(str::trim).filter(|query| !query.is_empty()) {
		return Ok(query.to_string());
	}

	let Some(source) = query_record(req) else {
		return Err(Error::InvalidQuery {
			message: "Provide a query, a record, or a bean.".to_string(),
		});
	};
	let text = codec::bean_query_text(&source);
	let text = if text.is_empty() { codec::bean_fallback_text(&source) } else { text };

	if text.is_empty() {
		return Err(Error::InvalidQuery { message: "Bean has no descriptive fields.".to_string() });
	}

	Ok(text)
}

fn query_record(req: &RetrievalRequest) -> Option<Value> {
	if let Some(record) = req.record.as_ref().filter(|record| carries_bean(record)) {
		return Some(record.clone());
	}
	if let Some(bean) = req.bean.as_ref().filter(|bean| !bean.is_null()) {
		if carries_bean(bean) {
			return Some(bean.clone());
		}

		return Some(serde_json::json!({ "bean": bean }));
	}

	req.record.clone()
}

fn carries_bean(value: &Value) -> bool {
	let Some(object) = value.as_object() else { return false };

	object.get("bean").is_some_and(|bean| !bean.is_null())
		|| object.keys().any(|key| key.starts_with("bean."))
}

use std::cmp::Ordering;

use serde::Serialize;
use serde_json::{Map, Value};

use drip_domain::{
	codec::{self, LIST_PREFIXES},
	quality,
};
use drip_storage::RawHit;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
	/// Share of the combined score taken by vector similarity, in `[0, 1]`.
	pub similarity_weight: f64,
	/// Candidate pool size as a multiple of `k` when reranking.
	pub retrieval_multiplier: u32,
}
impl ScoringWeights {
	pub fn from_config(cfg: &drip_config::Retrieval) -> Self {
		Self {
			similarity_weight: cfg.default_similarity_weight,
			retrieval_multiplier: cfg.default_retrieval_multiplier,
		}
	}

	pub fn evaluation_weight(&self) -> f64 {
		1.0 - self.similarity_weight
	}
}
impl Default for ScoringWeights {
	fn default() -> Self {
		Self { similarity_weight: 0.7, retrieval_multiplier: 3 }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedReference {
	pub rank: usize,
	pub id: String,
	pub distance: f64,
	pub bean_text: String,
	pub brewing: Value,
	pub evaluation: Option<Value>,
	pub combined_score: Option<f64>,
}

struct Candidate {
	hit: RawHit,
	brewing: Value,
	evaluation: Option<Value>,
	combined_score: Option<f64>,
}
impl Candidate {
	fn decode(hit: RawHit) -> Self {
		let brewing = codec::reconstruct_section(&hit.metadata, "brewing", &LIST_PREFIXES)
			.unwrap_or_else(|| Value::Object(Map::new()));
		let evaluation = codec::reconstruct_section(&hit.metadata, "evaluation", &LIST_PREFIXES);

		Self { hit, brewing, evaluation, combined_score: None }
	}

	fn into_reference(self, rank: usize) -> RankedReference {
		RankedReference {
			rank,
			id: self.hit.id,
			distance: self.hit.distance,
			bean_text: self.hit.text,
			brewing: self.brewing,
			evaluation: self.evaluation,
			combined_score: self.combined_score,
		}
	}
}

/// Orders store hits into at most `k` ranked references.
///
/// Without reranking the store order is kept. With reranking every hit is scored as
/// `w * similarity + (1 - w) * quality`, where `similarity = 1 / (1 + distance)`, and the hits are
/// stably sorted by that score, highest first.
pub fn rerank(
	hits: Vec<RawHit>,
	k: usize,
	weights: &ScoringWeights,
	use_reranking: bool,
) -> Vec<RankedReference> {
	if k == 0 {
		return Vec::new();
	}

	let mut candidates: Vec<Candidate> = if use_reranking {
		hits.into_iter().map(Candidate::decode).collect()
	} else {
		hits.into_iter().take(k).map(Candidate::decode).collect()
	};

	if use_reranking {
		for candidate in &mut candidates {
			let similarity = 1.0 / (1.0 + candidate.hit.distance.max(0.0));
			let quality = quality::score(candidate.evaluation.as_ref());

			candidate.combined_score = Some(
				weights.similarity_weight * similarity + weights.evaluation_weight() * quality,
			);
		}

		// `sort_by` is stable, so equal scores keep store order.
		candidates.sort_by(|a, b| cmp_desc(a.combined_score, b.combined_score));
		candidates.truncate(k);
	}

	candidates
		.into_iter()
		.enumerate()
		.map(|(index, candidate)| candidate.into_reference(index + 1))
		.collect()
}

fn cmp_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
	let a = a.unwrap_or(f64::NEG_INFINITY);
	let b = b.unwrap_or(f64::NEG_INFINITY);

	b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

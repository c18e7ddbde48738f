use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Body of an OpenAI-compatible `/embeddings` call.
#[derive(Debug, Serialize)]
pub struct EmbeddingRequest<'a> {
	pub model: &'a str,
	pub input: &'a [String],
	pub dimensions: u32,
}
impl<'a> EmbeddingRequest<'a> {
	pub fn new(cfg: &'a drip_config::EmbeddingProviderConfig, texts: &'a [String]) -> Self {
		Self { model: &cfg.model, input: texts, dimensions: cfg.dimensions }
	}
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingResponse {
	pub data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingItem {
	/// Position of the input this vector belongs to. Some servers omit it and answer in order.
	#[serde(default)]
	pub index: Option<usize>,
	pub embedding: Vec<f32>,
}

/// Embeds bean texts, returning one vector per text in input order.
pub async fn embed(
	cfg: &drip_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let response: EmbeddingResponse = client
		.post(format!("{}{}", cfg.api_base, cfg.path))
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&EmbeddingRequest::new(cfg, texts))
		.send()
		.await?
		.error_for_status()?
		.json()
		.await?;

	order_vectors(response, texts.len(), cfg.dimensions as usize)
}

/// Places each returned vector at its input position. Every input must be answered exactly once
/// with a vector of `dimensions` floats.
pub fn order_vectors(
	response: EmbeddingResponse,
	inputs: usize,
	dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
	let mut slots: Vec<Option<Vec<f32>>> = vec![None; inputs];

	for (position, item) in response.data.into_iter().enumerate() {
		let index = item.index.unwrap_or(position);

		if item.embedding.len() != dimensions {
			return Err(eyre::eyre!(
				"Embedding {index} has {} dimensions, expected {dimensions}.",
				item.embedding.len()
			));
		}

		match slots.get_mut(index) {
			Some(slot @ None) => *slot = Some(item.embedding),
			Some(Some(_)) => return Err(eyre::eyre!("Embedding {index} was returned twice.")),
			None =>
				return Err(eyre::eyre!(
					"Embedding index {index} is out of range for {inputs} inputs."
				)),
		}
	}

	slots
		.into_iter()
		.enumerate()
		.map(|(index, slot)| {
			slot.ok_or_else(|| eyre::eyre!("No embedding returned for input {index}."))
		})
		.collect()
}

mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Providers, Qdrant, Retrieval, Seed, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => {
			Error::ParseConfig { path: path.to_path_buf(), source }
		},
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if !matches!(cfg.storage.backend.as_str(), "qdrant" | "memory") {
		return Err(Error::Validation {
			message: "storage.backend must be one of qdrant or memory.".to_string(),
		});
	}
	if cfg.storage.backend == "qdrant" && cfg.storage.qdrant.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider embedding api_key must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}

	validate_retrieval(&cfg.retrieval)?;

	if let Some(seed) = cfg.seed.as_ref() {
		if seed.path.as_os_str().is_empty() {
			return Err(Error::Validation { message: "seed.path must be non-empty.".to_string() });
		}
		if seed.owner.trim().is_empty() {
			return Err(Error::Validation {
				message: "seed.owner must be non-empty.".to_string(),
			});
		}
	}

	Ok(())
}

fn validate_retrieval(retrieval: &types::Retrieval) -> Result<()> {
	if retrieval.max_k == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_k must be greater than zero.".to_string(),
		});
	}
	if retrieval.default_k == 0 || retrieval.default_k > retrieval.max_k {
		return Err(Error::Validation {
			message: "retrieval.default_k must be in the range 1-retrieval.max_k.".to_string(),
		});
	}
	if !retrieval.default_similarity_weight.is_finite() {
		return Err(Error::Validation {
			message: "retrieval.default_similarity_weight must be a finite number.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&retrieval.default_similarity_weight) {
		return Err(Error::Validation {
			message: "retrieval.default_similarity_weight must be in the range 0.0-1.0."
				.to_string(),
		});
	}
	if retrieval.max_retrieval_multiplier == 0 {
		return Err(Error::Validation {
			message: "retrieval.max_retrieval_multiplier must be greater than zero.".to_string(),
		});
	}
	if retrieval.default_retrieval_multiplier == 0
		|| retrieval.default_retrieval_multiplier > retrieval.max_retrieval_multiplier
	{
		return Err(Error::Validation {
			message: "retrieval.default_retrieval_multiplier must be in the range 1-retrieval.max_retrieval_multiplier."
				.to_string(),
		});
	}
	if retrieval.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "retrieval.timeout_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.storage.backend = cfg.storage.backend.trim().to_ascii_lowercase();

	if let Some(seed) = cfg.seed.as_mut() {
		seed.owner = seed.owner.trim().to_string();
	}
}

use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// External dependency that failed during retrieval or ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
	Embedding,
	VectorStore,
}
impl Stage {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Embedding => "embedding",
			Self::VectorStore => "vector_store",
		}
	}
}
impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid query: {message}")]
	InvalidQuery { message: String },
	#[error("Unauthorized query: {message}")]
	UnauthorizedQuery { message: String },
	#[error("Invalid {field}: {message}")]
	Validation { field: String, message: String },
	#[error("Retrieval unavailable at {stage}: {message}")]
	RetrievalUnavailable { stage: Stage, message: String },
	#[error("Ingestion unavailable at {stage}: {message}")]
	IngestionUnavailable { stage: Stage, message: String },
}
impl Error {
	pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
		Self::Validation { field: field.to_string(), message: message.into() }
	}
}

pub mod access;
pub mod memory;
pub mod qdrant;

mod error;

pub use access::{AccessScope, Visibility};
pub use error::Error;

use drip_domain::FlatMap;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Metadata key holding the owning tenant.
pub const TENANT_KEY: &str = "tenant_id";
/// Metadata key holding the record visibility.
pub const VISIBILITY_KEY: &str = "visibility";
/// Payload key holding the caller-facing record id.
pub const RECORD_ID_KEY: &str = "record_id";
/// Payload key holding the text the vector was computed from.
pub const TEXT_KEY: &str = "bean_text";

/// A record ready for the index. Points are keyed by `(tenant_id, id)`, so two tenants using
/// the same record id never share a point.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPoint {
	pub tenant_id: String,
	pub id: String,
	pub text: String,
	pub vector: Vec<f32>,
	pub metadata: FlatMap,
}

/// A nearest-neighbor hit. `distance` is `1 - cosine similarity`, clamped at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct RawHit {
	pub id: String,
	pub distance: f64,
	pub text: String,
	pub metadata: FlatMap,
}

pub fn cosine_distance(score: f32) -> f64 {
	(1.0 - f64::from(score)).max(0.0)
}

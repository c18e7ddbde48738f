use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use drip_domain::{FlatMap, Scalar, codec, record_id};
use drip_storage::{RECORD_ID_KEY, StoredPoint, TENANT_KEY, TEXT_KEY, VISIBILITY_KEY, Visibility};

use crate::{DripService, Error, Phase, Result, Stage};

pub const INGESTED_AT_KEY: &str = "ingested_at";
pub const POURS_SUMMARY_KEY: &str = "brewing.pours_str";

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
	#[serde(default)]
	pub user_id: String,
	pub id: String,
	pub text: String,
	#[serde(default)]
	pub meta: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeedbackResponse {
	pub status: &'static str,
	pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
	pub ingested: Vec<String>,
	pub skipped: usize,
}

impl DripService {
	/// Flattens, tags, embeds and upserts one brew record. Returns its record id.
	///
	/// Points are keyed by tenant and record id. Re-ingesting a record for the same tenant
	/// overwrites its point; another tenant's record with the same id is left alone.
	pub async fn ingest_record(
		&self,
		record: &Value,
		tenant_id: &str,
		visibility: Visibility,
	) -> Result<String> {
		let tenant_id = tenant_id.trim();

		if tenant_id.is_empty() {
			return Err(Error::validation("tenant_id", "tenant_id must be non-empty."));
		}

		let text = codec::bean_query_text(record);
		let text = if text.is_empty() { codec::bean_fallback_text(record) } else { text };

		if text.is_empty() {
			return Err(Error::validation("bean", "Record has no bean fields to index."));
		}

		let mut metadata = codec::flatten(record);

		if let Some(summary) = codec::pours_summary(&metadata) {
			metadata.insert(POURS_SUMMARY_KEY.to_string(), Scalar::String(summary));
		}

		let id = record_id::derive(&metadata, &text);

		tag(&mut metadata, tenant_id, visibility);
		self.store_point(StoredPoint {
			tenant_id: tenant_id.to_string(),
			id: id.clone(),
			text,
			vector: Vec::new(),
			metadata,
		})
		.await?;

		tracing::info!(record_id = %id, %tenant_id, %visibility, "Record ingested.");

		Ok(id)
	}

	/// Stores client-supplied feedback as a private record of `user_id`. Reusing an id only
	/// replaces that user's own feedback.
	pub async fn ingest_feedback(&self, req: FeedbackRequest) -> Result<FeedbackResponse> {
		let user_id = req.user_id.trim();

		if user_id.is_empty() {
			return Err(Error::UnauthorizedQuery { message: "user_id is required.".to_string() });
		}

		let id = req.id.trim();

		if id.is_empty() {
			return Err(Error::validation("id", "id must be non-empty."));
		}
		if req.text.trim().is_empty() {
			return Err(Error::validation("text", "text must be non-empty."));
		}

		let mut metadata = match &req.meta {
			Value::Null => FlatMap::new(),
			Value::Object(_) => codec::flatten(&req.meta),
			_ => return Err(Error::validation("meta", "meta must be a JSON object.")),
		};

		tag(&mut metadata, user_id, Visibility::Private);
		self.store_point(StoredPoint {
			tenant_id: user_id.to_string(),
			id: id.to_string(),
			text: req.text.clone(),
			vector: Vec::new(),
			metadata,
		})
		.await?;

		tracing::info!(record_id = %id, tenant_id = %user_id, "Feedback ingested.");

		Ok(FeedbackResponse { status: "ok", id: id.to_string() })
	}

	/// Ingests records for `tenant_id`, skipping records that fail validation. Dependency
	/// failures abort the batch.
	pub async fn ingest_batch(
		&self,
		records: &[Value],
		tenant_id: &str,
		visibility: Visibility,
	) -> Result<IngestReport> {
		let mut report = IngestReport::default();

		for (index, record) in records.iter().enumerate() {
			match self.ingest_record(record, tenant_id, visibility).await {
				Ok(id) => report.ingested.push(id),
				Err(Error::Validation { field, message }) => {
					tracing::warn!(index, %field, %message, "Skipping record.");

					report.skipped += 1;
				},
				Err(err) => return Err(err),
			}
		}

		Ok(report)
	}

	/// Loads shared reference records as public data owned by `owner`. Any `user_id` carried by
	/// a record is dropped.
	pub async fn seed_public(&self, records: &[Value], owner: &str) -> Result<IngestReport> {
		let records = records
			.iter()
			.cloned()
			.map(|mut record| {
				if let Some(object) = record.as_object_mut() {
					object.remove("user_id");
				}

				record
			})
			.collect::<Vec<_>>();
		let report = self.ingest_batch(&records, owner, Visibility::Public).await?;

		tracing::info!(
			ingested = report.ingested.len(),
			skipped = report.skipped,
			%owner,
			"Public reference data seeded."
		);

		Ok(report)
	}

	async fn store_point(&self, mut point: StoredPoint) -> Result<()> {
		point.vector = self.embed_text(&point.text, Phase::Ingestion).await?;

		self.bounded(Phase::Ingestion, Stage::VectorStore, self.store.upsert(point)).await
	}
}

/// Overwrites ownership keys and drops keys the store reserves for itself.
fn tag(metadata: &mut FlatMap, tenant_id: &str, visibility: Visibility) {
	metadata.remove(RECORD_ID_KEY);
	metadata.remove(TEXT_KEY);
	metadata.insert(TENANT_KEY.to_string(), Scalar::from(tenant_id));
	metadata.insert(VISIBILITY_KEY.to_string(), Scalar::from(visibility.as_str()));

	if let Ok(ingested_at) = OffsetDateTime::now_utc().format(&Rfc3339) {
		metadata.insert(INGESTED_AT_KEY.to_string(), Scalar::String(ingested_at));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tag_overwrites_client_ownership() {
		let mut metadata = FlatMap::new();

		metadata.insert(TENANT_KEY.to_string(), Scalar::from("mallory"));
		metadata.insert(VISIBILITY_KEY.to_string(), Scalar::from("public"));
		metadata.insert(TEXT_KEY.to_string(), Scalar::from("spoofed"));

		tag(&mut metadata, "alice", Visibility::Private);

		assert_eq!(metadata.get(TENANT_KEY), Some(&Scalar::from("alice")));
		assert_eq!(metadata.get(VISIBILITY_KEY), Some(&Scalar::from("private")));
		assert!(!metadata.contains_key(TEXT_KEY));
		assert!(matches!(metadata.get(INGESTED_AT_KEY), Some(Scalar::String(_))));
	}
}

use std::collections::HashMap;

use qdrant_client::{
	client::Payload,
	qdrant::{
		Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance, FieldType,
		Filter, PointId, PointStruct, Query, QueryPointsBuilder, ScoredPoint, UpsertPointsBuilder,
		Value, VectorParamsBuilder, point_id::PointIdOptions, value::Kind,
	},
};
use uuid::Uuid;

use drip_domain::{FlatMap, Scalar};

use crate::{
	AccessScope, Error, RECORD_ID_KEY, RawHit, Result, StoredPoint, TENANT_KEY, TEXT_KEY,
	VISIBILITY_KEY, Visibility,
};

/// Namespace for deriving Qdrant point ids from owner and record id.
const POINT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_2a8e_4d3b_5c7a_9e0f_1b2c_3d4e_5f60);

pub struct QdrantStore {
	pub client: qdrant_client::Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &drip_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	/// Creates the collection and the keyword indexes used by the access filter if missing.
	pub async fn ensure_collection(&self) -> Result<()> {
		if self.client.collection_exists(self.collection.clone()).await? {
			return Ok(());
		}

		self.client
			.create_collection(
				CreateCollectionBuilder::new(self.collection.clone()).vectors_config(
					VectorParamsBuilder::new(self.vector_dim.into(), Distance::Cosine),
				),
			)
			.await?;

		for key in [TENANT_KEY, VISIBILITY_KEY] {
			self.client
				.create_field_index(
					CreateFieldIndexCollectionBuilder::new(
						self.collection.clone(),
						key,
						FieldType::Keyword,
					)
					.wait(true),
				)
				.await?;
		}

		tracing::info!(collection = %self.collection, "Qdrant collection created.");

		Ok(())
	}

	pub async fn upsert(&self, point: StoredPoint) -> Result<()> {
		if point.vector.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Vector has {} dimensions, collection expects {}.",
				point.vector.len(),
				self.vector_dim
			)));
		}

		let point_id = point_id(&point.tenant_id, &point.id).to_string();
		let payload = payload_from_point(&point);
		let upsert = UpsertPointsBuilder::new(
			self.collection.clone(),
			vec![PointStruct::new(point_id, point.vector, payload)],
		)
		.wait(true);

		self.client.upsert_points(upsert).await?;

		Ok(())
	}

	pub async fn search(
		&self,
		vector: Vec<f32>,
		limit: u64,
		scope: &AccessScope,
	) -> Result<Vec<RawHit>> {
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.filter(access_filter(scope))
			.limit(limit)
			.with_payload(true);
		let response = self.client.query(search).await?;

		Ok(response.result.into_iter().map(hit_from_scored).collect())
	}
}

/// Maps an owner and record id onto the UUID point id Qdrant requires. Re-ingesting a record
/// for the same owner overwrites its point; other owners get their own point.
pub fn point_id(tenant_id: &str, record_id: &str) -> Uuid {
	Uuid::new_v5(&POINT_NAMESPACE, format!("{tenant_id}/{record_id}").as_bytes())
}

pub fn access_filter(scope: &AccessScope) -> Filter {
	let public = Condition::matches(VISIBILITY_KEY, Visibility::Public.as_str().to_string());

	match scope {
		AccessScope::PublicOnly => Filter::must([public]),
		AccessScope::Tenant(tenant_id) =>
			Filter::should([public, Condition::matches(TENANT_KEY, tenant_id.clone())]),
	}
}

fn payload_from_point(point: &StoredPoint) -> Payload {
	Payload::from(payload_map(point))
}

fn payload_map(point: &StoredPoint) -> HashMap<String, Value> {
	let mut payload_map: HashMap<String, Value> = point
		.metadata
		.iter()
		.map(|(key, scalar)| (key.clone(), Value::from(scalar.to_value())))
		.collect();

	payload_map.insert(TENANT_KEY.to_string(), Value::from(point.tenant_id.clone()));
	payload_map.insert(RECORD_ID_KEY.to_string(), Value::from(point.id.clone()));
	payload_map.insert(TEXT_KEY.to_string(), Value::from(point.text.clone()));

	payload_map
}

fn hit_from_scored(point: ScoredPoint) -> RawHit {
	let mut metadata = FlatMap::new();
	let mut record_id = None;
	let mut text = String::new();

	for (key, value) in point.payload {
		let Some(scalar) = scalar_from_value(value) else { continue };

		match key.as_str() {
			RECORD_ID_KEY => record_id = Some(scalar.to_string()),
			TEXT_KEY => text = scalar.to_string(),
			_ => {
				metadata.insert(key, scalar);
			},
		}
	}

	let id = record_id
		.or_else(|| point.id.as_ref().and_then(point_id_text))
		.unwrap_or_default();

	RawHit { id, distance: crate::cosine_distance(point.score), text, metadata }
}

fn point_id_text(point_id: &PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		Some(PointIdOptions::Num(id)) => Some(id.to_string()),
		None => None,
	}
}

fn scalar_from_value(value: Value) -> Option<Scalar> {
	match value.kind? {
		Kind::NullValue(_) => Some(Scalar::Null),
		Kind::BoolValue(flag) => Some(Scalar::Bool(flag)),
		Kind::IntegerValue(number) => Some(Scalar::from(number)),
		Kind::DoubleValue(number) =>
			Some(serde_json::Number::from_f64(number).map(Scalar::Number).unwrap_or(Scalar::Null)),
		Kind::StringValue(text) => Some(Scalar::String(text)),
		// Flat payloads never hold nested values.
		Kind::ListValue(_) | Kind::StructValue(_) => None,
	}
}

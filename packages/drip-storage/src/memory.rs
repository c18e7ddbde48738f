use std::{cmp::Ordering, collections::HashMap};

use tokio::sync::RwLock;

use crate::{AccessScope, Error, RawHit, Result, StoredPoint};

/// Process-local vector store with the same access and distance rules as [`crate::qdrant`].
/// Used by the `memory` storage backend and by tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
	points: RwLock<HashMap<(String, String), StoredPoint>>,
}
impl InMemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn len(&self) -> usize {
		self.points.read().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.points.read().await.is_empty()
	}

	pub async fn get(&self, tenant_id: &str, id: &str) -> Option<StoredPoint> {
		self.points.read().await.get(&(tenant_id.to_string(), id.to_string())).cloned()
	}

	pub async fn upsert(&self, point: StoredPoint) -> Result<()> {
		let mut points = self.points.write().await;
		let key = (point.tenant_id.clone(), point.id.clone());

		if let Some((_, other)) = points.iter().find(|(other_key, other)| {
			**other_key != key && other.vector.len() != point.vector.len()
		}) {
			return Err(Error::InvalidArgument(format!(
				"Vector has {} dimensions, store holds {}.",
				point.vector.len(),
				other.vector.len()
			)));
		}

		points.insert(key, point);

		Ok(())
	}

	/// Nearest points by cosine distance. Ties break on record id, then owner, so repeated queries
	/// agree.
	pub async fn search(
		&self,
		vector: &[f32],
		limit: usize,
		scope: &AccessScope,
	) -> Result<Vec<RawHit>> {
		let points = self.points.read().await;
		let mut hits: Vec<(&str, RawHit)> = points
			.values()
			.filter(|point| scope.matches(&point.metadata))
			.map(|point| {
				let hit = RawHit {
					id: point.id.clone(),
					distance: crate::cosine_distance(cosine_similarity(&point.vector, vector)),
					text: point.text.clone(),
					metadata: point.metadata.clone(),
				};

				(point.tenant_id.as_str(), hit)
			})
			.collect();

		hits.sort_by(|(a_owner, a), (b_owner, b)| {
			a.distance
				.partial_cmp(&b.distance)
				.unwrap_or(Ordering::Equal)
				.then_with(|| a.id.cmp(&b.id))
				.then_with(|| a_owner.cmp(b_owner))
		});
		hits.truncate(limit);

		Ok(hits.into_iter().map(|(_, hit)| hit).collect())
	}
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
	let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
	let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a * norm_b)
}

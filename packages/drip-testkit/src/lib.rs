mod error;

pub use error::{Error, Result};

use std::{collections::HashSet, env, sync::Mutex, thread, time::Duration};

use qdrant_client::Qdrant;
use tokio::{runtime::Builder, time};
use uuid::Uuid;

pub const QDRANT_URL_ENV: &str = "DRIP_QDRANT_URL";

/// Hands out uniquely named Qdrant collections for one test and deletes them afterwards.
pub struct TestCollections {
	run_id: String,
	qdrant_url: String,
	cleaned: bool,
	collections: Mutex<HashSet<String>>,
}
impl TestCollections {
	pub fn new(qdrant_url: &str) -> Self {
		Self {
			run_id: format!("drip_test_{}", Uuid::new_v4().simple()),
			qdrant_url: qdrant_url.to_string(),
			cleaned: false,
			collections: Mutex::new(HashSet::new()),
		}
	}

	pub fn qdrant_url(&self) -> &str {
		&self.qdrant_url
	}

	pub fn collection_name(&self, prefix: &str) -> String {
		let collection = format!("{prefix}_{}", self.run_id);
		let mut tracked = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		tracked.insert(collection.clone());

		collection
	}

	/// Storage settings pointing at a fresh tracked collection.
	pub fn qdrant_config(&self, prefix: &str, vector_dim: u32) -> drip_config::Qdrant {
		drip_config::Qdrant {
			url: self.qdrant_url.clone(),
			collection: self.collection_name(prefix),
			vector_dim,
		}
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		let collections = self.tracked();

		cleanup_qdrant_collections(&self.qdrant_url, &collections).await?;

		self.cleaned = true;

		Ok(())
	}

	fn tracked(&self) -> Vec<String> {
		self.collections.lock().unwrap_or_else(|err| err.into_inner()).iter().cloned().collect()
	}
}
impl Drop for TestCollections {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let qdrant_url = self.qdrant_url.clone();
		let collections = self.tracked();

		if collections.is_empty() {
			return;
		}

		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test Qdrant cleanup failed: {err}.");

					return;
				},
			};

			let cleanup = cleanup_qdrant_collections(&qdrant_url, &collections);

			if let Err(err) = runtime.block_on(cleanup) {
				eprintln!("Test Qdrant cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

pub fn env_qdrant_url() -> Option<String> {
	env::var(QDRANT_URL_ENV).ok().filter(|url| !url.trim().is_empty())
}

async fn cleanup_qdrant_collections(qdrant_url: &str, collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let client = Qdrant::from_url(qdrant_url)
		.build()
		.map_err(|err| Error::Message(format!("Failed to build Qdrant client: {err}.")))?;
	let max_attempts = 6;
	let mut remaining = collections.iter().cloned().collect::<HashSet<_>>();
	let mut backoff = Duration::from_millis(100);

	for attempt in 1..=max_attempts {
		let existing = time::timeout(Duration::from_secs(10), client.list_collections())
			.await
			.map_err(|_| Error::Message("Qdrant list_collections timed out.".to_string()))?
			.map_err(|err| Error::Message(format!("Failed to list Qdrant collections: {err}.")))?;
		let existing = existing.collections.into_iter().map(|c| c.name).collect::<HashSet<_>>();

		remaining.retain(|collection| existing.contains(collection));

		if remaining.is_empty() {
			return Ok(());
		}

		for collection in remaining.iter().cloned().collect::<Vec<_>>() {
			let deleted =
				time::timeout(Duration::from_secs(10), client.delete_collection(collection.clone()))
					.await;
			let failure = match deleted {
				Ok(Ok(_)) => None,
				Ok(Err(err)) => Some(err.to_string()),
				Err(_) => Some("timed out".to_string()),
			};

			if let Some(reason) = failure
				&& attempt == max_attempts
			{
				return Err(Error::Message(format!(
					"Failed to delete Qdrant collection {collection:?} after {attempt} attempts: \
					 {reason}."
				)));
			}
		}

		time::sleep(backoff).await;

		backoff = backoff.saturating_mul(2).min(Duration::from_secs(2));
	}

	Ok(())
}

use std::sync::Arc;

use drip_service::DripService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<DripService>,
}
impl AppState {
	pub async fn new(config: drip_config::Config) -> color_eyre::Result<Self> {
		let service = DripService::connect(config).await?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: DripService) -> Self {
		Self { service: Arc::new(service) }
	}
}

use std::sync::Arc;

use marquee_service::MarqueeService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<MarqueeService>,
}
impl AppState {
	pub async fn new(config: &marquee_config::Config) -> color_eyre::Result<Self> {
		let service = MarqueeService::connect(config).await?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: MarqueeService) -> Self {
		Self { service: Arc::new(service) }
	}
}

use std::sync::Arc;

use bandi_service::BandiService;
use bandi_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<BandiService>,
}
impl AppState {
	pub async fn new(config: bandi_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let service = BandiService::new(config, db);

		Ok(Self { service: Arc::new(service) })
	}
}

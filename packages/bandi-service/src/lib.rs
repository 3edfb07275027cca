pub mod enrich;
pub mod ingest;
pub mod query;
pub mod regions;
pub mod time_serde;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::{Map, Value};

use bandi_config::{Config, ProviderConfig};
use bandi_providers::EnrichmentRequest;
use bandi_storage::db::Db;

pub use enrich::{BatchReport, EnrichmentWindow, ItemFailure};
pub use ingest::{Candidate, IngestOutcome};
pub use query::{QueryRequest, QueryResponse, RecordView};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One enrichment capability endpoint. The scheduler walks the configured
/// provider list in order and is agnostic to how many entries exist or what
/// sits behind them.
pub trait EnrichmentProvider
where
	Self: Send + Sync,
{
	fn enrich<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		req: &'a EnrichmentRequest,
	) -> BoxFuture<'a, Result<Map<String, Value>, bandi_providers::Error>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	NotFound { message: String },
	Storage { message: String },
}

struct DefaultProvider;

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::NotFound { message } => write!(f, "Not found: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<bandi_storage::Error> for ServiceError {
	fn from(err: bandi_storage::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl EnrichmentProvider for DefaultProvider {
	fn enrich<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		req: &'a EnrichmentRequest,
	) -> BoxFuture<'a, Result<Map<String, Value>, bandi_providers::Error>> {
		Box::pin(bandi_providers::enrich::enrich(cfg, req))
	}
}

pub struct BandiService {
	pub cfg: Config,
	pub db: Db,
	pub provider: Arc<dyn EnrichmentProvider>,
}
impl BandiService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, provider: Arc::new(DefaultProvider) }
	}

	pub fn with_provider(cfg: Config, db: Db, provider: Arc<dyn EnrichmentProvider>) -> Self {
		Self { cfg, db, provider }
	}
}

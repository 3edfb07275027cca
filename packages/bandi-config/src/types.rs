use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Vec<ProviderConfig>,
	pub enrichment: Enrichment,
	pub query: Query,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// One enrichment capability endpoint. Providers are tried in declaration
/// order; the first entry is the primary, the rest are fallbacks.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Enrichment {
	pub batch_size: u32,
	pub concurrency_limit: u32,
	/// Minimum interval between provider call dispatches, shared across the
	/// whole batch run. This bounds requests-per-minute independently of
	/// `concurrency_limit`.
	pub rate_interval_ms: u64,
	/// Total attempts per provider on transient errors, first attempt
	/// included.
	pub max_retries: u32,
	pub base_backoff_ms: u64,
	pub max_backoff_ms: u64,
	pub max_jitter_ms: u64,
	pub max_content_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Query {
	pub default_page_size: u32,
	pub max_page_size: u32,
}

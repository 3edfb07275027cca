use serde_json::Value;
use time::OffsetDateTime;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GrantRecord {
	pub id: i64,
	pub source_url: String,
	pub identity_hash: String,
	pub title: String,
	pub raw_content: String,
	pub source_name: String,
	pub status: String,
	pub attributes: Value,
	pub marketing_summary: Option<String>,
	pub last_error: Option<String>,
	pub ingested_at: OffsetDateTime,
}

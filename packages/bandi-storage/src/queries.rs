use serde_json::Value;
use sqlx::{PgPool, Postgres, Transaction};

use crate::{Result, models::GrantRecord};

const RECORD_COLUMNS: &str = "\
id, source_url, identity_hash, title, raw_content, source_name, status, attributes, \
marketing_summary, last_error, ingested_at";

/// Insert a new record, letting the unique index on `identity_hash` arbitrate
/// concurrent submissions. Returns `None` when another writer won the race.
pub async fn insert_record(
	pool: &PgPool,
	source_url: &str,
	identity_hash: &str,
	title: &str,
	raw_content: &str,
	source_name: &str,
	status: &str,
) -> Result<Option<i64>> {
	let id = sqlx::query_scalar::<_, i64>(
		"\
INSERT INTO grant_records (source_url, identity_hash, title, raw_content, source_name, status)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (identity_hash) DO NOTHING
RETURNING id",
	)
	.bind(source_url)
	.bind(identity_hash)
	.bind(title)
	.bind(raw_content)
	.bind(source_name)
	.bind(status)
	.fetch_optional(pool)
	.await?;

	Ok(id)
}

pub async fn find_by_identity_hash(pool: &PgPool, hash: &str) -> Result<Option<GrantRecord>> {
	let record = sqlx::query_as::<_, GrantRecord>(&format!(
		"SELECT {RECORD_COLUMNS} FROM grant_records WHERE identity_hash = $1"
	))
	.bind(hash)
	.fetch_optional(pool)
	.await?;

	Ok(record)
}

pub async fn fetch_by_id(pool: &PgPool, id: i64) -> Result<Option<GrantRecord>> {
	let record = sqlx::query_as::<_, GrantRecord>(&format!(
		"SELECT {RECORD_COLUMNS} FROM grant_records WHERE id = $1"
	))
	.bind(id)
	.fetch_optional(pool)
	.await?;

	Ok(record)
}

/// Title repair for placeholder collisions; the only permitted post-creation
/// write to an ingested field.
pub async fn repair_title(pool: &PgPool, id: i64, title: &str) -> Result<()> {
	sqlx::query("UPDATE grant_records SET title = $1 WHERE id = $2")
		.bind(title)
		.bind(id)
		.execute(pool)
		.await?;

	Ok(())
}

pub async fn fetch_status_window(
	pool: &PgPool,
	status: &str,
	limit: i64,
) -> Result<Vec<GrantRecord>> {
	let records = sqlx::query_as::<_, GrantRecord>(&format!(
		"SELECT {RECORD_COLUMNS} FROM grant_records WHERE status = $1 ORDER BY id LIMIT $2"
	))
	.bind(status)
	.bind(limit)
	.fetch_all(pool)
	.await?;

	Ok(records)
}

/// Records whose enrichment never produced the core attribute set, whatever
/// their status.
pub async fn fetch_missing_attributes_window(
	pool: &PgPool,
	limit: i64,
) -> Result<Vec<GrantRecord>> {
	let records = sqlx::query_as::<_, GrantRecord>(&format!(
		"\
SELECT {RECORD_COLUMNS}
FROM grant_records
WHERE attributes -> 'regions' IS NULL
ORDER BY id
LIMIT $1"
	))
	.bind(limit)
	.fetch_all(pool)
	.await?;

	Ok(records)
}

/// Status-filtered fetch for the query engine. Ranking happens in the
/// service over the resolved attributes, so ordering here is irrelevant.
pub async fn fetch_for_query(pool: &PgPool, status: Option<&str>) -> Result<Vec<GrantRecord>> {
	let mut builder = sqlx::QueryBuilder::<Postgres>::new(format!(
		"SELECT {RECORD_COLUMNS} FROM grant_records"
	));

	if let Some(status) = status {
		builder.push(" WHERE status = ");
		builder.push_bind(status);
	}

	let records: Vec<GrantRecord> = builder.build_query_as().fetch_all(pool).await?;

	Ok(records)
}

/// Attribute blobs of every enriched record, for region vocabulary scans.
pub async fn fetch_enriched_attributes(pool: &PgPool) -> Result<Vec<Value>> {
	let blobs = sqlx::query_scalar::<_, Value>(
		"SELECT attributes FROM grant_records WHERE attributes <> '{}'::jsonb",
	)
	.fetch_all(pool)
	.await?;

	Ok(blobs)
}

pub async fn apply_success_tx(
	tx: &mut Transaction<'_, Postgres>,
	id: i64,
	attributes: &Value,
	marketing_summary: Option<&str>,
	status: &str,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE grant_records
SET attributes = $1,
	marketing_summary = $2,
	status = $3,
	last_error = NULL
WHERE id = $4",
	)
	.bind(attributes)
	.bind(marketing_summary)
	.bind(status)
	.bind(id)
	.execute(&mut **tx)
	.await?;

	Ok(())
}

pub async fn apply_failure_tx(
	tx: &mut Transaction<'_, Postgres>,
	id: i64,
	status: &str,
	last_error: &str,
) -> Result<()> {
	sqlx::query("UPDATE grant_records SET status = $1, last_error = $2 WHERE id = $3")
		.bind(status)
		.bind(last_error)
		.bind(id)
		.execute(&mut **tx)
		.await?;

	Ok(())
}

pub async fn count_by_status(pool: &PgPool, status: &str) -> Result<i64> {
	let count =
		sqlx::query_scalar::<_, i64>("SELECT count(*) FROM grant_records WHERE status = $1")
			.bind(status)
			.fetch_one(pool)
			.await?;

	Ok(count)
}

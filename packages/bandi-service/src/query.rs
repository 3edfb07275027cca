use serde_json::Value;
use time::{Date, OffsetDateTime};

use bandi_domain::{expiry, merge, regions, search, status::RecordStatus};
use bandi_storage::{models::GrantRecord, queries};

use crate::{BandiService, ServiceError, ServiceResult};

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct QueryRequest {
	/// 1-indexed.
	pub page: u32,
	pub page_size: Option<u32>,
	pub status: Option<String>,
	pub search: Option<String>,
	pub region: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RecordView {
	pub id: i64,
	pub url: String,
	pub title: String,
	pub source_name: String,
	pub status: String,
	#[serde(with = "crate::time_serde")]
	pub ingested_at: OffsetDateTime,
	pub attributes: Value,
	pub marketing_summary: Option<String>,
}
impl RecordView {
	fn from_record(record: GrantRecord) -> Self {
		Self {
			id: record.id,
			url: record.source_url,
			title: record.title,
			source_name: record.source_name,
			status: record.status,
			ingested_at: record.ingested_at,
			attributes: record.attributes,
			marketing_summary: record.marketing_summary,
		}
	}
}

#[derive(Debug, serde::Serialize)]
pub struct QueryResponse {
	pub records: Vec<RecordView>,
	pub total: u64,
}

/// Outcome of parsing the optional status filter. An unrecognized value is
/// not an error: it means no record can match.
enum StatusFilter {
	All,
	Only(RecordStatus),
	NoMatch,
}
impl StatusFilter {
	fn parse(raw: Option<&str>) -> Self {
		match raw.map(str::trim).filter(|value| !value.is_empty()) {
			None => Self::All,
			Some(raw) => match RecordStatus::parse(raw) {
				Some(status) => Self::Only(status),
				None => Self::NoMatch,
			},
		}
	}
}

impl BandiService {
	pub async fn query(&self, req: QueryRequest) -> ServiceResult<QueryResponse> {
		if req.page == 0 {
			return Err(ServiceError::InvalidRequest {
				message: "page must be 1 or greater.".to_string(),
			});
		}

		let status = match StatusFilter::parse(req.status.as_deref()) {
			StatusFilter::All => None,
			StatusFilter::Only(status) => Some(status),
			StatusFilter::NoMatch =>
				return Ok(QueryResponse { records: Vec::new(), total: 0 }),
		};
		let rows =
			queries::fetch_for_query(&self.db.pool, status.map(RecordStatus::as_str)).await?;
		let today = OffsetDateTime::now_utc().date();
		let (records, total) = select_page(rows, &req, &self.cfg.query, today);

		Ok(QueryResponse { records, total })
	}

	pub async fn get(&self, id: i64) -> ServiceResult<RecordView> {
		let record = queries::fetch_by_id(&self.db.pool, id)
			.await?
			.ok_or_else(|| ServiceError::NotFound { message: format!("Record {id} not found.") })?;

		Ok(RecordView::from_record(record))
	}
}

struct RankedRecord {
	record: GrantRecord,
	expired: bool,
	open_date: OffsetDateTime,
}

/// Filter, rank, and paginate the status-filtered row set. Ranking runs over
/// resolved attributes, so it cannot be pushed into SQL.
fn select_page(
	rows: Vec<GrantRecord>,
	req: &QueryRequest,
	cfg: &bandi_config::Query,
	today: Date,
) -> (Vec<RecordView>, u64) {
	let page_size = req.page_size.unwrap_or(cfg.default_page_size).clamp(1, cfg.max_page_size);
	let mut matched: Vec<RankedRecord> = rows
		.into_iter()
		.filter_map(|record| {
			let attrs = merge::attributes_map(&record.attributes);

			if let Some(needle) = req.search.as_deref().filter(|value| !value.trim().is_empty())
				&& !search::text_matches(
					&record.title,
					record.marketing_summary.as_deref(),
					&attrs,
					needle,
				) {
				return None;
			}
			if let Some(region) = req.region.as_deref().filter(|value| !value.trim().is_empty())
				&& !regions::region_matches(&attrs, region)
			{
				return None;
			}

			let expired = expiry::effective_expired(&attrs, today);
			let open_date = expiry::resolve_open_date(&attrs, record.ingested_at);

			Some(RankedRecord { record, expired, open_date })
		})
		.collect();

	// Active before expired, then newest opening first, id as the
	// deterministic tie-break.
	matched.sort_by(|a, b| {
		a.expired
			.cmp(&b.expired)
			.then_with(|| b.open_date.cmp(&a.open_date))
			.then_with(|| b.record.id.cmp(&a.record.id))
	});

	let total = matched.len() as u64;
	let offset = (req.page as usize - 1).saturating_mul(page_size as usize);
	let records = matched
		.into_iter()
		.skip(offset)
		.take(page_size as usize)
		.map(|ranked| RecordView::from_record(ranked.record))
		.collect();

	(records, total)
}

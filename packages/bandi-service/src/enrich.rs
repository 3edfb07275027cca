use std::{sync::Arc, time::Duration};

use ahash::AHashMap;
use serde_json::{Map, Value};
use tokio::{
	sync::{Mutex, Semaphore},
	task::JoinSet,
	time as tokio_time,
	time::Instant,
};
use uuid::Uuid;

use bandi_config::{Enrichment, ProviderConfig};
use bandi_domain::{
	marketing,
	merge::{self, MergeMode},
	status::RecordStatus,
};
use bandi_providers::{EnrichmentRequest, default_schema};
use bandi_storage::{models::GrantRecord, queries};

use crate::{BandiService, EnrichmentProvider, ServiceResult};

/// Which records a batch run pulls from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentWindow {
	New,
	Errored,
	/// Records never enriched to the core attribute set, whatever their
	/// status.
	MissingAttributes,
	/// Forced re-drive over already analyzed records.
	Analyzed,
}

#[derive(Debug, Default, serde::Serialize)]
pub struct BatchReport {
	pub updated: u32,
	pub failed: u32,
	pub failures: Vec<ItemFailure>,
}

#[derive(Debug, serde::Serialize)]
pub struct ItemFailure {
	pub id: i64,
	pub error: String,
}

struct ItemResult {
	id: i64,
	result: Result<Map<String, Value>, String>,
}

/// Serializes dispatch instants across all workers of a run so the external
/// provider sees at most one new call per `interval`, no matter how many
/// calls are concurrently in flight.
struct Pacer {
	interval: Duration,
	next: Mutex<Instant>,
}
impl Pacer {
	fn new(interval: Duration) -> Self {
		Self { interval, next: Mutex::new(Instant::now()) }
	}

	async fn wait(&self) {
		let deadline = {
			let mut next = self.next.lock().await;
			let deadline = (*next).max(Instant::now());

			*next = deadline + self.interval;

			deadline
		};

		tokio_time::sleep_until(deadline).await;
	}
}

impl BandiService {
	/// Enrich one bounded window of records. Workers accumulate results in
	/// memory; a single transaction at the end applies merge, marketing
	/// projection, and status transitions for the whole batch. Re-running a
	/// batch over already committed items is safe because the merge is
	/// idempotent.
	pub async fn run_batch(
		&self,
		window: EnrichmentWindow,
		mode: MergeMode,
	) -> ServiceResult<BatchReport> {
		let limit = i64::from(self.cfg.enrichment.batch_size);
		let records = match window {
			EnrichmentWindow::New =>
				queries::fetch_status_window(&self.db.pool, RecordStatus::New.as_str(), limit)
					.await?,
			EnrichmentWindow::Errored =>
				queries::fetch_status_window(&self.db.pool, RecordStatus::Error.as_str(), limit)
					.await?,
			EnrichmentWindow::MissingAttributes =>
				queries::fetch_missing_attributes_window(&self.db.pool, limit).await?,
			EnrichmentWindow::Analyzed =>
				queries::fetch_status_window(&self.db.pool, RecordStatus::Analyzed.as_str(), limit)
					.await?,
		};

		if records.is_empty() {
			return Ok(BatchReport::default());
		}

		tracing::info!(count = records.len(), window = ?window, "Starting enrichment batch.");

		let outcomes = drive_batch(
			&records,
			self.provider.clone(),
			&self.cfg.providers,
			&self.cfg.enrichment,
		)
		.await;
		let by_id: AHashMap<i64, &GrantRecord> =
			records.iter().map(|record| (record.id, record)).collect();
		let mut report = BatchReport::default();
		let mut tx = self.db.pool.begin().await?;

		for outcome in outcomes {
			let Some(record) = by_id.get(&outcome.id) else {
				continue;
			};
			let current = RecordStatus::parse(&record.status).unwrap_or(RecordStatus::New);

			match outcome.result {
				Ok(new_attrs) => {
					let existing = merge::attributes_map(&record.attributes);
					let merged = merge::merge(&existing, &new_attrs, mode);
					let summary = marketing::marketing_summary(&merged);
					let next = current.on_success();

					queries::apply_success_tx(
						&mut tx,
						outcome.id,
						&Value::Object(merged),
						summary.as_deref(),
						next.as_str(),
					)
					.await?;

					report.updated += 1;
				},
				Err(error) => {
					let next = current.on_failure();

					queries::apply_failure_tx(&mut tx, outcome.id, next.as_str(), &error).await?;
					tracing::warn!(id = outcome.id, error = %error, "Enrichment failed for record.");

					report.failed += 1;
					report.failures.push(ItemFailure { id: outcome.id, error });
				},
			}
		}

		tx.commit().await?;
		tracing::info!(updated = report.updated, failed = report.failed, "Batch committed.");

		Ok(report)
	}
}

/// Run the provider calls for a window: bounded concurrency via semaphore,
/// globally paced dispatches, per-provider retry with backoff, fallback
/// across the provider list. No store access happens here.
async fn drive_batch(
	records: &[GrantRecord],
	provider: Arc<dyn EnrichmentProvider>,
	providers: &[ProviderConfig],
	enrichment: &Enrichment,
) -> Vec<ItemResult> {
	let semaphore = Arc::new(Semaphore::new(enrichment.concurrency_limit as usize));
	let pacer = Arc::new(Pacer::new(Duration::from_millis(enrichment.rate_interval_ms)));
	let providers = Arc::new(providers.to_vec());
	let enrichment = Arc::new(enrichment.clone());
	let mut tasks = JoinSet::new();

	for record in records {
		let id = record.id;
		let req = build_request(record, enrichment.max_content_chars);
		let semaphore = semaphore.clone();
		let pacer = pacer.clone();
		let provider = provider.clone();
		let providers = providers.clone();
		let enrichment = enrichment.clone();

		tasks.spawn(async move {
			let Ok(_permit) = semaphore.acquire_owned().await else {
				return ItemResult { id, result: Err("Scheduler semaphore closed.".to_string()) };
			};
			let result = enrich_one(provider.as_ref(), &providers, &enrichment, &pacer, &req).await;

			ItemResult { id, result }
		});
	}

	let mut outcomes = Vec::with_capacity(records.len());

	while let Some(joined) = tasks.join_next().await {
		match joined {
			Ok(outcome) => outcomes.push(outcome),
			Err(err) => {
				tracing::error!(error = %err, "Enrichment task failed to join.");
			},
		}
	}

	outcomes
}

/// Walk the provider list in priority order. Transient errors retry the same
/// provider with exponential backoff plus jitter, up to `max_retries`
/// attempts; any other error advances to the next provider immediately. The
/// last error is reported when everything is exhausted.
async fn enrich_one(
	provider: &dyn EnrichmentProvider,
	providers: &[ProviderConfig],
	enrichment: &Enrichment,
	pacer: &Pacer,
	req: &EnrichmentRequest,
) -> Result<Map<String, Value>, String> {
	let mut last_error = None;

	for cfg in providers {
		for attempt in 1..=enrichment.max_retries {
			pacer.wait().await;

			match provider.enrich(cfg, req).await {
				Ok(attrs) => return Ok(attrs),
				Err(err) if err.is_transient() => {
					last_error = Some(format!("{}: {err}", cfg.provider_id));

					if attempt < enrichment.max_retries {
						let delay = backoff_for_attempt(enrichment, attempt);

						tracing::warn!(
							provider = %cfg.provider_id,
							attempt,
							delay_ms = delay.as_millis() as u64,
							"Transient provider error; backing off."
						);
						tokio_time::sleep(delay).await;
					}
				},
				Err(err) => {
					if let bandi_providers::Error::Malformed { raw } = &err {
						tracing::warn!(
							provider = %cfg.provider_id,
							raw = %raw,
							"Provider returned malformed output."
						);
					}

					last_error = Some(format!("{}: {err}", cfg.provider_id));

					break;
				},
			}
		}
	}

	Err(last_error.unwrap_or_else(|| "No providers configured.".to_string()))
}

fn build_request(record: &GrantRecord, max_content_chars: usize) -> EnrichmentRequest {
	let mut content = format!("Titolo: {}\n\nContenuto:\n", record.title);

	content.extend(record.raw_content.chars().take(max_content_chars));

	EnrichmentRequest { content, schema: default_schema() }
}

fn backoff_for_attempt(enrichment: &Enrichment, attempt: u32) -> Duration {
	let exp = attempt.saturating_sub(1).min(6);
	let base = enrichment.base_backoff_ms.saturating_mul(1 << exp);
	let capped = base.min(enrichment.max_backoff_ms);

	Duration::from_millis(capped.saturating_add(jitter_ms(enrichment.max_jitter_ms)))
}

fn jitter_ms(max: u64) -> u64 {
	if max == 0 {
		return 0;
	}

	// A v4 uuid carries 122 random bits; plenty of entropy for backoff
	// jitter.
	(Uuid::new_v4().as_u128() % (u128::from(max) + 1)) as u64
}

use std::sync::Arc;

use serde_json::{Map, Value, json};

use bandi_config::{Config, Enrichment, Postgres, ProviderConfig, Query, Service, Storage};
use bandi_providers::EnrichmentRequest;
use bandi_service::{
	BandiService, BoxFuture, Candidate, EnrichmentProvider, EnrichmentWindow, IngestOutcome,
	QueryRequest,
};
use bandi_storage::db::Db;
use bandi_testkit::TestDatabase;

fn test_config(dsn: &str) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: dsn.to_string(), pool_max_conns: 2 },
		},
		providers: vec![ProviderConfig {
			provider_id: "scripted".to_string(),
			api_base: "http://localhost".to_string(),
			api_key: "key".to_string(),
			path: "/v1/chat/completions".to_string(),
			model: "m".to_string(),
			temperature: 0.2,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		}],
		enrichment: Enrichment {
			batch_size: 50,
			concurrency_limit: 2,
			rate_interval_ms: 0,
			max_retries: 2,
			base_backoff_ms: 1,
			max_backoff_ms: 2,
			max_jitter_ms: 0,
			max_content_chars: 4_000,
		},
		query: Query { default_page_size: 20, max_page_size: 100 },
	}
}

struct FixedProvider {
	result: Value,
}
impl EnrichmentProvider for FixedProvider {
	fn enrich<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_req: &'a EnrichmentRequest,
	) -> BoxFuture<'a, Result<Map<String, Value>, bandi_providers::Error>> {
		let attrs = self.result.as_object().cloned().unwrap_or_default();

		Box::pin(async move { Ok(attrs) })
	}
}

struct RateLimitedProvider;
impl EnrichmentProvider for RateLimitedProvider {
	fn enrich<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		_req: &'a EnrichmentRequest,
	) -> BoxFuture<'a, Result<Map<String, Value>, bandi_providers::Error>> {
		Box::pin(async move { Err(bandi_providers::Error::RateLimited) })
	}
}

async fn service_with_provider(
	dsn: &str,
	provider: Arc<dyn EnrichmentProvider>,
) -> BandiService {
	let cfg = test_config(dsn);
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	BandiService::with_provider(cfg, db, provider)
}

fn candidate(url: &str, title: &str) -> Candidate {
	Candidate {
		url: url.to_string(),
		title: title.to_string(),
		raw_content: "contenuto del bando".to_string(),
		source_name: "MIMIT".to_string(),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BANDI_PG_DSN to run."]
async fn ingesting_the_same_url_is_idempotent() {
	let Some(base_dsn) = bandi_testkit::env_dsn() else {
		eprintln!("Skipping ingesting_the_same_url_is_idempotent; set BANDI_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_with_provider(
		test_db.dsn(),
		Arc::new(FixedProvider { result: json!({}) }),
	)
	.await;
	let first = service
		.ingest(candidate("https://www.incentivi.gov.it/it/bando-1", "Bando uno"))
		.await
		.expect("Failed to ingest first candidate.");
	let IngestOutcome::Created { id } = first else {
		panic!("Expected the first submission to create a record, got {first:?}");
	};

	for variant in [
		"https://incentivi.gov.it/it/bando-1",
		"http://www.incentivi.gov.it/it/bando-1/",
		"INCENTIVI.GOV.IT/it/bando-1",
	] {
		let outcome = service
			.ingest(candidate(variant, "Bando uno"))
			.await
			.expect("Failed to ingest variant.");

		assert_eq!(outcome, IngestOutcome::Skipped { id }, "variant: {variant}");
	}

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BANDI_PG_DSN to run."]
async fn placeholder_titles_are_repaired_on_resubmission() {
	let Some(base_dsn) = bandi_testkit::env_dsn() else {
		eprintln!("Skipping placeholder_titles_are_repaired_on_resubmission; set BANDI_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_with_provider(
		test_db.dsn(),
		Arc::new(FixedProvider { result: json!({}) }),
	)
	.await;
	let created = service
		.ingest(candidate("https://example.org/bando-2", "Bando Senza Titolo"))
		.await
		.expect("Failed to ingest placeholder candidate.");
	let IngestOutcome::Created { id } = created else {
		panic!("Expected a created record, got {created:?}");
	};
	let outcome = service
		.ingest(candidate("https://example.org/bando-2", "Voucher digitalizzazione PMI"))
		.await
		.expect("Failed to resubmit candidate.");

	assert_eq!(outcome, IngestOutcome::Skipped { id });

	let view = service.get(id).await.expect("Failed to fetch record.");

	assert_eq!(view.title, "Voucher digitalizzazione PMI");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BANDI_PG_DSN to run."]
async fn exhausted_records_move_to_error_and_can_be_redriven() {
	let Some(base_dsn) = bandi_testkit::env_dsn() else {
		eprintln!("Skipping exhausted_records_move_to_error_and_can_be_redriven; set BANDI_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_with_provider(test_db.dsn(), Arc::new(RateLimitedProvider)).await;
	let created = service
		.ingest(candidate("https://example.org/bando-3", "Bando tre"))
		.await
		.expect("Failed to ingest candidate.");
	let IngestOutcome::Created { id } = created else {
		panic!("Expected a created record, got {created:?}");
	};
	let report = service
		.run_batch(EnrichmentWindow::New, bandi_domain::merge::MergeMode::Preserve)
		.await
		.expect("Failed to run batch.");

	assert_eq!(report.updated, 0);
	assert_eq!(report.failed, 1);
	assert_eq!(report.failures[0].id, id);

	let view = service.get(id).await.expect("Failed to fetch record.");

	assert_eq!(view.status, "error");

	// A later re-drive over the error window with a working provider
	// recovers the record.
	let service = BandiService::with_provider(
		test_config(test_db.dsn()),
		Db::connect(&test_config(test_db.dsn()).storage.postgres)
			.await
			.expect("Failed to reconnect."),
		Arc::new(FixedProvider {
			result: json!({ "regions": ["Nazionale"], "sintesi": "Bando tre", "is_expired": false }),
		}),
	);
	let report = service
		.run_batch(EnrichmentWindow::Errored, bandi_domain::merge::MergeMode::Preserve)
		.await
		.expect("Failed to re-drive batch.");

	assert_eq!(report.updated, 1);
	assert_eq!(report.failed, 0);

	let view = service.get(id).await.expect("Failed to fetch record.");

	assert_eq!(view.status, "analyzed");
	assert_eq!(view.attributes["regions"][0], "Nazionale");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BANDI_PG_DSN to run."]
async fn successful_batches_merge_and_project_marketing() {
	let Some(base_dsn) = bandi_testkit::env_dsn() else {
		eprintln!("Skipping successful_batches_merge_and_project_marketing; set BANDI_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_with_provider(
		test_db.dsn(),
		Arc::new(FixedProvider {
			result: json!({
				"regions": ["Lombardia"],
				"marketing_text": "Fino a 50.000 euro per la tua impresa!",
				"is_expired": false,
			}),
		}),
	)
	.await;
	let created = service
		.ingest(candidate("https://example.org/bando-4", "Bando quattro"))
		.await
		.expect("Failed to ingest candidate.");
	let IngestOutcome::Created { id } = created else {
		panic!("Expected a created record, got {created:?}");
	};
	let report = service
		.run_batch(EnrichmentWindow::New, bandi_domain::merge::MergeMode::Preserve)
		.await
		.expect("Failed to run batch.");

	assert_eq!(report.updated, 1);

	let view = service.get(id).await.expect("Failed to fetch record.");

	assert_eq!(view.status, "analyzed");
	assert_eq!(
		view.marketing_summary.as_deref(),
		Some("Fino a 50.000 euro per la tua impresa!")
	);

	// Re-running the same batch window over the analyzed record converges.
	let report = service
		.run_batch(EnrichmentWindow::Analyzed, bandi_domain::merge::MergeMode::Preserve)
		.await
		.expect("Failed to re-run batch.");

	assert_eq!(report.updated, 1);

	let again = service.get(id).await.expect("Failed to fetch record.");

	assert_eq!(again.status, "analyzed");
	assert_eq!(again.attributes, view.attributes);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set BANDI_PG_DSN to run."]
async fn query_paginates_and_handles_filters_end_to_end() {
	let Some(base_dsn) = bandi_testkit::env_dsn() else {
		eprintln!("Skipping query_paginates_and_handles_filters_end_to_end; set BANDI_PG_DSN.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let service = service_with_provider(
		test_db.dsn(),
		Arc::new(FixedProvider { result: json!({}) }),
	)
	.await;

	for index in 1..=25 {
		service
			.ingest(candidate(&format!("https://example.org/bando-{index}"), "Bando"))
			.await
			.expect("Failed to ingest candidate.");
	}

	let first = service
		.query(QueryRequest { page: 1, ..QueryRequest::default() })
		.await
		.expect("Failed to query page 1.");

	assert_eq!(first.total, 25);
	assert_eq!(first.records.len(), 20);

	let second = service
		.query(QueryRequest { page: 2, ..QueryRequest::default() })
		.await
		.expect("Failed to query page 2.");

	assert_eq!(second.records.len(), 5);

	let bogus = service
		.query(QueryRequest { page: 1, status: Some("bogus".to_string()), ..QueryRequest::default() })
		.await
		.expect("Failed to query with bogus status.");

	assert_eq!(bogus.total, 0);
	assert!(bogus.records.is_empty());

	let invalid_page = service.query(QueryRequest { page: 0, ..QueryRequest::default() }).await;

	assert!(invalid_page.is_err(), "page 0 must be rejected");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

use std::time::Duration;

use tokio::time as tokio_time;

use bandi_domain::merge::MergeMode;
use bandi_service::{BandiService, EnrichmentWindow};

const POLL_INTERVAL_MS: u64 = 30_000;

/// Drive enrichment until stopped: fresh records first, then one re-drive
/// pass over errored records. Sleeps between polls when both windows come
/// back empty.
pub async fn run_worker(service: BandiService, mode: MergeMode) -> color_eyre::Result<()> {
	loop {
		let mut processed = 0_u32;

		for window in [EnrichmentWindow::New, EnrichmentWindow::Errored] {
			match service.run_batch(window, mode).await {
				Ok(report) => {
					processed += report.updated + report.failed;

					if report.updated + report.failed > 0 {
						tracing::info!(
							window = ?window,
							updated = report.updated,
							failed = report.failed,
							"Batch finished."
						);
					}
				},
				Err(err) => {
					tracing::error!(error = %err, window = ?window, "Batch run failed.");
				},
			}
		}

		if processed == 0 {
			tokio_time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
		}
	}
}

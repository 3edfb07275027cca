pub mod worker;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bandi_domain::merge::MergeMode;
use bandi_service::{BandiService, EnrichmentWindow};

#[derive(Debug, Parser)]
#[command(
	version = bandi_cli::VERSION,
	rename_all = "kebab",
	styles = bandi_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: std::path::PathBuf,
	/// Run a single pass over the selected window and exit.
	#[arg(long)]
	pub once: bool,
	/// Window to drive in --once mode: new, errored, missing, analyzed.
	#[arg(long, default_value = "new")]
	pub window: String,
	/// Overwrite already stored attribute values instead of preserving them.
	#[arg(long)]
	pub force: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = bandi_config::load(&args.config)?;
	let filter = EnvFilter::new(config.service.log_level.clone());
	tracing_subscriber::fmt().with_env_filter(filter).init();

	let db = bandi_storage::db::Db::connect(&config.storage.postgres).await?;

	db.ensure_schema().await?;

	let service = BandiService::new(config, db);
	let mode = if args.force { MergeMode::Force } else { MergeMode::Preserve };

	if args.once {
		let window = parse_window(&args.window)?;
		let report = service.run_batch(window, mode).await?;

		tracing::info!(updated = report.updated, failed = report.failed, "Single pass finished.");

		return Ok(());
	}

	worker::run_worker(service, mode).await
}

fn parse_window(raw: &str) -> color_eyre::Result<EnrichmentWindow> {
	let window = match raw.trim().to_ascii_lowercase().as_str() {
		"new" => EnrichmentWindow::New,
		"errored" => EnrichmentWindow::Errored,
		"missing" => EnrichmentWindow::MissingAttributes,
		"analyzed" => EnrichmentWindow::Analyzed,
		other => {
			return Err(color_eyre::eyre::eyre!(
				"Unknown window {other:?}; expected new, errored, missing, or analyzed."
			));
		},
	};

	Ok(window)
}

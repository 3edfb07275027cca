use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = bandi_worker::Args::parse();
	bandi_worker::run(args).await
}

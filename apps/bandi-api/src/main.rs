use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = bandi_api::Args::parse();
	bandi_api::run(args).await
}

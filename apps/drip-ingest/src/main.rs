use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = drip_ingest::Args::parse();

	drip_ingest::run(args).await
}

use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = drip_api::Args::parse();

	drip_api::run(args).await
}

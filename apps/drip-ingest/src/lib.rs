use std::{fs, path::PathBuf};

use clap::Parser;

use drip_service::{DripService, IngestReport, Visibility};

/// Loads brew records from a JSON or JSON Lines file into the vector store.
#[derive(Debug, Parser)]
#[command(
	version = drip_cli::VERSION,
	rename_all = "kebab",
	styles = drip_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 'i', value_name = "FILE")]
	pub input: PathBuf,
	/// Owner of the ingested records.
	#[arg(long, short = 't', value_name = "TENANT")]
	pub tenant: String,
	#[arg(long, value_name = "VISIBILITY", default_value = "private")]
	pub visibility: Visibility,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = drip_config::load(&args.config)?;

	drip_cli::init_tracing(&config.service.log_level);

	let service = DripService::connect(config).await?;
	let report = ingest_file(&service, &args).await?;

	tracing::info!(
		input = %args.input.display(),
		ingested = report.ingested.len(),
		skipped = report.skipped,
		"Ingestion finished."
	);

	Ok(())
}

pub async fn ingest_file(service: &DripService, args: &Args) -> color_eyre::Result<IngestReport> {
	let raw = fs::read_to_string(&args.input)?;
	let records = drip_domain::input::parse_records(&raw)?;

	tracing::info!(records = records.len(), tenant = %args.tenant, "Parsed input file.");

	Ok(service.ingest_batch(&records, &args.tenant, args.visibility).await?)
}

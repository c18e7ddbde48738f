pub mod routes;
pub mod state;

use std::{fs, io::ErrorKind, net::SocketAddr, path::PathBuf};

use clap::Parser;
use tokio::net::TcpListener;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = drip_cli::VERSION,
	rename_all = "kebab",
	styles = drip_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = drip_config::load(&args.config)?;

	drip_cli::init_tracing(&config.service.log_level);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let state = AppState::new(config).await?;

	seed(&state).await?;

	let app = routes::router(state);
	let http_listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(http_listener, app).await?;

	Ok(())
}

/// Loads the configured public reference file. A missing file is logged and skipped.
pub async fn seed(state: &AppState) -> color_eyre::Result<()> {
	let Some(seed) = state.service.cfg.seed.as_ref() else { return Ok(()) };
	let raw = match fs::read_to_string(&seed.path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => {
			tracing::warn!(path = %seed.path.display(), "Seed file not found. Skipping seeding.");

			return Ok(());
		},
		Err(err) => return Err(err.into()),
	};
	let records = drip_domain::input::parse_records(&raw)?;

	state.service.seed_public(&records, &seed.owner).await?;

	Ok(())
}

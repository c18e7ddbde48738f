//! Pieces shared by the `drip-api` and `drip-ingest` binaries.

use clap::builder::{
	Styles,
	styling::{AnsiColor, Effects},
};
use tracing_subscriber::EnvFilter;

pub const VERSION: &str = concat!(
	env!("CARGO_PKG_VERSION"),
	"-",
	env!("VERGEN_GIT_SHA"),
	"-",
	env!("VERGEN_CARGO_TARGET_TRIPLE"),
);

/// Filter used when `service.log_level` is not a valid directive.
pub const FALLBACK_LOG_FILTER: &str = "info";

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
		.literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
		.error(AnsiColor::Red.on_default() | Effects::BOLD)
		.valid(AnsiColor::Green.on_default() | Effects::BOLD)
		.invalid(AnsiColor::Magenta.on_default() | Effects::BOLD)
}

pub fn log_filter(log_level: &str) -> EnvFilter {
	EnvFilter::try_new(log_level.trim()).unwrap_or_else(|_| EnvFilter::new(FALLBACK_LOG_FILTER))
}

/// Installs the global `fmt` subscriber for a binary.
pub fn init_tracing(log_level: &str) {
	tracing_subscriber::fmt().with_env_filter(log_filter(log_level)).init();
}

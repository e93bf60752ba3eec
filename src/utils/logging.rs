//! Logging utilities
//!
//! Installs a `tracing_subscriber` registry for applications embedding the account
//! manager. The library itself only emits spans and events through `tracing`.
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Setup logging for the application
///
/// Uses `RUST_LOG` when set and falls back to `default_level` otherwise.
/// Does nothing if a global subscriber has already been installed.
pub fn setup_logging(default_level: &str) {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

	let subscriber = tracing_subscriber::registry().with(filter).with(
		fmt::layer()
			.with_writer(std::io::stdout)
			.event_format(
				fmt::format()
					.with_level(true)
					.with_target(true)
					.with_thread_ids(false)
					.with_thread_names(false)
					.with_ansi(true)
					.compact(),
			)
			.fmt_fields(fmt::format::PrettyFields::new()),
	);

	// Try to set the subscriber, but don't panic if it fails
	let _ = subscriber.try_init();
}

//! Process-wide `tracing` subscriber installation

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wayfare_conf::{LogFormat, LoggingSettings};

/// Errors raised while installing the subscriber
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LoggingError {
	#[error("invalid log filter '{directive}': {message}")]
	Filter { directive: String, message: String },

	/// A global subscriber is already installed in this process
	#[error("tracing subscriber already installed: {0}")]
	AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// `RUST_LOG` wins over the configured level when it is set and non-blank
fn filter_from(rust_log: Option<String>, level: &str) -> Result<EnvFilter, LoggingError> {
	let directive = rust_log
		.filter(|value| !value.trim().is_empty())
		.unwrap_or_else(|| level.to_string());
	EnvFilter::try_new(&directive).map_err(|e| LoggingError::Filter {
		message: e.to_string(),
		directive,
	})
}

/// Install the global subscriber described by `settings`, writing to stderr.
///
/// Only the first successful call in a process takes effect; later calls
/// return [`LoggingError::AlreadyInitialized`].
pub fn init(settings: &LoggingSettings) -> Result<(), LoggingError> {
	let filter = filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok(), &settings.level)?;
	let registry = tracing_subscriber::registry().with(filter);

	match settings.format {
		LogFormat::Compact => registry
			.with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
			.try_init()?,
		LogFormat::Json => registry
			.with(fmt::layer().json().with_current_span(true).with_writer(std::io::stderr))
			.try_init()?,
	}
	Ok(())
}

//! Logging engine and event capture.
//!
//! [`LogEngine`] is the second half of the bootstrap cycle: it reads its settings
//! from the global hub, and the hub registers the engine's default logger as a
//! component. [`init_subscriber`] installs the process subscriber: a reloadable
//! `EnvFilter`, the `fmt` layer on stderr and the [`CaptureLayer`] feeding
//! [`LOG_BUFFER`].

mod buffer;
pub mod enrichment;
mod engine;
mod layer;

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt, reload};

pub use buffer::{CapturePause, DEFAULT_CAPTURE_CAPACITY, LOG_BUFFER, LogBuffer, LogRecord};
pub use engine::{LogEngine, LogSettings, Logger};
pub use layer::CaptureLayer;

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
	#[error("invalid filter directive: {0}")]
	Parse(#[from] tracing_subscriber::filter::ParseError),
	#[error("failed to reload filter: {0}")]
	Reload(#[from] reload::Error),
}

struct FilterControl {
	handle: reload::Handle<EnvFilter, Registry>,
	default_directive: String,
}

static FILTER: OnceLock<FilterControl> = OnceLock::new();

/// Installs the global subscriber with `directive` as its default filter.
///
/// Returns false if a global subscriber was already set, by this function or
/// anyone else.
pub fn init_subscriber(directive: &str) -> bool {
	let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));
	let (filter, handle) = reload::Layer::new(filter);
	let installed = tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer().with_writer(std::io::stderr).with_target(false))
		.with(CaptureLayer::new())
		.try_init()
		.is_ok();
	if installed {
		let _ = FILTER.set(FilterControl {
			handle,
			default_directive: directive.to_string(),
		});
	}
	installed
}

/// Replaces the installed filter. Returns `Ok(false)` when no subscriber was
/// installed by [`init_subscriber`].
pub fn set_filter(directive: &str) -> Result<bool, FilterError> {
	let Some(control) = FILTER.get() else {
		return Ok(false);
	};
	let filter = EnvFilter::try_new(directive)?;
	control.handle.reload(filter)?;
	Ok(true)
}

/// Puts back the filter [`init_subscriber`] was called with.
pub fn restore_default_filter() -> Result<bool, FilterError> {
	match FILTER.get() {
		Some(control) => set_filter(&control.default_directive),
		None => Ok(false),
	}
}

#[cfg(test)]
mod tests;

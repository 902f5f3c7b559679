use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwapOption;
use tracing::Level;

use super::buffer::LOG_BUFFER;
use super::enrichment;
use crate::bootstrap::{self, publish_once};
use crate::config::LogConfig;

static ENGINE: LazyLock<ArcSwapOption<LogEngine>> = LazyLock::new(ArcSwapOption::empty);

/// Settings the engine is built from.
///
/// Registered as the [`LogSettings::COMPONENT`] component to override the config
/// file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
	/// `EnvFilter` directive.
	pub directive: String,
	pub capture_capacity: usize,
}

impl LogSettings {
	pub const COMPONENT: &'static str = "log.settings";

	/// Settings taken from the `[log]` table of the config.
	pub fn from_config(config: &LogConfig) -> Self {
		Self {
			directive: config.level.clone(),
			capture_capacity: config.capture_capacity,
		}
	}
}

impl Default for LogSettings {
	fn default() -> Self {
		Self::from_config(&LogConfig::default())
	}
}

/// Process-wide logging engine.
///
/// Reads its [`LogSettings`] from the global hub, which in turn asks the engine for
/// its default logger. [`LogEngine::global`] breaks that cycle with the bootstrap
/// guard.
#[derive(Debug)]
pub struct LogEngine {
	settings: LogSettings,
	degraded: bool,
}

impl LogEngine {
	/// Engine applying `settings`.
	pub fn new(settings: LogSettings) -> Self {
		Self {
			settings,
			degraded: false,
		}
	}

	/// Dependency-free engine handed out when bootstrap recursion is cut off.
	pub fn fallback() -> Self {
		Self {
			settings: LogSettings::default(),
			degraded: true,
		}
	}

	/// Returns the published engine, building and publishing it if needed.
	///
	/// A call nested inside a hub bootstrap returns an unpublished engine; the next
	/// top-level call builds the one that sticks.
	pub fn global() -> Arc<Self> {
		if let Some(engine) = ENGINE.load_full() {
			return engine;
		}
		bootstrap::bootstrap(
			"log_engine",
			|guard| {
				let engine = Arc::new(Self::from_hub());
				if !guard.is_outermost() {
					return engine;
				}
				let published = publish_once(&ENGINE, engine);
				published.apply();
				published
			},
			|| Arc::new(Self::fallback()),
		)
	}

	/// Published engine, without building one.
	pub fn peek() -> Option<Arc<Self>> {
		ENGINE.load_full()
	}

	/// Unpublishes the engine. Returns false if none was published.
	pub fn clear_global() -> bool {
		ENGINE.swap(None).is_some()
	}

	fn from_hub() -> Self {
		let hub = crate::hub::global();
		let settings = match hub.get_component_as::<LogSettings>(LogSettings::COMPONENT) {
			Ok(settings) => LogSettings::clone(&settings),
			Err(_) => LogSettings::from_config(&hub.config().log),
		};
		Self::new(settings)
	}

	/// Pushes the settings into the capture buffer and the installed filter.
	fn apply(&self) {
		LOG_BUFFER.set_capacity(self.settings.capture_capacity);
		if let Err(error) = super::set_filter(&self.settings.directive) {
			tracing::warn!(%error, directive = %self.settings.directive, "keeping previous log filter");
		}
	}

	/// Settings the engine was built with.
	pub fn settings(&self) -> &LogSettings {
		&self.settings
	}

	/// True for an engine built by [`LogEngine::fallback`].
	pub fn is_degraded(&self) -> bool {
		self.degraded
	}

	/// Logger tagging its events with `name`.
	pub fn logger(&self, name: impl Into<String>) -> Logger {
		Logger {
			name: Arc::from(name.into()),
		}
	}
}

/// Named handle emitting `tracing` events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Logger {
	name: Arc<str>,
}

impl Logger {
	/// Name attached to every event.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Emits `message` at error level.
	pub fn error(&self, message: &str) {
		self.emit(Level::ERROR, None, message);
	}

	/// Emits `message` at warn level.
	pub fn warn(&self, message: &str) {
		self.emit(Level::WARN, None, message);
	}

	/// Emits `message` at info level.
	pub fn info(&self, message: &str) {
		self.emit(Level::INFO, None, message);
	}

	/// Emits `message` at debug level.
	pub fn debug(&self, message: &str) {
		self.emit(Level::DEBUG, None, message);
	}

	/// Emits a named event, decorated with its enrichment marker if one is registered.
	pub fn event(&self, level: Level, event: &str, message: &str) {
		self.emit(level, Some(event), message);
	}

	fn emit(&self, level: Level, event: Option<&str>, message: &str) {
		let marker = event.and_then(enrichment::marker);
		let marker = marker.as_deref().map(|marker| marker.0.as_str());
		let logger = &*self.name;
		match level {
			Level::ERROR => tracing::error!(logger, event, marker, "{message}"),
			Level::WARN => tracing::warn!(logger, event, marker, "{message}"),
			Level::INFO => tracing::info!(logger, event, marker, "{message}"),
			Level::DEBUG => tracing::debug!(logger, event, marker, "{message}"),
			Level::TRACE => tracing::trace!(logger, event, marker, "{message}"),
		}
	}
}

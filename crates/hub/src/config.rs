//! Hub configuration.
//!
//! Layers, lowest precedence first: built-in defaults, the TOML file named by
//! `KEYSTONE_CONFIG`, then `KEYSTONE_LOG` for the log level.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Names a TOML config file to load.
pub const CONFIG_ENV: &str = "KEYSTONE_CONFIG";
/// Overrides `log.level`.
pub const LOG_ENV: &str = "KEYSTONE_LOG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read config {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("invalid config {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HubConfig {
	/// Program name shown by the CLI and given to the default logger.
	pub app_name: String,
	pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
	/// `EnvFilter` directive, e.g. `info` or `keystone_hub=debug`.
	pub level: String,
	/// Number of records kept by the capture buffer.
	pub capture_capacity: usize,
}

impl Default for HubConfig {
	fn default() -> Self {
		Self {
			app_name: "keystone".to_string(),
			log: LogConfig::default(),
		}
	}
}

impl Default for LogConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
			capture_capacity: crate::logging::DEFAULT_CAPTURE_CAPACITY,
		}
	}
}

impl HubConfig {
	/// Parses `content`; `path` only names the source in errors.
	pub fn from_toml_str(path: &Path, content: &str) -> Result<Self, ConfigError> {
		toml::from_str(content).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})
	}

	/// Reads and parses the TOML file at `path`.
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(path, &content)
	}

	/// Loads the config named by the environment.
	pub fn load() -> Result<Self, ConfigError> {
		let file = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
		let level = std::env::var(LOG_ENV).ok();
		Self::load_from(file.as_deref(), level)
	}

	/// Loads `file` (or the defaults) and applies a log level override.
	pub fn load_from(file: Option<&Path>, level: Option<String>) -> Result<Self, ConfigError> {
		let mut config = match file {
			Some(path) => Self::from_file(path)?,
			None => Self::default(),
		};
		if let Some(level) = level.filter(|level| !level.trim().is_empty()) {
			config.log.level = level;
		}
		Ok(config)
	}
}

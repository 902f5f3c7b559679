use std::fmt;
use std::str::FromStr;

use crate::RegistryError;

/// Named partition of a registry.
///
/// The set is closed: adding a partition means adding a variant here, not inventing
/// a string at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
	/// Service instances, factories and settings resolved by logical name.
	Component,
	/// Command handlers keyed by dot-qualified path (`db.migrate`).
	Command,
	/// Event-name to marker mappings used to decorate log output.
	Enrichment,
}

impl Dimension {
	/// Every dimension, in declaration order.
	pub const ALL: [Dimension; 3] = [Self::Component, Self::Command, Self::Enrichment];

	/// Stable lowercase name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Component => "component",
			Self::Command => "command",
			Self::Enrichment => "enrichment",
		}
	}
}

impl fmt::Display for Dimension {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Dimension {
	type Err = RegistryError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|dim| dim.as_str() == s)
			.ok_or_else(|| RegistryError::UnknownDimension(s.to_string()))
	}
}

/// Unique, case-sensitive identity of a registry entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegistryKey {
	pub dimension: Dimension,
	pub name: String,
}

impl RegistryKey {
	/// Key for `name` within `dimension`.
	pub fn new(dimension: Dimension, name: impl Into<String>) -> Self {
		Self {
			dimension,
			name: name.into(),
		}
	}
}

impl fmt::Display for RegistryKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.dimension, self.name)
	}
}

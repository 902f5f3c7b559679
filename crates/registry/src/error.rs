use crate::Dimension;

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;

/// Generic registry error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// No entry and no alias matched the requested name.
	#[error("unknown {dimension}: {name}")]
	NotFound { dimension: Dimension, name: String },

	/// Strict registration found an existing entry under the same key.
	#[error("{dimension} '{name}' is already registered")]
	Duplicate { dimension: Dimension, name: String },

	/// Strict registration used a name that is already an alias of another entry.
	#[error("{dimension} '{name}' is already an alias of '{owner}'")]
	AliasConflict {
		dimension: Dimension,
		name: String,
		owner: String,
	},

	/// The entry exists but holds a different type than the caller asked for.
	#[error("{dimension} '{name}' holds {actual}, not {expected}")]
	TypeMismatch {
		dimension: Dimension,
		name: String,
		expected: &'static str,
		actual: &'static str,
	},

	/// An entry was offered to a store that only accepts another dimension.
	#[error("expected a {expected} entry, got {actual} '{name}'")]
	WrongDimension {
		expected: Dimension,
		actual: Dimension,
		name: String,
	},

	#[error("unknown dimension: {0}")]
	UnknownDimension(String),
}

impl RegistryError {
	/// Lookup miss for `name` in `dimension`.
	pub fn not_found(dimension: Dimension, name: impl Into<String>) -> Self {
		Self::NotFound {
			dimension,
			name: name.into(),
		}
	}

	/// Returns true for lookup misses.
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound { .. })
	}
}

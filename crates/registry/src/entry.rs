use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use crate::{Dimension, RegistryKey};

/// Type-erased value held by a registry entry.
pub type Value = Arc<dyn Any + Send + Sync>;

/// A registered value plus its lookup and presentation metadata.
///
/// Built with the `with_*` methods, then frozen behind an `Arc` by
/// [`Registry::register`](crate::Registry::register). An update is a full replacement.
#[derive(Clone)]
pub struct RegistryEntry {
	key: RegistryKey,
	value: Value,
	type_name: &'static str,
	aliases: BTreeSet<String>,
	hidden: bool,
	category: Option<String>,
	metadata: BTreeMap<String, serde_json::Value>,
}

impl RegistryEntry {
	/// Creates an entry owning `value`.
	pub fn new<T>(dimension: Dimension, name: impl Into<String>, value: T) -> Self
	where
		T: Any + Send + Sync,
	{
		Self::from_arc(dimension, name, Arc::new(value))
	}

	/// Creates an entry sharing an existing `Arc`.
	pub fn from_arc<T>(dimension: Dimension, name: impl Into<String>, value: Arc<T>) -> Self
	where
		T: Any + Send + Sync,
	{
		Self::with_type_name(dimension, name, value, std::any::type_name::<T>())
	}

	/// Creates an entry from an already type-erased value.
	pub fn from_value(dimension: Dimension, name: impl Into<String>, value: Value) -> Self {
		Self::with_type_name(dimension, name, value, "dyn Any")
	}

	fn with_type_name(dimension: Dimension, name: impl Into<String>, value: Value, type_name: &'static str) -> Self {
		Self {
			key: RegistryKey::new(dimension, name),
			value,
			type_name,
			aliases: BTreeSet::new(),
			hidden: false,
			category: None,
			metadata: BTreeMap::new(),
		}
	}

	/// Adds an alternative lookup name.
	#[must_use]
	pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
		self.aliases.insert(alias.into());
		self
	}

	/// Adds every name in `aliases` as an alternative lookup name.
	#[must_use]
	pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.aliases.extend(aliases.into_iter().map(Into::into));
		self
	}

	/// Marks the entry as omitted from visible listings. Direct lookup still resolves it.
	#[must_use]
	pub fn with_hidden(mut self, hidden: bool) -> Self {
		self.hidden = hidden;
		self
	}

	/// Groups the entry under `category` in listings.
	#[must_use]
	pub fn with_category(mut self, category: impl Into<String>) -> Self {
		self.category = Some(category.into());
		self
	}

	/// Attaches a free-form metadata value under `key`.
	#[must_use]
	pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.metadata.insert(key.into(), value.into());
		self
	}

	/// Dimension and canonical name.
	pub fn key(&self) -> &RegistryKey {
		&self.key
	}

	/// Dimension the entry belongs to.
	pub fn dimension(&self) -> Dimension {
		self.key.dimension
	}

	/// Canonical name.
	pub fn name(&self) -> &str {
		&self.key.name
	}

	/// Type-erased value.
	pub fn value(&self) -> &Value {
		&self.value
	}

	/// Returns the value as `T`, or `None` if it holds another type.
	pub fn value_as<T>(&self) -> Option<Arc<T>>
	where
		T: Any + Send + Sync,
	{
		Arc::clone(&self.value).downcast::<T>().ok()
	}

	/// Type name captured when the entry was built.
	pub fn type_name(&self) -> &'static str {
		self.type_name
	}

	/// Alternative lookup names, sorted.
	pub fn aliases(&self) -> impl Iterator<Item = &str> + '_ {
		self.aliases.iter().map(String::as_str)
	}

	/// True if `alias` is one of the entry's alternative names.
	pub fn has_alias(&self, alias: &str) -> bool {
		self.aliases.contains(alias)
	}

	/// True if the entry is left out of visible listings.
	pub fn is_hidden(&self) -> bool {
		self.hidden
	}

	/// Listing category, if any.
	pub fn category(&self) -> Option<&str> {
		self.category.as_deref()
	}

	/// Every metadata value, by key.
	pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
		&self.metadata
	}

	/// Metadata value stored under `key`.
	pub fn metadata_value(&self, key: &str) -> Option<&serde_json::Value> {
		self.metadata.get(key)
	}
}

impl fmt::Debug for RegistryEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RegistryEntry")
			.field("key", &self.key)
			.field("type", &self.type_name)
			.field("aliases", &self.aliases)
			.field("hidden", &self.hidden)
			.field("category", &self.category)
			.field("metadata", &self.metadata)
			.finish_non_exhaustive()
	}
}

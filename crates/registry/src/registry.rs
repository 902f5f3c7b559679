//! Registry container with atomic publication.
//!
//! # Role
//!
//! Owns the current [`Snapshot`] and the writer lock. Every mutation clones the
//! snapshot (copy-on-write per dimension), edits the copy and swaps it in.

use std::any::Any;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use parking_lot::ReentrantMutex;
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::{Dimension, RegistryEntry, RegistryError, Result, Value};

/// Entries of one dimension plus the alias index pointing into them.
#[derive(Clone, Default)]
struct Table {
	/// Canonical name to entry, in first-registration order.
	entries: IndexMap<String, Arc<RegistryEntry>, FxBuildHasher>,
	/// Alias to canonical name.
	aliases: FxHashMap<String, String>,
}

impl Table {
	fn resolve(&self, name: &str) -> Option<&Arc<RegistryEntry>> {
		self.entries
			.get(name)
			.or_else(|| self.aliases.get(name).and_then(|canonical| self.entries.get(canonical)))
	}

	fn insert(&mut self, entry: Arc<RegistryEntry>) -> Option<Arc<RegistryEntry>> {
		let name = entry.name().to_string();
		let replaced = self.entries.insert(name.clone(), Arc::clone(&entry));
		if let Some(old) = &replaced {
			self.unlink_aliases(old);
		}
		for alias in entry.aliases() {
			self.aliases.insert(alias.to_string(), name.clone());
		}
		replaced
	}

	fn remove(&mut self, name: &str) -> Option<Arc<RegistryEntry>> {
		let removed = self.entries.shift_remove(name)?;
		self.unlink_aliases(&removed);
		Some(removed)
	}

	/// Releases the aliases `entry` owns.
	///
	/// An alias re-claimed by another entry stays with it. An alias still declared by
	/// a remaining entry falls back to the most recently registered declarer.
	fn unlink_aliases(&mut self, entry: &RegistryEntry) {
		for alias in entry.aliases() {
			if !self.aliases.get(alias).is_some_and(|owner| owner == entry.name()) {
				continue;
			}
			let heir = self
				.entries
				.values()
				.rev()
				.find(|other| other.has_alias(alias))
				.map(|other| other.name().to_string());
			match heir {
				Some(heir) => self.aliases.insert(alias.to_string(), heir),
				None => self.aliases.remove(alias),
			};
		}
	}
}

/// Current state of a registry.
#[derive(Clone, Default)]
struct Snapshot {
	tables: FxHashMap<Dimension, Arc<Table>>,
}

impl Snapshot {
	fn table(&self, dimension: Dimension) -> Option<&Table> {
		self.tables.get(&dimension).map(Arc::as_ref)
	}

	fn table_mut(&mut self, dimension: Dimension) -> &mut Table {
		Arc::make_mut(self.tables.entry(dimension).or_default())
	}
}

/// Thread-safe store keyed by `(dimension, name)`.
pub struct Registry {
	label: &'static str,
	snap: ArcSwap<Snapshot>,
	writer: ReentrantMutex<()>,
	/// Bumped by every published write.
	generation: AtomicU64,
}

impl Registry {
	/// Creates an empty registry. `label` names it in log output.
	pub fn new(label: &'static str) -> Self {
		Self {
			label,
			snap: ArcSwap::from_pointee(Snapshot::default()),
			writer: ReentrantMutex::new(()),
			generation: AtomicU64::new(0),
		}
	}

	/// Name given at construction, used in log output.
	pub fn label(&self) -> &'static str {
		self.label
	}

	/// Runs `edit` against a private copy of the snapshot and publishes it.
	///
	/// Whatever `edit` returns outlives the writer guard, so replaced entries are
	/// dropped by the caller after the lock is released.
	fn write<R>(&self, edit: impl FnOnce(&mut Snapshot) -> R) -> R {
		let _writer = self.writer.lock();
		let mut next = Snapshot::clone(&self.snap.load());
		let out = edit(&mut next);
		self.snap.store(Arc::new(next));
		self.generation.fetch_add(1, Ordering::Release);
		out
	}

	/// Number of writes published so far.
	///
	/// Two equal readings mean no entry was registered, replaced or removed in between.
	pub fn generation(&self) -> u64 {
		self.generation.load(Ordering::Acquire)
	}

	/// Registers `entry`, silently replacing any entry under the same key.
	///
	/// Returns the replaced entry, if there was one.
	pub fn register(&self, entry: RegistryEntry) -> Option<Arc<RegistryEntry>> {
		let entry = Arc::new(entry);
		let replaced = self.write(|snap| snap.table_mut(entry.dimension()).insert(Arc::clone(&entry)));
		tracing::trace!(
			registry = self.label,
			key = %entry.key(),
			replaced = replaced.is_some(),
			"registered"
		);
		replaced
	}

	/// Registers `entry` only if its name is neither registered nor an alias.
	pub fn try_register(&self, entry: RegistryEntry) -> Result<()> {
		let _writer = self.writer.lock();
		let snap = self.snap.load();
		if let Some(table) = snap.table(entry.dimension()) {
			if table.entries.contains_key(entry.name()) {
				return Err(RegistryError::Duplicate {
					dimension: entry.dimension(),
					name: entry.name().to_string(),
				});
			}
			if let Some(owner) = table.aliases.get(entry.name()) {
				return Err(RegistryError::AliasConflict {
					dimension: entry.dimension(),
					name: entry.name().to_string(),
					owner: owner.clone(),
				});
			}
		}
		drop(snap);
		self.register(entry);
		Ok(())
	}

	/// Resolves `name` (exact name, then alias) to its entry.
	pub fn entry(&self, dimension: Dimension, name: &str) -> Result<Arc<RegistryEntry>> {
		self.snap
			.load()
			.table(dimension)
			.and_then(|table| table.resolve(name))
			.cloned()
			.ok_or_else(|| RegistryError::not_found(dimension, name))
	}

	/// Resolves `name` (exact name, then alias) to its value.
	pub fn get(&self, dimension: Dimension, name: &str) -> Result<Value> {
		self.entry(dimension, name).map(|entry| Arc::clone(entry.value()))
	}

	/// Resolves `name` and downcasts its value to `T`.
	pub fn get_as<T>(&self, dimension: Dimension, name: &str) -> Result<Arc<T>>
	where
		T: Any + Send + Sync,
	{
		let entry = self.entry(dimension, name)?;
		entry.value_as::<T>().ok_or_else(|| RegistryError::TypeMismatch {
			dimension,
			name: name.to_string(),
			expected: std::any::type_name::<T>(),
			actual: entry.type_name(),
		})
	}

	/// True if `name` resolves, as a name or an alias.
	pub fn contains(&self, dimension: Dimension, name: &str) -> bool {
		self.snap
			.load()
			.table(dimension)
			.is_some_and(|table| table.resolve(name).is_some())
	}

	/// All entries of `dimension`, in first-registration order.
	pub fn list(&self, dimension: Dimension) -> Vec<Arc<RegistryEntry>> {
		self.snap
			.load()
			.table(dimension)
			.map(|table| table.entries.values().cloned().collect())
			.unwrap_or_default()
	}

	/// Entries of `dimension` that are not hidden.
	pub fn list_visible(&self, dimension: Dimension) -> Vec<Arc<RegistryEntry>> {
		let mut entries = self.list(dimension);
		entries.retain(|entry| !entry.is_hidden());
		entries
	}

	/// Number of entries in `dimension`.
	pub fn len(&self, dimension: Dimension) -> usize {
		self.snap
			.load()
			.table(dimension)
			.map_or(0, |table| table.entries.len())
	}

	/// Returns true if no dimension holds any entry.
	pub fn is_empty(&self) -> bool {
		self.snap
			.load()
			.tables
			.values()
			.all(|table| table.entries.is_empty())
	}

	/// Removes the entry registered under the canonical `name`.
	///
	/// Returns false if there was none. Aliases are not accepted here.
	pub fn remove(&self, dimension: Dimension, name: &str) -> bool {
		let writer = self.writer.lock();
		let present = self
			.snap
			.load()
			.table(dimension)
			.is_some_and(|table| table.entries.contains_key(name));
		if !present {
			return false;
		}
		let removed = self.write(|snap| snap.table_mut(dimension).remove(name));
		tracing::trace!(registry = self.label, %dimension, name, "removed");
		drop(writer);
		drop(removed);
		true
	}

	/// Removes every entry of `dimension`, or of all dimensions when `None`.
	///
	/// Returns how many entries were removed.
	pub fn clear(&self, dimension: Option<Dimension>) -> usize {
		let removed: Vec<Arc<Table>> = self.write(|snap| match dimension {
			Some(dim) => snap.tables.remove(&dim).into_iter().collect(),
			None => snap.tables.drain().map(|(_, table)| table).collect(),
		});
		let count: usize = removed.iter().map(|table| table.entries.len()).sum();
		tracing::debug!(
			registry = self.label,
			dimension = dimension.map_or("*", Dimension::as_str),
			count,
			"cleared"
		);
		count
	}
}

impl std::fmt::Debug for Registry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let snap = self.snap.load();
		let mut dbg = f.debug_struct("Registry");
		dbg.field("label", &self.label);
		for dim in Dimension::ALL {
			if let Some(table) = snap.table(dim) {
				dbg.field(dim.as_str(), &table.entries.len());
			}
		}
		dbg.finish()
	}
}

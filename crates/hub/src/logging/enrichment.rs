//! Event-name to marker catalog.
//!
//! Loggers look up the marker for an event name and attach it to the emitted event.
//! The catalog is a plain [`Registry`] restricted to the enrichment dimension.

use std::sync::{Arc, LazyLock};

use keystone_registry::{Dimension, Registry, RegistryEntry};

static CATALOG: LazyLock<Registry> = LazyLock::new(|| Registry::new("enrichment"));

/// Marker text attached to events of one name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker(pub String);

/// Maps `event` to `marker`, replacing any previous marker.
pub fn register_marker(event: impl Into<String>, marker: impl Into<String>) {
	CATALOG.register(RegistryEntry::new(Dimension::Enrichment, event, Marker(marker.into())));
}

/// Marker registered for `event`.
pub fn marker(event: &str) -> Option<Arc<Marker>> {
	CATALOG.get_as::<Marker>(Dimension::Enrichment, event).ok()
}

/// Every `(event, marker)` pair, in registration order.
pub fn markers() -> Vec<(String, String)> {
	CATALOG
		.list(Dimension::Enrichment)
		.into_iter()
		.filter_map(|entry| {
			let marker = entry.value_as::<Marker>()?;
			Some((entry.name().to_string(), marker.0.clone()))
		})
		.collect()
}

/// Empties the catalog. Returns how many markers were removed.
pub fn clear() -> usize {
	CATALOG.clear(None)
}

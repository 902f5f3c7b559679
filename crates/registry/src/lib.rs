//! Dimension-keyed registry for components, commands and enrichment data.
//!
//! # Purpose
//!
//! A [`Registry`] stores type-erased values under a `(dimension, name)` key together
//! with lookup aliases, a visibility flag, an optional category and free-form metadata.
//! It is the single source of truth for everything the hub hands out: service
//! instances in the component dimension, command handlers in the command dimension.
//!
//! # Mental Model
//!
//! 1. **Entry:** A [`RegistryEntry`] is assembled with builder methods, then frozen
//!    behind an `Arc` when registered. It is never mutated afterwards.
//! 2. **Publication:** Every write builds a new snapshot from the current
//!    one and swaps it in atomically. Readers see the whole old state or the whole new
//!    state, never a half-applied write.
//! 3. **Lookup:** Exact name first, then alias. A miss is a [`RegistryError::NotFound`]
//!    carrying the dimension and the requested name.
//!
//! # Concurrency
//!
//! - **Reads:** Wait-free (atomic load of the current snapshot).
//! - **Writes:** Serialized on one reentrant lock held only for the map edit.
//!
//! # Invariants
//!
//! - At most one entry per key; re-registration replaces (last write wins).
//!   - Enforced in: [`Registry::register`].
//!   - Tested by: `tests::register_twice_keeps_last_value`, `tests::prop_last_write_wins`.
//!
//! - Concurrent registrations of distinct keys are never lost.
//!   - Enforced in: [`Registry::register`] (writer lock around load/modify/store).
//!   - Tested by: `tests::concurrent_registration_loses_nothing`.
//!
//! - Replaced and removed values are dropped after the writer lock is released.
//!   - Enforced in: `Registry::write`.
//!   - Tested by: `tests::value_drop_may_reenter_registry`.
//!
//! - An alias resolves while any entry still declares it; the most recent declarer owns it.
//!   - Enforced in: `Table::unlink_aliases`.
//!   - Tested by: `tests::alias_falls_back_to_remaining_declarer`.
//!
//! - Every published write advances [`Registry::generation`].
//!   - Enforced in: `Registry::write`.
//!   - Tested by: `tests::generation_advances_on_every_write`.

mod dimension;
mod entry;
mod error;
mod registry;

pub use dimension::{Dimension, RegistryKey};
pub use entry::{RegistryEntry, Value};
pub use error::{RegistryError, Result};
pub use registry::Registry;

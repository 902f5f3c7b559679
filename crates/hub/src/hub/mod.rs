//! The hub facade and the process-wide hub slot.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwapOption;
use keystone_registry::{Dimension, Registry, RegistryEntry, RegistryError, Value};
use parking_lot::Mutex;

use crate::bootstrap::{self, publish_once};
use crate::cli::{Cli, CommandDef};
use crate::config::HubConfig;
use crate::logging::LogEngine;
use crate::metrics;
use crate::setup;
use crate::tree::{CommandNode, TreeError};

/// Component name of the default [`Logger`](crate::Logger).
pub const LOGGER_COMPONENT: &str = "logger";

static HUB: LazyLock<ArcSwapOption<Hub>> = LazyLock::new(ArcSwapOption::empty);

/// Registers components and commands and assembles the command line.
///
/// A plain value: construct one with [`Hub::new`] to inject it, or share the
/// process-wide one through [`global`].
#[derive(Debug)]
pub struct Hub {
	config: Arc<HubConfig>,
	components: Registry,
	commands: Registry,
	initialized: AtomicBool,
	degraded: bool,
}

impl Hub {
	/// Empty hub using `config`.
	pub fn new(config: Arc<HubConfig>) -> Self {
		Self {
			config,
			components: Registry::new("components"),
			commands: Registry::new("commands"),
			initialized: AtomicBool::new(false),
			degraded: false,
		}
	}

	/// Hub with no foundation services, handed out when bootstrap recursion is cut off.
	pub fn fallback() -> Self {
		Self {
			degraded: true,
			..Self::new(Arc::new(HubConfig::default()))
		}
	}

	/// Configuration the hub was built with.
	pub fn config(&self) -> &HubConfig {
		&self.config
	}

	/// True for a hub built by [`Hub::fallback`].
	pub fn is_degraded(&self) -> bool {
		self.degraded
	}

	/// Registry backing the component operations.
	pub fn components(&self) -> &Registry {
		&self.components
	}

	/// Registry backing the command operations.
	pub fn commands(&self) -> &Registry {
		&self.commands
	}

	/// Registers `value` as component `name`, replacing any previous one.
	pub fn add_component<T>(&self, name: impl Into<String>, value: T) -> Option<Arc<RegistryEntry>>
	where
		T: Any + Send + Sync,
	{
		self.register(&self.components, RegistryEntry::new(Dimension::Component, name, value))
	}

	/// Registers a prepared component entry, carrying aliases and metadata.
	pub fn add_component_entry(&self, entry: RegistryEntry) -> Result<Option<Arc<RegistryEntry>>, RegistryError> {
		if entry.dimension() != Dimension::Component {
			return Err(RegistryError::WrongDimension {
				expected: Dimension::Component,
				actual: entry.dimension(),
				name: entry.name().to_string(),
			});
		}
		Ok(self.register(&self.components, entry))
	}

	/// Registers component `name` unless one is already registered.
	pub fn try_add_component<T>(&self, name: impl Into<String>, value: T) -> Result<(), RegistryError>
	where
		T: Any + Send + Sync,
	{
		self.components
			.try_register(RegistryEntry::new(Dimension::Component, name, value))?;
		metrics::counters().record_registration();
		Ok(())
	}

	/// Component value by name or alias.
	pub fn get_component(&self, name: &str) -> Result<Value, RegistryError> {
		record_lookup(self.components.get(Dimension::Component, name))
	}

	/// Component by name or alias, downcast to `T`.
	pub fn get_component_as<T>(&self, name: &str) -> Result<Arc<T>, RegistryError>
	where
		T: Any + Send + Sync,
	{
		record_lookup(self.components.get_as::<T>(Dimension::Component, name))
	}

	/// Every component entry, in first-registration order.
	pub fn list_components(&self) -> Vec<Arc<RegistryEntry>> {
		self.components.list(Dimension::Component)
	}

	/// Removes component `name`. Returns false if there was none.
	pub fn remove_component(&self, name: &str) -> bool {
		self.components.remove(Dimension::Component, name)
	}

	/// Registers `def` under the dot-qualified `name`, replacing any previous command.
	pub fn register_command(&self, name: impl Into<String>, def: CommandDef) -> Option<Arc<RegistryEntry>> {
		self.register(&self.commands, def.into_entry(name))
	}

	/// Registers `def` unless a command is already registered under `name`.
	pub fn try_register_command(&self, name: impl Into<String>, def: CommandDef) -> Result<(), RegistryError> {
		self.commands.try_register(def.into_entry(name))?;
		metrics::counters().record_registration();
		Ok(())
	}

	/// Command entry by qualified name or alias.
	pub fn command(&self, name: &str) -> Result<Arc<RegistryEntry>, RegistryError> {
		record_lookup(self.commands.entry(Dimension::Command, name))
	}

	/// Every command entry, hidden ones included.
	pub fn list_commands(&self) -> Vec<Arc<RegistryEntry>> {
		self.commands.list(Dimension::Command)
	}

	/// Command entries that are not hidden.
	pub fn list_visible_commands(&self) -> Vec<Arc<RegistryEntry>> {
		self.commands.list_visible(Dimension::Command)
	}

	fn register(&self, registry: &Registry, entry: RegistryEntry) -> Option<Arc<RegistryEntry>> {
		metrics::counters().record_registration();
		registry.register(entry)
	}

	/// Builds the command tree from the current registrations.
	///
	/// The tree is rebuilt on every call, so commands registered since the last call
	/// are included. Names, aliases and options that would make the command line
	/// ambiguous are reported here, see [`CommandNode::validate`].
	pub fn create_cli(&self) -> Result<Cli, TreeError> {
		let root = CommandNode::build(&self.commands)?;
		tracing::debug!(commands = root.command_count(), "assembled command tree");
		Cli::new(self.config.app_name.clone(), root)
	}

	/// Registers the foundation services once.
	///
	/// The first call fetches the default logger from the logging engine and registers
	/// it as [`LOGGER_COMPONENT`]. Later calls, and calls on a fallback hub, do nothing.
	pub fn initialize_foundation(&self) {
		if self.degraded || self.initialized.swap(true, Ordering::AcqRel) {
			return;
		}
		let engine = LogEngine::global();
		let logger = engine.logger(self.config.app_name.clone());
		self.add_component(LOGGER_COMPONENT, logger);
		tracing::debug!(
			app = %self.config.app_name,
			degraded_logging = engine.is_degraded(),
			"foundation initialized"
		);
	}

	/// True once [`Hub::initialize_foundation`] has run.
	pub fn is_initialized(&self) -> bool {
		self.initialized.load(Ordering::Acquire)
	}

	/// Empties both registries and re-arms [`Hub::initialize_foundation`].
	///
	/// Returns how many entries were removed.
	pub fn clear(&self) -> usize {
		let removed = self.components.clear(None) + self.commands.clear(None);
		self.initialized.store(false, Ordering::Release);
		removed
	}
}

impl Default for Hub {
	fn default() -> Self {
		Self::new(Arc::new(HubConfig::default()))
	}
}

fn record_lookup<T>(result: Result<T, RegistryError>) -> Result<T, RegistryError> {
	metrics::counters().record_lookup(result.is_ok());
	result
}

/// Returns the process-wide hub, building and publishing it on first use.
///
/// Building initializes the foundation, which needs the logging engine, which reads
/// its settings from this hub. The cycle is cut by the bootstrap guard: only the
/// outermost build is published.
pub fn global() -> Arc<Hub> {
	if let Some(hub) = HUB.load_full() {
		return hub;
	}
	bootstrap::bootstrap(
		"hub",
		|guard| {
			let hub = Arc::new(Hub::new(setup::config()));
			hub.initialize_foundation();
			if guard.is_outermost() {
				publish_once(&HUB, hub)
			} else {
				hub
			}
		},
		|| Arc::new(Hub::fallback()),
	)
}

/// Published hub, without building one.
pub fn peek() -> Option<Arc<Hub>> {
	HUB.load_full()
}

/// Publishes `hub`, returning the previously published one.
pub fn install(hub: Arc<Hub>) -> Option<Arc<Hub>> {
	HUB.swap(Some(hub))
}

/// Unpublishes the hub. Returns false if none was published.
pub fn clear_global() -> bool {
	HUB.swap(None).is_some()
}

/// Global hub with its foundation initialized.
pub fn initialize_foundation() -> Arc<Hub> {
	let hub = global();
	hub.initialize_foundation();
	hub
}

/// Last assembled command line and the state it was assembled from.
#[derive(Default)]
struct CliCache {
	current: Mutex<Option<CachedCli>>,
}

struct CachedCli {
	hub: Arc<Hub>,
	generation: u64,
	cli: Arc<Cli>,
}

/// Command line of the global hub.
///
/// Reassembled whenever the global hub or its command registrations changed since
/// the last call; otherwise the previous [`Cli`] is shared. The cache lives in the
/// setup coordinator and is dropped by the reset protocol.
pub fn global_cli() -> Result<Arc<Cli>, TreeError> {
	let cache = setup::memoize("cli", CliCache::default);
	let hub = global();
	let mut current = cache.current.lock();
	if let Some(cached) = current.as_ref()
		&& Arc::ptr_eq(&cached.hub, &hub)
		&& cached.generation == hub.commands.generation()
	{
		return Ok(Arc::clone(&cached.cli));
	}
	let generation = hub.commands.generation();
	let cli = Arc::new(hub.create_cli()?);
	*current = Some(CachedCli {
		hub,
		generation,
		cli: Arc::clone(&cli),
	});
	Ok(cli)
}

#[cfg(test)]
mod tests;

//! Memoized one-time setup steps.
//!
//! A step runs at most once per process until the reset protocol clears the cache.
//! Initializers run without the cache lock held, so a step may depend on another
//! step. Two threads racing on the same step may both run the initializer; the
//! first result stored wins and is what both receive.

use std::any::{Any, TypeId};
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::config::HubConfig;

type StepKey = (&'static str, TypeId);

static SETUP: LazyLock<SetupCoordinator> = LazyLock::new(SetupCoordinator::default);

/// Global coordinator.
pub fn coordinator() -> &'static SetupCoordinator {
	&SETUP
}

/// Memoizes `init` under `step` in the global coordinator.
pub fn memoize<T>(step: &'static str, init: impl FnOnce() -> T) -> Arc<T>
where
	T: Any + Send + Sync,
{
	SETUP.memoize(step, init)
}

/// Process configuration, loaded once.
///
/// A config that fails to load is logged and replaced by the defaults.
pub fn config() -> Arc<HubConfig> {
	memoize("config", || {
		HubConfig::load().unwrap_or_else(|error| {
			tracing::warn!(%error, "falling back to default configuration");
			HubConfig::default()
		})
	})
}

#[derive(Default)]
pub struct SetupCoordinator {
	steps: Mutex<FxHashMap<StepKey, Arc<dyn Any + Send + Sync>>>,
}

impl SetupCoordinator {
	/// Result of `step`, running `init` the first time.
	pub fn memoize<T>(&self, step: &'static str, init: impl FnOnce() -> T) -> Arc<T>
	where
		T: Any + Send + Sync,
	{
		if let Some(done) = self.lookup::<T>(step) {
			return done;
		}
		let fresh = Arc::new(init());
		self.store(step, fresh)
	}

	/// Like [`memoize`](Self::memoize), but a failed initializer is not cached.
	pub fn try_memoize<T, E>(&self, step: &'static str, init: impl FnOnce() -> Result<T, E>) -> Result<Arc<T>, E>
	where
		T: Any + Send + Sync,
	{
		if let Some(done) = self.lookup::<T>(step) {
			return Ok(done);
		}
		let fresh = Arc::new(init()?);
		Ok(self.store(step, fresh))
	}

	fn lookup<T>(&self, step: &'static str) -> Option<Arc<T>>
	where
		T: Any + Send + Sync,
	{
		let steps = self.steps.lock();
		let done = steps.get(&(step, TypeId::of::<T>()))?;
		Arc::clone(done).downcast::<T>().ok()
	}

	fn store<T>(&self, step: &'static str, fresh: Arc<T>) -> Arc<T>
	where
		T: Any + Send + Sync,
	{
		let mut steps = self.steps.lock();
		let slot = steps
			.entry((step, TypeId::of::<T>()))
			.or_insert_with(|| Arc::clone(&fresh) as Arc<dyn Any + Send + Sync>);
		match Arc::clone(slot).downcast::<T>() {
			Ok(stored) => stored,
			Err(_) => fresh,
		}
	}

	/// True if `step` has a stored result of any type.
	pub fn is_complete(&self, step: &str) -> bool {
		self.steps.lock().keys().any(|(name, _)| *name == step)
	}

	/// Names of the completed steps, sorted.
	pub fn completed(&self) -> Vec<&'static str> {
		let mut names: Vec<_> = self.steps.lock().keys().map(|(name, _)| *name).collect();
		names.sort_unstable();
		names.dedup();
		names
	}

	/// Forgets every memoized result. Returns how many there were.
	pub fn clear(&self) -> usize {
		let drained: Vec<_> = self.steps.lock().drain().collect();
		drained.len()
	}
}

impl std::fmt::Debug for SetupCoordinator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SetupCoordinator")
			.field("completed", &self.completed())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[test]
	fn step_runs_once_until_cleared() {
		let setup = SetupCoordinator::default();
		let runs = AtomicUsize::new(0);
		let init = || {
			runs.fetch_add(1, Ordering::SeqCst);
			42u32
		};

		let first = setup.memoize("answer", init);
		let second = setup.memoize("answer", init);
		assert!(Arc::ptr_eq(&first, &second));
		assert_eq!(runs.load(Ordering::SeqCst), 1);
		assert!(setup.is_complete("answer"));

		assert_eq!(setup.clear(), 1);
		setup.memoize("answer", init);
		assert_eq!(runs.load(Ordering::SeqCst), 2);
	}

	#[test]
	fn failed_step_is_retried() {
		let setup = SetupCoordinator::default();
		let failed: Result<Arc<u32>, &str> = setup.try_memoize("flaky", || Err("not yet"));
		assert!(failed.is_err());
		assert!(!setup.is_complete("flaky"));

		let ok: Result<Arc<u32>, &str> = setup.try_memoize("flaky", || Ok(7));
		assert_eq!(*ok.unwrap(), 7);
	}

	#[test]
	fn step_may_depend_on_another_step() {
		let setup = SetupCoordinator::default();
		let total = setup.memoize("total", || *setup.memoize("base", || 40u32) + 2);
		assert_eq!(*total, 42);
		assert_eq!(setup.completed(), vec!["base", "total"]);
	}
}

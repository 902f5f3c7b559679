//! Recursion guard for mutually dependent singletons.
//!
//! The global hub needs a logger from the logging engine, and the logging engine
//! reads its settings from the global hub. Each accessor builds inside a
//! [`BootstrapGuard`]; the guard counts how deep the current thread is in such a
//! chain, and past [`MAX_DEPTH`] the accessor returns a dependency-free fallback
//! instead of recursing.

use std::cell::Cell;
use std::marker::PhantomData;
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::metrics;

/// Deepest nesting at which a full construction is still attempted.
pub const MAX_DEPTH: usize = 3;

thread_local! {
	static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Scope guard for one level of a bootstrap chain.
///
/// Entering increments the calling thread's depth; dropping the guard decrements
/// it again, on unwind too.
#[derive(Debug)]
pub struct BootstrapGuard {
	depth: usize,
	// Depth is thread-local; the guard must be dropped on the thread that made it.
	_not_send: PhantomData<*const ()>,
}

impl BootstrapGuard {
	/// Enters one bootstrap level on the current thread.
	pub fn enter() -> Self {
		let depth = DEPTH.with(|cell| {
			let next = cell.get() + 1;
			cell.set(next);
			next
		});
		Self {
			depth,
			_not_send: PhantomData,
		}
	}

	/// Depth of this guard, 1 for the outermost call of a chain.
	pub fn depth(&self) -> usize {
		self.depth
	}

	/// True for the first level of a chain, the only one allowed to publish.
	pub fn is_outermost(&self) -> bool {
		self.depth == 1
	}

	/// True once the chain is deeper than [`MAX_DEPTH`].
	pub fn exceeded(&self) -> bool {
		self.depth > MAX_DEPTH
	}
}

impl Drop for BootstrapGuard {
	fn drop(&mut self) {
		// `try_with`: the guard may outlive the slot during thread teardown.
		let _ = DEPTH.try_with(|cell| cell.set(cell.get().saturating_sub(1)));
	}
}

/// Current bootstrap depth of the calling thread. Zero outside any chain.
pub fn current_depth() -> usize {
	DEPTH.with(Cell::get)
}

/// Runs `full` under a fresh guard level, or `fallback` once [`MAX_DEPTH`] is passed.
///
/// Falling back is not an error: it is counted and logged at debug level.
pub fn bootstrap<T>(
	what: &'static str,
	full: impl FnOnce(&BootstrapGuard) -> T,
	fallback: impl FnOnce() -> T,
) -> T {
	let guard = BootstrapGuard::enter();
	if guard.exceeded() {
		metrics::counters().record_bootstrap_fallback();
		tracing::debug!(what, depth = guard.depth(), "bootstrap depth exceeded, using fallback");
		return fallback();
	}
	tracing::trace!(what, depth = guard.depth(), "bootstrapping");
	full(&guard)
}

/// Publishes `candidate` into an empty `slot`.
///
/// If another thread published first, its instance is returned and `candidate` is
/// discarded.
pub fn publish_once<T>(slot: &ArcSwapOption<T>, candidate: Arc<T>) -> Arc<T> {
	let previous = slot.compare_and_swap(&None::<Arc<T>>, Some(Arc::clone(&candidate)));
	match &*previous {
		None => candidate,
		Some(winner) => Arc::clone(winner),
	}
}

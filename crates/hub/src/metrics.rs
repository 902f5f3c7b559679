//! Process-wide instrumentation counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

static COUNTERS: Counters = Counters::new();

/// Global counter set.
pub fn counters() -> &'static Counters {
	&COUNTERS
}

/// Current counter values.
pub fn snapshot() -> CounterSnapshot {
	COUNTERS.snapshot()
}

/// Monotonic event counters, zeroed by the reset protocol.
#[derive(Debug)]
pub struct Counters {
	registrations: AtomicU64,
	lookups: AtomicU64,
	lookup_misses: AtomicU64,
	bootstrap_fallbacks: AtomicU64,
	resets: AtomicU64,
}

impl Counters {
	const fn new() -> Self {
		Self {
			registrations: AtomicU64::new(0),
			lookups: AtomicU64::new(0),
			lookup_misses: AtomicU64::new(0),
			bootstrap_fallbacks: AtomicU64::new(0),
			resets: AtomicU64::new(0),
		}
	}

	/// Counts one component or command registration.
	pub fn record_registration(&self) {
		self.registrations.fetch_add(1, Ordering::Relaxed);
	}

	/// Records a lookup and whether it missed.
	pub fn record_lookup(&self, hit: bool) {
		self.lookups.fetch_add(1, Ordering::Relaxed);
		if !hit {
			self.lookup_misses.fetch_add(1, Ordering::Relaxed);
		}
	}

	/// Counts one fallback returned past the bootstrap depth limit.
	pub fn record_bootstrap_fallback(&self) {
		self.bootstrap_fallbacks.fetch_add(1, Ordering::Relaxed);
	}

	/// Counts one reset protocol run.
	pub fn record_reset(&self) {
		self.resets.fetch_add(1, Ordering::Relaxed);
	}

	/// Current counter values.
	pub fn snapshot(&self) -> CounterSnapshot {
		CounterSnapshot {
			registrations: self.registrations.load(Ordering::Relaxed),
			lookups: self.lookups.load(Ordering::Relaxed),
			lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
			bootstrap_fallbacks: self.bootstrap_fallbacks.load(Ordering::Relaxed),
			resets: self.resets.load(Ordering::Relaxed),
		}
	}

	/// Zeroes every counter.
	pub fn reset(&self) {
		for counter in [
			&self.registrations,
			&self.lookups,
			&self.lookup_misses,
			&self.bootstrap_fallbacks,
			&self.resets,
		] {
			counter.store(0, Ordering::Relaxed);
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
	pub registrations: u64,
	pub lookups: u64,
	pub lookup_misses: u64,
	pub bootstrap_fallbacks: u64,
	pub resets: u64,
}

//! Bounded buffer of captured log records.

use std::collections::VecDeque;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::Level;

/// Records kept when no capacity is configured.
pub const DEFAULT_CAPTURE_CAPACITY: usize = 1000;

/// Global capture buffer fed by [`CaptureLayer`](super::CaptureLayer).
pub static LOG_BUFFER: LazyLock<LogBuffer> = LazyLock::new(|| LogBuffer::with_capacity(DEFAULT_CAPTURE_CAPACITY));

/// One captured event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
	pub level: Level,
	pub target: String,
	/// Name of the [`Logger`](super::Logger) that emitted the event, if any.
	pub logger: Option<String>,
	/// Enrichment marker attached to the event, if any.
	pub marker: Option<String>,
	pub message: String,
	pub fields: Vec<(String, String)>,
}

/// Ring buffer evicting the oldest record when full.
#[derive(Debug)]
pub struct LogBuffer {
	records: RwLock<VecDeque<LogRecord>>,
	capacity: AtomicUsize,
	/// Live [`CapturePause`] guards.
	pauses: AtomicUsize,
}

impl LogBuffer {
	/// Empty buffer holding at most `capacity` records.
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			records: RwLock::new(VecDeque::new()),
			capacity: AtomicUsize::new(capacity),
			pauses: AtomicUsize::new(0),
		}
	}

	/// Drops every pushed record until the returned guard is dropped.
	///
	/// Pauses nest and apply to all threads.
	pub fn pause(&self) -> CapturePause<'_> {
		self.pauses.fetch_add(1, Ordering::AcqRel);
		CapturePause { buffer: self }
	}

	/// True while at least one [`CapturePause`] is alive.
	pub fn is_paused(&self) -> bool {
		self.pauses.load(Ordering::Acquire) > 0
	}

	/// Maximum number of records kept.
	pub fn capacity(&self) -> usize {
		self.capacity.load(Ordering::Relaxed)
	}

	/// Changes the capacity, evicting the oldest records that no longer fit.
	pub fn set_capacity(&self, capacity: usize) {
		self.capacity.store(capacity, Ordering::Relaxed);
		let mut records = self.records.write();
		while records.len() > capacity {
			records.pop_front();
		}
	}

	/// Appends `record`, evicting the oldest when full. Dropped while paused.
	pub fn push(&self, record: LogRecord) {
		let capacity = self.capacity();
		if capacity == 0 || self.is_paused() {
			return;
		}
		let mut records = self.records.write();
		while records.len() >= capacity {
			records.pop_front();
		}
		records.push_back(record);
	}

	/// Every record, oldest first.
	pub fn records(&self) -> Vec<LogRecord> {
		self.records.read().iter().cloned().collect()
	}

	/// The newest `limit` records, oldest first.
	pub fn tail(&self, limit: usize) -> Vec<LogRecord> {
		let records = self.records.read();
		records.iter().skip(records.len().saturating_sub(limit)).cloned().collect()
	}

	/// Number of records held.
	pub fn len(&self) -> usize {
		self.records.read().len()
	}

	/// True if no record is held.
	pub fn is_empty(&self) -> bool {
		self.records.read().is_empty()
	}

	/// Drops every record. Returns how many there were.
	pub fn clear(&self) -> usize {
		let mut records = self.records.write();
		let count = records.len();
		records.clear();
		count
	}
}

/// Guard returned by [`LogBuffer::pause`].
#[derive(Debug)]
#[must_use = "capture resumes as soon as the guard is dropped"]
pub struct CapturePause<'a> {
	buffer: &'a LogBuffer,
}

impl Drop for CapturePause<'_> {
	fn drop(&mut self) {
		self.buffer.pauses.fetch_sub(1, Ordering::AcqRel);
	}
}

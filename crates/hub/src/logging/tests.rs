use pretty_assertions::assert_eq;
use serial_test::serial;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;

use super::*;

fn record(message: &str) -> LogRecord {
	LogRecord {
		level: Level::INFO,
		target: "test".to_string(),
		logger: None,
		marker: None,
		message: message.to_string(),
		fields: Vec::new(),
	}
}

fn messages(records: &[LogRecord]) -> Vec<&str> {
	records.iter().map(|record| record.message.as_str()).collect()
}

#[test]
fn buffer_evicts_oldest_when_full() {
	let buffer = LogBuffer::with_capacity(2);
	for message in ["a", "b", "c"] {
		buffer.push(record(message));
	}
	assert_eq!(messages(&buffer.records()), vec!["b", "c"]);
}

#[test]
fn shrinking_capacity_keeps_newest() {
	let buffer = LogBuffer::with_capacity(4);
	for message in ["a", "b", "c", "d"] {
		buffer.push(record(message));
	}
	buffer.set_capacity(2);
	assert_eq!(messages(&buffer.records()), vec!["c", "d"]);
	assert_eq!(messages(&buffer.tail(1)), vec!["d"]);
	assert_eq!(buffer.clear(), 2);
	assert!(buffer.is_empty());
}

#[test]
fn zero_capacity_disables_capture() {
	let buffer = LogBuffer::with_capacity(0);
	buffer.push(record("dropped"));
	assert_eq!(buffer.len(), 0);
}

#[test]
fn paused_buffer_drops_records_until_every_guard_is_gone() {
	let buffer = LogBuffer::with_capacity(4);
	buffer.push(record("kept"));

	let outer = buffer.pause();
	let inner = buffer.pause();
	buffer.push(record("dropped"));
	drop(inner);
	assert!(buffer.is_paused());
	buffer.push(record("dropped too"));
	drop(outer);

	assert!(!buffer.is_paused());
	buffer.push(record("resumed"));
	assert_eq!(messages(&buffer.records()), vec!["kept", "resumed"]);
}

#[test]
#[serial]
fn logger_events_are_captured_with_marker() {
	LOG_BUFFER.clear();
	enrichment::register_marker("db.migrated", "[db]");
	let logger = LogEngine::new(LogSettings::default()).logger("inventory");

	let subscriber = tracing_subscriber::registry().with(CaptureLayer::new());
	tracing::subscriber::with_default(subscriber, || {
		logger.event(Level::INFO, "db.migrated", "schema is current");
		logger.warn("disk almost full");
	});

	let records = LOG_BUFFER.records();
	assert_eq!(messages(&records), vec!["schema is current", "disk almost full"]);
	assert_eq!(records[0].logger.as_deref(), Some("inventory"));
	assert_eq!(records[0].marker.as_deref(), Some("[db]"));
	assert_eq!(records[0].fields, vec![("event".to_string(), "db.migrated".to_string())]);
	assert_eq!(records[1].level, Level::WARN);
	assert_eq!(records[1].marker, None);

	enrichment::clear();
	LOG_BUFFER.clear();
}

#[test]
#[serial]
fn enrichment_catalog_replaces_markers() {
	enrichment::clear();
	enrichment::register_marker("http.retry", "[retry]");
	enrichment::register_marker("http.retry", "[again]");

	assert_eq!(
		enrichment::marker("http.retry").map(|marker| marker.0.clone()),
		Some("[again]".to_string())
	);
	assert_eq!(enrichment::markers(), vec![("http.retry".to_string(), "[again]".to_string())]);
	assert_eq!(enrichment::clear(), 1);
	assert!(enrichment::marker("http.retry").is_none());
}

#[test]
fn set_filter_without_subscriber_is_a_no_op() {
	if FILTER.get().is_none() {
		assert!(!set_filter("debug").unwrap());
	}
}

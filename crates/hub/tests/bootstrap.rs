//! Bootstrap of the global hub and the global logging engine.

use std::sync::{Arc, Barrier};
use std::thread;

use keystone_hub::bootstrap::current_depth;
use keystone_hub::hub::{self, LOGGER_COMPONENT};
use keystone_hub::logging::LOG_BUFFER;
use keystone_hub::{Hub, LogEngine, LogSettings, Logger, metrics, reset};
use serial_test::serial;

#[test]
#[serial]
fn hub_and_log_engine_converge() {
	reset::reset();

	let hub = hub::global();
	assert_eq!(current_depth(), 0);
	assert!(!hub.is_degraded());
	assert!(hub.is_initialized());
	assert!(Arc::ptr_eq(&hub, &hub::peek().unwrap()));
	assert!(Arc::ptr_eq(&hub, &hub::global()));

	// The engine built inside the hub's bootstrap was nested, so it stays unpublished.
	assert!(LogEngine::peek().is_none());
	assert_eq!(metrics::snapshot().bootstrap_fallbacks, 1);

	let logger = hub.get_component_as::<Logger>(LOGGER_COMPONENT).unwrap();
	assert_eq!(logger.name(), hub.config().app_name);

	let engine = LogEngine::global();
	assert!(!engine.is_degraded());
	assert!(Arc::ptr_eq(&engine, &LogEngine::peek().unwrap()));
	assert_eq!(current_depth(), 0);

	reset::reset();
}

#[test]
#[serial]
fn engine_first_bootstrap_also_terminates() {
	reset::reset();

	let engine = LogEngine::global();
	assert_eq!(current_depth(), 0);
	assert!(!engine.is_degraded());
	assert!(LogEngine::peek().is_some());

	// The hub built for the engine was nested; the next call builds the real one.
	let hub = hub::global();
	assert!(hub.is_initialized());
	assert!(Arc::ptr_eq(&hub, &hub::global()));

	reset::reset();
}

#[test]
#[serial]
fn log_settings_component_configures_engine() {
	reset::reset();

	let hub = Arc::new(Hub::default());
	hub.add_component(
		LogSettings::COMPONENT,
		LogSettings {
			directive: "debug".to_string(),
			capture_capacity: 5,
		},
	);
	hub::install(Arc::clone(&hub));

	let engine = LogEngine::global();
	assert_eq!(engine.settings().capture_capacity, 5);
	assert_eq!(LOG_BUFFER.capacity(), 5);

	reset::reset();
	assert_eq!(LOG_BUFFER.capacity(), keystone_hub::logging::DEFAULT_CAPTURE_CAPACITY);
}

#[test]
#[serial]
fn concurrent_bootstrap_publishes_one_hub() {
	reset::reset();

	let barrier = Arc::new(Barrier::new(8));
	let handles: Vec<_> = (0..8)
		.map(|_| {
			let barrier = Arc::clone(&barrier);
			thread::spawn(move || {
				barrier.wait();
				let hub = hub::global();
				(hub, current_depth())
			})
		})
		.collect();
	let results: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

	let published = hub::peek().unwrap();
	for (hub, depth) in &results {
		assert!(Arc::ptr_eq(hub, &published));
		assert_eq!(*depth, 0);
	}

	reset::reset();
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use serial_test::serial;

use super::*;
use crate::Hub;

#[test]
fn standard_stage_order() {
	assert_eq!(
		ResetProtocol::standard().stage_names(),
		vec!["output", "logging", "registries", "setup", "enrichment", "counters", "hub"]
	);
}

#[test]
#[serial]
fn failing_stage_does_not_stop_the_sequence() {
	let ran = Arc::new(AtomicUsize::new(0));
	let last = Arc::clone(&ran);
	let protocol = ResetProtocol::new([
		ResetStage::new("ok", || Ok(())),
		ResetStage::new("broken", || Err(ResetStageError::Failed("disk gone".to_string()))),
		ResetStage::new("panics", || panic!("stage blew up")),
		ResetStage::new("absent", || Err(ResetStageError::Absent("cache"))),
		ResetStage::new("last", move || {
			last.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}),
	]);

	let report = protocol.run();

	assert_eq!(ran.load(Ordering::SeqCst), 1);
	assert_eq!(
		report.stages,
		vec![
			("ok", StageStatus::Cleaned),
			("broken", StageStatus::Failed("disk gone".to_string())),
			("panics", StageStatus::Failed("stage blew up".to_string())),
			("absent", StageStatus::Skipped("cache is not initialized".to_string())),
			("last", StageStatus::Cleaned),
		]
	);
	assert!(!report.is_clean());
	assert_eq!(
		report.failures().map(|(name, _)| name).collect::<Vec<_>>(),
		vec!["broken", "panics"]
	);
}

#[test]
#[serial]
fn reset_twice_leaves_everything_empty() {
	let hub = Arc::new(Hub::default());
	hub.add_component("db", 1u8);
	hub.register_command("db.migrate", crate::CommandDef::new(|_| Ok(())));
	hub::install(Arc::clone(&hub));
	setup::memoize("warmup", || 1u8);

	let first = reset();
	assert!(first.is_clean(), "{first:?}");
	assert_eq!(first.status("registries"), Some(&StageStatus::Cleaned));
	assert_eq!(first.status("hub"), Some(&StageStatus::Cleaned));

	let second = reset();
	assert!(second.is_clean(), "{second:?}");
	assert!(matches!(second.status("registries"), Some(StageStatus::Skipped(_))));
	assert!(matches!(second.status("hub"), Some(StageStatus::Skipped(_))));

	assert!(hub.components().is_empty());
	assert!(hub.commands().is_empty());
	assert!(hub::peek().is_none());
	assert!(!setup::coordinator().is_complete("warmup"));
}

#[test]
#[serial]
fn registries_stage_never_builds_a_hub() {
	hub::clear_global();
	let report = ResetProtocol::new([ResetStage::new("registries", reset_registries)]).run();

	assert!(matches!(report.status("registries"), Some(StageStatus::Skipped(_))));
	assert!(hub::peek().is_none());
}

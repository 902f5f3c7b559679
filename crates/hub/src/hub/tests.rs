use std::sync::Arc;

use keystone_registry::{Dimension, RegistryEntry, RegistryError};
use pretty_assertions::assert_eq;

use super::*;
use crate::cli::{CommandDef, Dispatch};

#[derive(Debug, PartialEq, Eq)]
struct Database {
	url: &'static str,
}

fn noop() -> CommandDef {
	CommandDef::new(|_| Ok(()))
}

fn names(entries: &[Arc<RegistryEntry>]) -> Vec<&str> {
	entries.iter().map(|entry| entry.name()).collect()
}

#[test]
fn component_round_trip() {
	let hub = Hub::default();
	hub.add_component("db", Database { url: "postgres://local" });

	let db = hub.get_component_as::<Database>("db").unwrap();
	assert_eq!(db.url, "postgres://local");
	assert!(hub.get_component("db").unwrap().is::<Database>());
}

#[test]
fn missing_component_names_dimension_and_name() {
	let hub = Hub::default();
	let err = hub.get_component("nonexistent").unwrap_err();
	assert_eq!(err, RegistryError::not_found(Dimension::Component, "nonexistent"));
}

#[test]
fn re_adding_component_replaces_it() {
	let hub = Hub::default();
	hub.add_component("port", 8080u16);
	let replaced = hub.add_component("port", 9090u16);

	assert!(replaced.is_some());
	assert_eq!(*hub.get_component_as::<u16>("port").unwrap(), 9090);
	assert_eq!(hub.list_components().len(), 1);
}

#[test]
fn strict_add_keeps_first_component() {
	let hub = Hub::default();
	hub.try_add_component("port", 8080u16).unwrap();
	let err = hub.try_add_component("port", 9090u16).unwrap_err();

	assert!(matches!(err, RegistryError::Duplicate { .. }));
	assert_eq!(*hub.get_component_as::<u16>("port").unwrap(), 8080);
}

#[test]
fn component_entry_keeps_aliases_and_rejects_other_dimensions() {
	let hub = Hub::default();
	hub.add_component_entry(RegistryEntry::new(Dimension::Component, "database", 1u8).with_alias("db"))
		.unwrap();
	assert_eq!(*hub.get_component_as::<u8>("db").unwrap(), 1);

	let err = hub
		.add_component_entry(RegistryEntry::new(Dimension::Command, "db.migrate", ()))
		.unwrap_err();
	assert!(matches!(
		err,
		RegistryError::WrongDimension {
			actual: Dimension::Command,
			..
		}
	));
}

#[test]
fn components_and_commands_do_not_collide() {
	let hub = Hub::default();
	hub.add_component("status", 1u8);
	hub.register_command("status", noop());

	assert!(hub.get_component_as::<u8>("status").is_ok());
	assert!(hub.command("status").is_ok());
	assert_eq!(hub.list_components().len(), 1);
	assert_eq!(hub.list_commands().len(), 1);
}

#[test]
fn hidden_commands_resolve_but_are_not_listed_as_visible() {
	let hub = Hub::default();
	hub.register_command("db.migrate", noop());
	hub.register_command("db.drop", noop().hidden());

	assert_eq!(names(&hub.list_commands()), vec!["db.migrate", "db.drop"]);
	assert_eq!(names(&hub.list_visible_commands()), vec!["db.migrate"]);
	assert!(hub.command("db.drop").unwrap().is_hidden());
}

#[test]
fn command_aliases_resolve_in_registry() {
	let hub = Hub::default();
	hub.register_command("status", noop().alias("s").alias("st"));

	for name in ["status", "s", "st"] {
		assert_eq!(hub.command(name).unwrap().name(), "status");
	}
}

#[test]
fn command_entry_carries_options_and_category() {
	let hub = Hub::default();
	hub.register_command("db.migrate", noop().option("target").category("database"));

	let entry = hub.command("db.migrate").unwrap();
	assert_eq!(entry.category(), Some("database"));
	assert_eq!(entry.metadata_value("options"), Some(&serde_json::json!(["target"])));
}

#[test]
fn create_cli_lists_groups() {
	let hub = Hub::default();
	hub.register_command("db.migrate", noop());
	hub.register_command("db.seed", noop());

	let cli = hub.create_cli().unwrap();
	assert_eq!(cli.name(), "keystone");
	let db = cli.root().find("db").unwrap();
	let children: Vec<_> = db.children().map(|node| node.segment()).collect();
	assert_eq!(children, vec!["migrate", "seed"]);
	assert!(matches!(
		cli.dispatch(&["db", "seed"]).unwrap(),
		Dispatch::Ran { ref command } if command == "db.seed"
	));
}

#[test]
fn create_cli_sees_later_registrations() {
	let hub = Hub::default();
	hub.register_command("a", noop());
	assert_eq!(hub.create_cli().unwrap().root().command_count(), 1);

	hub.register_command("b", noop());
	assert_eq!(hub.create_cli().unwrap().root().command_count(), 2);
}

#[test]
fn create_cli_reports_invalid_names() {
	let hub = Hub::default();
	hub.register_command("db..migrate", noop());
	assert_eq!(
		hub.create_cli().unwrap_err(),
		TreeError::InvalidName {
			name: "db..migrate".to_string()
		}
	);
}

#[test]
fn create_cli_reports_alias_clashing_with_sibling() {
	let hub = Hub::default();
	hub.register_command("db.migrate", noop().alias("seed"));
	hub.register_command("db.seed", noop());

	assert_eq!(
		hub.create_cli().unwrap_err(),
		TreeError::AliasConflict {
			command: "db.migrate".to_string(),
			alias: "seed".to_string(),
			taken_by: "db.seed".to_string(),
		}
	);
}

#[test]
fn fallback_hub_skips_foundation() {
	let hub = Hub::fallback();
	hub.initialize_foundation();

	assert!(hub.is_degraded());
	assert!(!hub.is_initialized());
	assert!(hub.list_components().is_empty());
}

#[test]
fn clear_empties_both_registries() {
	let hub = Hub::default();
	hub.add_component("a", 1u8);
	hub.register_command("b", noop());

	assert_eq!(hub.clear(), 2);
	assert!(hub.components().is_empty());
	assert!(hub.commands().is_empty());
	assert_eq!(hub.clear(), 0);
}

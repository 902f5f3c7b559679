//! Commands every keystone binary ships with.

use keystone_hub::logging::{LOG_BUFFER, enrichment};
use keystone_hub::{CommandDef, CommandError, Hub, Invocation, hub, metrics, reset};
use keystone_registry::RegistryEntry;

/// Registers the builtin commands on `hub`.
pub fn register(hub: &Hub) {
	hub.register_command(
		"components.list",
		CommandDef::new(list_components)
			.about("List registered components")
			.option("category")
			.category("inspect"),
	);
	hub.register_command(
		"commands.list",
		CommandDef::new(list_commands)
			.about("List registered commands")
			.alias("ls")
			.option("hidden")
			.category("inspect"),
	);
	hub.register_command(
		"hub.stats",
		CommandDef::new(stats)
			.about("Print instrumentation counters as JSON")
			.category("inspect"),
	);
	hub.register_command(
		"log.tail",
		CommandDef::new(log_tail)
			.about("Print the most recent captured log records")
			.option("limit")
			.category("inspect"),
	);
	hub.register_command(
		"log.markers",
		CommandDef::new(log_markers)
			.about("List enrichment markers")
			.category("inspect"),
	);
	hub.register_command("hub.reset", CommandDef::new(reset_all).hidden());
}

fn describe(entry: &RegistryEntry) -> String {
	let mut line = entry.name().to_string();
	let aliases: Vec<_> = entry.aliases().collect();
	if !aliases.is_empty() {
		line.push_str(&format!(" ({})", aliases.join(", ")));
	}
	if let Some(category) = entry.category() {
		line.push_str(&format!(" [{category}]"));
	}
	line
}

fn list_components(invocation: &Invocation) -> Result<(), CommandError> {
	let category = invocation.option("category");
	for entry in hub::global().list_components() {
		if category.is_some_and(|wanted| entry.category() != Some(wanted)) {
			continue;
		}
		println!("{}  {}", describe(&entry), entry.type_name());
	}
	Ok(())
}

fn list_commands(invocation: &Invocation) -> Result<(), CommandError> {
	let hub = hub::global();
	let include_hidden = invocation.parsed_option::<bool>("hidden")?.unwrap_or(false);
	let entries = if include_hidden {
		hub.list_commands()
	} else {
		hub.list_visible_commands()
	};
	for entry in entries {
		println!("{}", describe(&entry));
	}
	Ok(())
}

fn stats(_: &Invocation) -> Result<(), CommandError> {
	let json = serde_json::to_string_pretty(&metrics::snapshot()).map_err(|err| CommandError::Failed(err.to_string()))?;
	println!("{json}");
	Ok(())
}

fn log_tail(invocation: &Invocation) -> Result<(), CommandError> {
	let limit = invocation.parsed_option::<usize>("limit")?.unwrap_or(20);
	for record in LOG_BUFFER.tail(limit) {
		let marker = record.marker.as_deref().unwrap_or("");
		println!("{:>5} {} {marker} {}", record.level, record.target, record.message);
	}
	Ok(())
}

fn log_markers(_: &Invocation) -> Result<(), CommandError> {
	for (event, marker) in enrichment::markers() {
		println!("{event}  {marker}");
	}
	Ok(())
}

fn reset_all(_: &Invocation) -> Result<(), CommandError> {
	let report = reset::reset();
	for (stage, status) in &report.stages {
		println!("{stage}: {status:?}");
	}
	match report.failures().next() {
		Some((stage, reason)) => Err(CommandError::Failed(format!("reset stage {stage} failed: {reason}"))),
		None => Ok(()),
	}
}

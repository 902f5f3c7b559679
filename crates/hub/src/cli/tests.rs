use std::sync::Arc;

use keystone_registry::Registry;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;

use super::*;

type Calls = Arc<Mutex<Vec<Invocation>>>;

fn recording(calls: &Calls) -> CommandDef {
	let calls = Arc::clone(calls);
	CommandDef::new(move |invocation| {
		calls.lock().push(invocation.clone());
		Ok(())
	})
}

/// `db` (invocable group), `db.migrate` (alias `m`, option `target`), `db.seed`,
/// hidden `db.drop`, and `status`.
fn fixture() -> (Cli, Calls) {
	let calls = Calls::default();
	let registry = Registry::new("commands");
	let defs = [
		("db", recording(&calls).about("Database tools")),
		(
			"db.migrate",
			recording(&calls).about("Apply migrations").alias("m").option("target"),
		),
		("db.seed", recording(&calls).about("Load fixtures")),
		("db.drop", recording(&calls).hidden()),
		("status", recording(&calls).about("Show status")),
	];
	for (name, def) in defs {
		registry.register(def.into_entry(name));
	}
	let cli = Cli::new("app", CommandNode::build(&registry).unwrap()).unwrap();
	(cli, calls)
}

fn last(calls: &Calls) -> Invocation {
	calls.lock().last().cloned().expect("a handler ran")
}

#[test]
fn dispatch_passes_remaining_args() {
	let (cli, calls) = fixture();
	let outcome = cli.dispatch(&["db", "migrate", "--dry-run", "v2"]).unwrap();

	assert_eq!(
		outcome,
		Dispatch::Ran {
			command: "db.migrate".to_string()
		}
	);
	assert_eq!(last(&calls).args, vec!["--dry-run", "v2"]);
}

#[test]
fn dispatch_follows_aliases_to_canonical_name() {
	let (cli, calls) = fixture();
	cli.dispatch(&["db", "m"]).unwrap();
	assert_eq!(last(&calls).command, "db.migrate");
}

#[test]
fn invocable_group_takes_unmatched_args() {
	let (cli, calls) = fixture();
	cli.dispatch(&["db", "vacuum"]).unwrap();

	let invocation = last(&calls);
	assert_eq!(invocation.command, "db");
	assert_eq!(invocation.args, vec!["vacuum"]);
}

#[test]
fn unknown_top_level_command_is_not_found() {
	let (cli, _) = fixture();
	let err = cli.dispatch(&["deploy"]).unwrap_err();
	assert_eq!(err.to_string(), "unknown command: deploy");
}

#[test]
fn unknown_subcommand_of_plain_group_is_not_found() {
	let registry = Registry::new("commands");
	registry.register(CommandDef::new(|_| Ok(())).into_entry("db.migrate"));
	let cli = Cli::new("app", CommandNode::build(&registry).unwrap()).unwrap();

	let err = cli.dispatch(&["db", "unknown"]).unwrap_err();
	assert_eq!(err.to_string(), "unknown command: db.unknown");
	assert!(matches!(err, CliError::Unknown(ref inner) if inner.is_not_found()));
}

#[test]
fn bare_root_summarizes_visible_commands() {
	let (cli, _) = fixture();
	match cli.dispatch::<&str>(&[]).unwrap() {
		Dispatch::Summary { group, summary } => {
			assert_eq!(group, "app");
			assert_eq!(summary, "  db      Database tools\n  status  Show status");
		}
		other => panic!("expected summary, got {other:?}"),
	}
}

#[test]
fn handler_failure_names_the_command() {
	let registry = Registry::new("commands");
	registry.register(
		CommandDef::new(|_| Err(CommandError::Failed("connection refused".to_string()))).into_entry("db.ping"),
	);
	let cli = Cli::new("app", CommandNode::build(&registry).unwrap()).unwrap();

	let err = cli.dispatch(&["db", "ping"]).unwrap_err();
	assert!(matches!(err, CliError::Command { ref command, .. } if command == "db.ping"));
	assert_eq!(err.to_string(), "db.ping: connection refused");
}

#[test]
fn clap_parses_declared_options_and_trailing_args() {
	let (cli, calls) = fixture();
	cli.run_from(["app", "db", "migrate", "--target", "v2", "extra"]).unwrap();

	let invocation = last(&calls);
	assert_eq!(invocation.command, "db.migrate");
	assert_eq!(invocation.option("target"), Some("v2"));
	assert_eq!(invocation.args, vec!["extra"]);
}

#[test]
fn clap_accepts_visible_aliases() {
	let (cli, calls) = fixture();
	cli.run_from(["app", "db", "m"]).unwrap();
	assert_eq!(last(&calls).command, "db.migrate");
}

#[test]
fn clap_runs_invocable_group() {
	let (cli, calls) = fixture();
	cli.run_from(["app", "db"]).unwrap();
	assert_eq!(last(&calls).command, "db");
}

#[test]
fn hidden_commands_are_runnable_but_not_listed() {
	let (cli, calls) = fixture();
	cli.run_from(["app", "db", "drop"]).unwrap();
	assert_eq!(last(&calls).command, "db.drop");

	let db = cli.root().find("db").unwrap();
	let visible: Vec<_> = db.visible_children().map(CommandNode::segment).collect();
	assert_eq!(visible, vec!["migrate", "seed"]);

	let mut command = cli.command();
	let db_help = command
		.find_subcommand_mut("db")
		.unwrap()
		.render_help()
		.to_string();
	assert!(db_help.contains("migrate"));
	assert!(!db_help.contains("drop"));
}

#[test]
fn help_lists_top_level_commands() {
	let (cli, _) = fixture();
	let help = cli.help();
	assert!(help.contains("db"));
	assert!(help.contains("status"));
}

#[test]
fn invalid_option_value_is_reported() {
	let invocation = Invocation {
		command: "db.migrate".to_string(),
		args: Vec::new(),
		options: [("step".to_string(), "two".to_string())].into(),
	};
	let err = invocation.parsed_option::<u32>("step").unwrap_err();
	assert!(matches!(err, CommandError::InvalidArgument(_)));
	assert_eq!(invocation.parsed_option::<u32>("absent").unwrap(), None);
}

#[test]
fn ambiguous_tree_is_rejected_before_parsing() {
	let registry = Registry::new("commands");
	registry.register(CommandDef::new(|_| Ok(())).option("args").into_entry("run"));
	let err = Cli::new("app", CommandNode::build(&registry).unwrap()).unwrap_err();

	assert_eq!(
		err,
		TreeError::ReservedOption {
			command: "run".to_string(),
			option: "args".to_string(),
		}
	);
	assert_eq!(err.to_string(), "command 'run': option '--args' is reserved");
}

#[test]
fn rendered_command_passes_clap_checks() {
	let (cli, _) = fixture();
	cli.command().debug_assert();

	let registry = Registry::new("commands");
	registry.register(CommandDef::new(|_| Ok(())).alias("status").alias("st").into_entry("status"));
	registry.register(CommandDef::new(|_| Ok(())).alias("m").into_entry("db.migrate"));
	registry.register(CommandDef::new(|_| Ok(())).alias("m").into_entry("cache.mark"));
	let cli = Cli::new("app", CommandNode::build(&registry).unwrap()).unwrap();
	cli.command().debug_assert();

	assert!(matches!(
		cli.run_from(["app", "status"]).unwrap(),
		Dispatch::Ran { ref command } if command == "status"
	));
	assert!(matches!(
		cli.run_from(["app", "cache", "m"]).unwrap(),
		Dispatch::Ran { ref command } if command == "cache.mark"
	));
}

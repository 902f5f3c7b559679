//! Keystone command-line binary.
//!
//! Bootstraps the global hub from the config, registers the builtin commands and
//! dispatches the rest of argv through the assembled command tree.

mod builtins;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use keystone_hub::config::{HubConfig, LOG_ENV};
use keystone_hub::{CliError, Dispatch, Hub, hub, logging};

/// Command line arguments handled before the command tree exists.
#[derive(Parser, Debug)]
#[command(name = "keystone")]
#[command(about = "Inspect and drive a keystone component hub")]
#[command(version)]
struct Args {
	/// TOML config file (takes precedence over KEYSTONE_CONFIG)
	#[arg(short, long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,

	/// Command path followed by its arguments, e.g. `components list`
	#[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "COMMAND")]
	command: Vec<String>,
}

fn load_config(args: &Args) -> anyhow::Result<HubConfig> {
	let mut config = match &args.config {
		Some(path) => HubConfig::load_from(Some(path.as_path()), std::env::var(LOG_ENV).ok()),
		None => HubConfig::load(),
	}
	.context("loading configuration")?;
	if args.verbose {
		config.log.level = "debug".to_string();
	}
	Ok(config)
}

fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();
	let config = load_config(&args)?;
	logging::init_subscriber(&config.log.level);

	let hub = Arc::new(Hub::new(Arc::new(config)));
	hub::install(Arc::clone(&hub));
	hub.initialize_foundation();
	builtins::register(&hub);

	let cli = hub.create_cli().context("assembling command tree")?;
	let argv = std::iter::once(cli.name().to_string()).chain(args.command);
	match cli.run_from(argv) {
		Ok(Dispatch::Ran { command }) => {
			tracing::debug!(%command, "command finished");
			Ok(ExitCode::SUCCESS)
		}
		Ok(Dispatch::Summary { group, summary }) => {
			println!("{group} commands:\n{summary}");
			Ok(ExitCode::SUCCESS)
		}
		Err(CliError::Parse(err)) => err.exit(),
		Err(err) => {
			eprintln!("error: {err}");
			Ok(ExitCode::FAILURE)
		}
	}
}

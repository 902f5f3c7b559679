//! Invocable command-line surface assembled from the command tree.
//!
//! [`Cli::dispatch`] resolves raw arguments against the tree and calls the handler
//! with whatever is left. [`Cli::command`] renders the same tree as a
//! [`clap::Command`] and [`Cli::run_from`] parses argv with it before dispatching,
//! so help, aliases and option parsing come from clap. A [`Cli`] only wraps trees
//! that pass [`CommandNode::validate`], so the rendered command never trips clap's
//! own consistency checks.

mod command;

use std::ffi::OsString;

use clap::{Arg, ArgAction, ArgMatches};
use keystone_registry::{Dimension, RegistryError};

pub use command::{CommandDef, CommandError, CommandSpec, Handler, Invocation};

use crate::tree::{CommandNode, SEPARATOR, TreeError};

/// Clap id of the trailing positional arguments of every invocable command.
const ARGS_ID: &str = "args";

/// Option names a command cannot declare: the trailing arguments and `--help`.
pub(crate) const RESERVED_OPTIONS: [&str; 2] = [ARGS_ID, "help"];

#[derive(Debug, thiserror::Error)]
pub enum CliError {
	/// No command matched the arguments.
	#[error(transparent)]
	Unknown(#[from] RegistryError),
	#[error("{command}: {source}")]
	Command {
		command: String,
		#[source]
		source: CommandError,
	},
	#[error(transparent)]
	Parse(#[from] clap::Error),
}

/// What a dispatch did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
	/// The handler of `command` ran to completion.
	Ran { command: String },
	/// The arguments named a group without a handler; `summary` lists its children.
	Summary { group: String, summary: String },
}

/// Command tree wrapped for invocation.
#[derive(Debug, Clone)]
pub struct Cli {
	name: String,
	root: CommandNode,
}

impl Cli {
	/// Wraps `root` after [validating](CommandNode::validate) it.
	pub fn new(name: impl Into<String>, root: CommandNode) -> Result<Self, TreeError> {
		root.validate()?;
		Ok(Self {
			name: name.into(),
			root,
		})
	}

	/// Program name shown in help and summaries.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Root of the wrapped command tree.
	pub fn root(&self) -> &CommandNode {
		&self.root
	}

	/// Resolves `args` against the tree and runs the matched handler.
	///
	/// Arguments are not parsed: everything after the resolved command is handed to
	/// the handler as positional arguments.
	pub fn dispatch<S: AsRef<str>>(&self, args: &[S]) -> Result<Dispatch, CliError> {
		let resolution = self.root.resolve(args);
		let rest = &args[resolution.consumed()..];
		let command = resolution.qualified_name();

		if let Some(spec) = resolution.node.spec() {
			let invocation = Invocation {
				command,
				args: rest.iter().map(|arg| arg.as_ref().to_string()).collect(),
				options: Default::default(),
			};
			return self.invoke(&spec, invocation);
		}
		if let Some(unmatched) = rest.first() {
			let name = if command.is_empty() {
				unmatched.as_ref().to_string()
			} else {
				format!("{command}{SEPARATOR}{}", unmatched.as_ref())
			};
			return Err(RegistryError::not_found(Dimension::Command, name).into());
		}
		Ok(self.summary(resolution.node, command))
	}

	/// Parses `argv` (program name first) and dispatches the matched command.
	pub fn run_from<I, T>(&self, argv: I) -> Result<Dispatch, CliError>
	where
		I: IntoIterator<Item = T>,
		T: Into<OsString> + Clone,
	{
		let matches = self.command().try_get_matches_from(argv)?;
		self.dispatch_matches(&matches)
	}

	/// Dispatches already parsed matches of [`Cli::command`].
	pub fn dispatch_matches(&self, matches: &ArgMatches) -> Result<Dispatch, CliError> {
		let mut node = &self.root;
		let mut matches = matches;
		let mut path = Vec::new();
		while let Some((name, sub)) = matches.subcommand() {
			let Some(child) = node.child(name) else {
				break;
			};
			node = child;
			matches = sub;
			path.push(child.segment());
		}
		let command = path.join(".");

		let Some(spec) = node.spec() else {
			return Ok(self.summary(node, command));
		};
		let options = spec
			.options()
			.iter()
			.filter_map(|name| {
				let value = matches.get_one::<String>(name)?;
				Some((name.clone(), value.clone()))
			})
			.collect();
		let args = matches
			.get_many::<String>(ARGS_ID)
			.map(|values| values.cloned().collect())
			.unwrap_or_default();
		self.invoke(&spec, Invocation { command, args, options })
	}

	fn invoke(&self, spec: &CommandSpec, invocation: Invocation) -> Result<Dispatch, CliError> {
		tracing::debug!(command = %invocation.command, args = invocation.args.len(), "dispatching");
		match spec.call(&invocation) {
			Ok(()) => Ok(Dispatch::Ran {
				command: invocation.command,
			}),
			Err(source) => Err(CliError::Command {
				command: invocation.command,
				source,
			}),
		}
	}

	fn summary(&self, node: &CommandNode, group: String) -> Dispatch {
		let group = if group.is_empty() { self.name.clone() } else { group };
		Dispatch::Summary {
			group,
			summary: node.group_summary(),
		}
	}

	/// Renders the tree as a clap command.
	pub fn command(&self) -> clap::Command {
		render(&self.root, clap::Command::new(self.name.clone()))
	}

	/// Rendered `--help` text of the root command.
	pub fn help(&self) -> String {
		self.command().render_help().to_string()
	}
}

fn render(node: &CommandNode, mut cmd: clap::Command) -> clap::Command {
	if let Some(entry) = node.entry() {
		cmd = cmd
			.visible_aliases(node.extra_aliases().map(str::to_string).collect::<Vec<_>>())
			.hide(entry.is_hidden());
	} else if node.is_hidden() && !node.segment().is_empty() {
		cmd = cmd.hide(true);
	}

	if let Some(spec) = node.spec() {
		if let Some(about) = spec.about() {
			cmd = cmd.about(about.to_string());
		}
		for name in spec.options() {
			cmd = cmd.arg(
				Arg::new(name.clone())
					.long(name.clone())
					.value_name("VALUE")
					.action(ArgAction::Set),
			);
		}
		cmd = cmd.arg(
			Arg::new(ARGS_ID)
				.value_name("ARGS")
				.num_args(0..)
				.trailing_var_arg(true)
				.allow_hyphen_values(true),
		);
		if node.is_group() {
			cmd = cmd.args_conflicts_with_subcommands(true);
		}
	} else if node.is_group() {
		cmd = cmd.about(format!("{} subcommands", node.visible_children().count()));
	}

	for child in node.children() {
		cmd = cmd.subcommand(render(child, clap::Command::new(child.segment().to_string())));
	}
	cmd
}

#[cfg(test)]
mod tests;

//! Hierarchical command namespace.
//!
//! Commands are registered flat under dot-qualified names (`db.migrate`). A
//! [`CommandNode`] tree is derived from those names: every segment but the last is a
//! group, the last segment carries the registry entry. A node may be both: `db` can
//! be invocable on its own and still have `migrate` beneath it.
//!
//! [`CommandNode::insert`] and [`CommandNode::resolve`] accept any tree: an exact
//! segment always beats a sibling's alias. [`CommandNode::validate`] is stricter and
//! only passes trees whose every name is unambiguous on a command line.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use keystone_registry::{Dimension, Registry, RegistryEntry};

use crate::cli::{CommandSpec, RESERVED_OPTIONS};

/// Separator between the segments of a qualified command name.
pub const SEPARATOR: char = '.';

/// Segment taken by the generated help subcommand.
pub const RESERVED_SEGMENT: &str = "help";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
	#[error("invalid command name '{name}': empty segment")]
	InvalidName { name: String },
	#[error("invalid command name '{name}': '{RESERVED_SEGMENT}' is reserved")]
	ReservedName { name: String },
	#[error("command '{command}': invalid alias '{alias}'")]
	InvalidAlias { command: String, alias: String },
	/// The alias is a sibling's segment or another sibling's alias.
	#[error("command '{command}': alias '{alias}' is already taken by '{taken_by}'")]
	AliasConflict {
		command: String,
		alias: String,
		taken_by: String,
	},
	#[error("command '{command}': invalid option name '{option}'")]
	InvalidOption { command: String, option: String },
	#[error("command '{command}': option '--{option}' is reserved")]
	ReservedOption { command: String, option: String },
	#[error("command '{command}': option '--{option}' is declared twice")]
	DuplicateOption { command: String, option: String },
}

/// One segment of the command namespace.
#[derive(Debug, Clone, Default)]
pub struct CommandNode {
	segment: String,
	children: BTreeMap<String, CommandNode>,
	entry: Option<Arc<RegistryEntry>>,
}

impl CommandNode {
	/// Unnamed root.
	pub fn root() -> Self {
		Self::default()
	}

	fn named(segment: &str) -> Self {
		Self {
			segment: segment.to_string(),
			..Self::default()
		}
	}

	/// Builds the tree from every command-dimension entry of `registry`.
	pub fn build(registry: &Registry) -> Result<Self, TreeError> {
		let mut root = Self::root();
		for entry in registry.list(Dimension::Command) {
			let name = entry.name().to_string();
			root.insert(&name, entry)?;
		}
		Ok(root)
	}

	/// Attaches `entry` at the node named by `qualified_name`, creating groups on the
	/// way. An entry already attached there is replaced.
	pub fn insert(&mut self, qualified_name: &str, entry: Arc<RegistryEntry>) -> Result<(), TreeError> {
		if qualified_name.split(SEPARATOR).any(str::is_empty) {
			return Err(TreeError::InvalidName {
				name: qualified_name.to_string(),
			});
		}
		let mut node = self;
		for segment in qualified_name.split(SEPARATOR) {
			node = node
				.children
				.entry(segment.to_string())
				.or_insert_with(|| Self::named(segment));
		}
		node.entry = Some(entry);
		Ok(())
	}

	/// Checks that the subtree renders to an unambiguous command line.
	///
	/// Rejects the reserved `help` segment, malformed aliases, aliases colliding with
	/// a sibling's segment or alias, and declared options that are malformed, reserved
	/// or declared twice. An alias equal to its own segment is ignored.
	pub fn validate(&self) -> Result<(), TreeError> {
		self.validate_under("")
	}

	fn validate_under(&self, prefix: &str) -> Result<(), TreeError> {
		let mut taken: BTreeMap<&str, String> = self
			.children
			.values()
			.map(|child| (child.segment(), qualify(prefix, child.segment())))
			.collect();
		for child in self.children.values() {
			let name = qualify(prefix, child.segment());
			if child.segment == RESERVED_SEGMENT {
				return Err(TreeError::ReservedName { name });
			}
			for alias in child.extra_aliases() {
				if !is_plain_word(alias) || alias.contains(SEPARATOR) || alias == RESERVED_SEGMENT {
					return Err(TreeError::InvalidAlias {
						command: name,
						alias: alias.to_string(),
					});
				}
				if let Some(owner) = taken.get(alias) {
					return Err(TreeError::AliasConflict {
						command: name,
						alias: alias.to_string(),
						taken_by: owner.clone(),
					});
				}
				taken.insert(alias, name.clone());
			}
			if let Some(spec) = child.spec() {
				let mut declared = BTreeSet::new();
				for option in spec.options() {
					let command = name.clone();
					let option = option.clone();
					if !is_plain_word(&option) {
						return Err(TreeError::InvalidOption { command, option });
					}
					if RESERVED_OPTIONS.contains(&option.as_str()) {
						return Err(TreeError::ReservedOption { command, option });
					}
					if !declared.insert(option.clone()) {
						return Err(TreeError::DuplicateOption { command, option });
					}
				}
			}
			child.validate_under(&name)?;
		}
		Ok(())
	}

	/// Last segment of the node's qualified name; empty for the root.
	pub fn segment(&self) -> &str {
		&self.segment
	}

	/// Aliases of the attached entry other than the node's own segment.
	pub fn extra_aliases(&self) -> impl Iterator<Item = &str> {
		self.entry
			.iter()
			.flat_map(|entry| entry.aliases())
			.filter(|alias| *alias != self.segment)
	}

	/// Registry entry attached here, if the node is invocable.
	pub fn entry(&self) -> Option<&Arc<RegistryEntry>> {
		self.entry.as_ref()
	}

	/// Handler spec of the attached entry.
	pub fn spec(&self) -> Option<Arc<CommandSpec>> {
		self.entry.as_ref()?.value_as::<CommandSpec>()
	}

	/// Children sorted by segment.
	pub fn children(&self) -> impl Iterator<Item = &CommandNode> {
		self.children.values()
	}

	/// True if the node has children.
	pub fn is_group(&self) -> bool {
		!self.children.is_empty()
	}

	/// True if an entry is attached.
	pub fn is_invocable(&self) -> bool {
		self.entry.is_some()
	}

	/// A node is hidden if its own entry is, or if it is a bare group whose children
	/// are all hidden.
	pub fn is_hidden(&self) -> bool {
		match &self.entry {
			Some(entry) => entry.is_hidden(),
			None => self.children.values().all(CommandNode::is_hidden),
		}
	}

	/// Children that are not hidden, sorted by segment.
	pub fn visible_children(&self) -> impl Iterator<Item = &CommandNode> {
		self.children.values().filter(|child| !child.is_hidden())
	}

	/// One-line description of the attached command.
	pub fn about(&self) -> Option<String> {
		self.spec().and_then(|spec| spec.about().map(str::to_string))
	}

	/// Child matching `arg` by segment, or else by one of its entry's aliases.
	pub fn child(&self, arg: &str) -> Option<&CommandNode> {
		self.children.get(arg).or_else(|| {
			self.children
				.values()
				.find(|child| child.entry.as_ref().is_some_and(|entry| entry.has_alias(arg)))
		})
	}

	/// Node at the exact segment path, aliases not considered.
	pub fn find(&self, qualified_name: &str) -> Option<&CommandNode> {
		qualified_name
			.split(SEPARATOR)
			.try_fold(self, |node, segment| node.children.get(segment))
	}

	/// Walks down the tree along the leading `args`.
	///
	/// Stops at the first argument that names no child; that argument and the rest
	/// are left for the handler.
	pub fn resolve<'t, S: AsRef<str>>(&'t self, args: &[S]) -> Resolution<'t> {
		let mut node = self;
		let mut path = Vec::new();
		for arg in args {
			let Some(child) = node.child(arg.as_ref()) else {
				break;
			};
			node = child;
			path.push(child.segment());
		}
		Resolution { node, path }
	}

	/// Number of invocable nodes in this subtree.
	pub fn command_count(&self) -> usize {
		usize::from(self.is_invocable()) + self.children.values().map(CommandNode::command_count).sum::<usize>()
	}

	/// Visible children with their descriptions, one per line.
	pub fn group_summary(&self) -> String {
		let rows: Vec<(&str, String)> = self
			.visible_children()
			.map(|child| {
				let about = match (child.about(), child.is_group()) {
					(Some(about), _) => about,
					(None, true) => format!("{} subcommands", child.visible_children().count()),
					(None, false) => String::new(),
				};
				(child.segment(), about)
			})
			.collect();
		let width = rows.iter().map(|(segment, _)| segment.len()).max().unwrap_or(0);
		rows.iter()
			.map(|(segment, about)| format!("  {segment:<width$}  {about}").trim_end().to_string())
			.collect::<Vec<_>>()
			.join("\n")
	}
}

fn qualify(prefix: &str, segment: &str) -> String {
	if prefix.is_empty() {
		segment.to_string()
	} else {
		format!("{prefix}{SEPARATOR}{segment}")
	}
}

/// Non-empty, no whitespace or `=`, and not flag-like.
fn is_plain_word(word: &str) -> bool {
	!word.is_empty() && !word.starts_with('-') && !word.chars().any(|c| c.is_whitespace() || c == '=')
}

/// Outcome of [`CommandNode::resolve`].
#[derive(Debug, Clone)]
pub struct Resolution<'t> {
	pub node: &'t CommandNode,
	/// Canonical segments walked, even where an alias matched.
	pub path: Vec<&'t str>,
}

impl Resolution<'_> {
	/// Number of arguments consumed by the walk.
	pub fn consumed(&self) -> usize {
		self.path.len()
	}

	/// Dot-joined canonical path.
	pub fn qualified_name(&self) -> String {
		self.path.join(".")
	}
}

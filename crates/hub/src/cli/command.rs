use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use keystone_registry::{Dimension, RegistryEntry, RegistryError};

/// Command handler.
pub type Handler = Arc<dyn Fn(&Invocation) -> Result<(), CommandError> + Send + Sync>;

/// Failure reported by a command handler.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
	#[error("invalid argument: {0}")]
	InvalidArgument(String),
	#[error(transparent)]
	Registry(#[from] RegistryError),
	#[error("{0}")]
	Failed(String),
}

/// Arguments a handler is invoked with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
	/// Canonical qualified name of the command.
	pub command: String,
	/// Positional arguments left after command resolution.
	pub args: Vec<String>,
	/// Declared options that were given, by name.
	pub options: BTreeMap<String, String>,
}

impl Invocation {
	/// Raw value of option `name`, if it was given.
	pub fn option(&self, name: &str) -> Option<&str> {
		self.options.get(name).map(String::as_str)
	}

	/// Parses option `name` with [`str::parse`].
	pub fn parsed_option<T>(&self, name: &str) -> Result<Option<T>, CommandError>
	where
		T: std::str::FromStr,
		T::Err: fmt::Display,
	{
		self.option(name)
			.map(|raw| {
				raw.parse()
					.map_err(|err| CommandError::InvalidArgument(format!("--{name} {raw}: {err}")))
			})
			.transpose()
	}
}

/// Value stored in the command dimension.
pub struct CommandSpec {
	handler: Handler,
	about: Option<String>,
	options: Vec<String>,
}

impl CommandSpec {
	/// Runs the handler.
	pub fn call(&self, invocation: &Invocation) -> Result<(), CommandError> {
		(self.handler)(invocation)
	}

	/// One-line description.
	pub fn about(&self) -> Option<&str> {
		self.about.as_deref()
	}

	/// Declared `--name <VALUE>` options.
	pub fn options(&self) -> &[String] {
		&self.options
	}
}

impl fmt::Debug for CommandSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CommandSpec")
			.field("about", &self.about)
			.field("options", &self.options)
			.finish_non_exhaustive()
	}
}

/// Registration input for [`Hub::register_command`](crate::Hub::register_command).
///
/// ```
/// use keystone_hub::CommandDef;
///
/// let def = CommandDef::new(|_| Ok(()))
/// 	.about("Apply pending migrations")
/// 	.alias("m")
/// 	.option("target");
/// # let _ = def;
/// ```
pub struct CommandDef {
	spec: CommandSpec,
	aliases: Vec<String>,
	hidden: bool,
	category: Option<String>,
}

impl CommandDef {
	/// Command running `handler`.
	pub fn new<F>(handler: F) -> Self
	where
		F: Fn(&Invocation) -> Result<(), CommandError> + Send + Sync + 'static,
	{
		Self {
			spec: CommandSpec {
				handler: Arc::new(handler),
				about: None,
				options: Vec::new(),
			},
			aliases: Vec::new(),
			hidden: false,
			category: None,
		}
	}

	/// Sets the one-line description shown in help and summaries.
	#[must_use]
	pub fn about(mut self, about: impl Into<String>) -> Self {
		self.spec.about = Some(about.into());
		self
	}

	/// Alternative name for the last segment.
	#[must_use]
	pub fn alias(mut self, alias: impl Into<String>) -> Self {
		self.aliases.push(alias.into());
		self
	}

	/// Leaves the command out of help and visible listings.
	#[must_use]
	pub fn hidden(mut self) -> Self {
		self.hidden = true;
		self
	}

	/// Groups the command under `category` in listings.
	#[must_use]
	pub fn category(mut self, category: impl Into<String>) -> Self {
		self.category = Some(category.into());
		self
	}

	/// Declares a `--name <VALUE>` option.
	#[must_use]
	pub fn option(mut self, name: impl Into<String>) -> Self {
		self.spec.options.push(name.into());
		self
	}

	pub(crate) fn into_entry(self, qualified_name: impl Into<String>) -> RegistryEntry {
		let options = serde_json::json!(self.spec.options);
		let mut entry = RegistryEntry::new(Dimension::Command, qualified_name, self.spec)
			.with_metadata("options", options)
			.with_aliases(self.aliases)
			.with_hidden(self.hidden);
		if let Some(category) = self.category {
			entry = entry.with_category(category);
		}
		entry
	}
}

impl fmt::Debug for CommandDef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("CommandDef")
			.field("spec", &self.spec)
			.field("aliases", &self.aliases)
			.field("hidden", &self.hidden)
			.field("category", &self.category)
			.finish()
	}
}

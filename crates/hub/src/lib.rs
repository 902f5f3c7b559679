//! Process-wide component hub.
//!
//! # Purpose
//!
//! The [`Hub`] owns one [`Registry`](keystone_registry::Registry) for components and
//! one for commands, assembles the command registrations into an invocable [`Cli`]
//! and is reachable from anywhere through [`hub::global`]. The crate also carries the
//! collaborators the hub has to interoperate with: the logging engine, the
//! enrichment catalog, the setup coordinator and the instrumentation counters.
//!
//! # Mental Model
//!
//! 1. **Register:** Components and commands are registered by name. Re-registering
//!    replaces.
//! 2. **Bootstrap:** The global hub and the global [`LogEngine`] depend on each
//!    other. Both accessors build under a [`BootstrapGuard`]; past
//!    [`MAX_DEPTH`](bootstrap::MAX_DEPTH) a dependency-free fallback is returned
//!    instead of recursing further.
//! 3. **Assemble:** [`Hub::create_cli`] turns flat dot-qualified command names into a
//!    [`CommandNode`] tree on every call; [`hub::global_cli`] reuses the last one
//!    until the command registry changes.
//! 4. **Reset:** [`reset::reset`] tears every process-wide piece of state down in a
//!    fixed order and records what each stage did.
//!
//! # Concurrency
//!
//! - **Registries:** Lock-free reads, serialized writes.
//! - **Bootstrap depth:** Per thread. Two threads bootstrapping at once each build a
//!   chain; a compare-and-swap from empty decides which instance is published.
//!
//! # Invariants
//!
//! - Bootstrap terminates and returns a usable instance.
//!   - Enforced in: [`bootstrap::bootstrap`].
//!   - Tested by: `bootstrap::tests::mutual_recursion_bottoms_out_in_fallback`,
//!     `tests/bootstrap.rs`.
//!
//! - Only the outermost construction of a chain is published.
//!   - Enforced in: [`hub::global`], [`LogEngine::global`].
//!   - Tested by: `tests/bootstrap.rs::hub_and_log_engine_converge`.
//!
//! - Reset stages run in order and a failing stage does not stop later ones.
//!   - Enforced in: [`ResetProtocol::run`].
//!   - Tested by: `reset::tests::failing_stage_does_not_stop_the_sequence`.
//!
//! - The capture buffer is empty after a reset, even with a live subscriber.
//!   - Enforced in: [`ResetProtocol::run`] (capture paused for the run).
//!   - Tested by: `tests/capture.rs::reset_leaves_capture_buffer_empty`.
//!
//! - A [`Cli`] never wraps a tree clap would reject.
//!   - Enforced in: [`Cli::new`] through [`CommandNode::validate`].
//!   - Tested by: `cli::tests::rendered_command_passes_clap_checks`.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod hub;
pub mod logging;
pub mod metrics;
pub mod reset;
pub mod setup;
pub mod tree;

pub use bootstrap::BootstrapGuard;
pub use cli::{Cli, CliError, CommandDef, CommandError, CommandSpec, Dispatch, Handler, Invocation};
pub use config::{ConfigError, HubConfig};
pub use hub::Hub;
pub use logging::{LogEngine, LogSettings, Logger};
pub use reset::{ResetProtocol, ResetReport};
pub use tree::{CommandNode, Resolution, TreeError};

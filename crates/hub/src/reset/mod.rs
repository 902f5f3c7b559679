//! Ordered teardown of every process-wide piece of state.
//!
//! Stages run in a fixed order. Each one is idempotent and independent of the others:
//! a stage with nothing to do reports [`StageStatus::Skipped`], and a stage that
//! fails or panics is logged and recorded, and the protocol moves on. Nothing is
//! captured into [`LOG_BUFFER`] while the protocol runs.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::logging::{self, DEFAULT_CAPTURE_CAPACITY, LOG_BUFFER, LogEngine, enrichment};
use crate::{hub, metrics, setup};

/// Why a stage did not clean anything.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResetStageError {
	/// The state the stage tears down was never created.
	#[error("{0} is not initialized")]
	Absent(&'static str),
	#[error("{0}")]
	Failed(String),
}

/// Outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
	Cleaned,
	Skipped(String),
	Failed(String),
}

type StageFn = Box<dyn Fn() -> Result<(), ResetStageError> + Send + Sync>;

/// A named teardown step.
pub struct ResetStage {
	name: &'static str,
	run: StageFn,
}

impl ResetStage {
	/// Stage named `name` running `run`.
	pub fn new<F>(name: &'static str, run: F) -> Self
	where
		F: Fn() -> Result<(), ResetStageError> + Send + Sync + 'static,
	{
		Self {
			name,
			run: Box::new(run),
		}
	}

	/// Name recorded in the report.
	pub fn name(&self) -> &'static str {
		self.name
	}
}

impl fmt::Debug for ResetStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("ResetStage").field(&self.name).finish()
	}
}

/// What a protocol run did, stage by stage, in run order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
	pub stages: Vec<(&'static str, StageStatus)>,
}

impl ResetReport {
	/// True if no stage failed.
	pub fn is_clean(&self) -> bool {
		self.failures().next().is_none()
	}

	/// Failed stages with their reasons.
	pub fn failures(&self) -> impl Iterator<Item = (&'static str, &str)> {
		self.stages.iter().filter_map(|(name, status)| match status {
			StageStatus::Failed(reason) => Some((*name, reason.as_str())),
			_ => None,
		})
	}

	/// Outcome of `stage`, if it ran.
	pub fn status(&self, stage: &str) -> Option<&StageStatus> {
		self.stages
			.iter()
			.find(|(name, _)| *name == stage)
			.map(|(_, status)| status)
	}
}

/// Ordered list of reset stages.
#[derive(Debug)]
pub struct ResetProtocol {
	stages: Vec<ResetStage>,
}

impl ResetProtocol {
	/// Protocol running `stages` in the given order.
	pub fn new(stages: impl IntoIterator<Item = ResetStage>) -> Self {
		Self {
			stages: stages.into_iter().collect(),
		}
	}

	/// Every process-wide subsystem, leaves first and the hub slot last.
	pub fn standard() -> Self {
		Self::new([
			ResetStage::new("output", reset_output),
			ResetStage::new("logging", reset_logging),
			ResetStage::new("registries", reset_registries),
			ResetStage::new("setup", reset_setup),
			ResetStage::new("enrichment", reset_enrichment),
			ResetStage::new("counters", reset_counters),
			ResetStage::new("hub", reset_hub),
		])
	}

	/// Stage names in run order.
	pub fn stage_names(&self) -> Vec<&'static str> {
		self.stages.iter().map(ResetStage::name).collect()
	}

	/// Runs every stage in order. Never panics and never stops early.
	///
	/// Log capture is paused for the whole run, so events emitted by later stages do
	/// not refill the buffer an earlier stage cleared. They still reach every other
	/// subscriber layer.
	pub fn run(&self) -> ResetReport {
		let _capture = LOG_BUFFER.pause();
		let mut report = ResetReport::default();
		for stage in &self.stages {
			let status = match panic::catch_unwind(AssertUnwindSafe(|| (stage.run)())) {
				Ok(Ok(())) => StageStatus::Cleaned,
				Ok(Err(ResetStageError::Absent(what))) => {
					tracing::debug!(stage = stage.name, what, "reset stage skipped");
					StageStatus::Skipped(format!("{what} is not initialized"))
				}
				Ok(Err(ResetStageError::Failed(reason))) => {
					tracing::warn!(stage = stage.name, %reason, "reset stage failed");
					StageStatus::Failed(reason)
				}
				Err(payload) => {
					let reason = panic_message(payload.as_ref());
					tracing::warn!(stage = stage.name, %reason, "reset stage panicked");
					StageStatus::Failed(reason)
				}
			};
			report.stages.push((stage.name, status));
		}
		metrics::counters().record_reset();
		tracing::debug!(stages = report.stages.len(), clean = report.is_clean(), "reset complete");
		report
	}
}

impl Default for ResetProtocol {
	fn default() -> Self {
		Self::standard()
	}
}

/// Runs the standard protocol.
pub fn reset() -> ResetReport {
	ResetProtocol::standard().run()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
	if let Some(message) = payload.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = payload.downcast_ref::<String>() {
		message.clone()
	} else {
		"panic with non-string payload".to_string()
	}
}

fn reset_output() -> Result<(), ResetStageError> {
	LOG_BUFFER.clear();
	Ok(())
}

fn reset_logging() -> Result<(), ResetStageError> {
	let had_engine = LogEngine::clear_global();
	LOG_BUFFER.set_capacity(DEFAULT_CAPTURE_CAPACITY);
	let had_filter = logging::restore_default_filter().map_err(|err| ResetStageError::Failed(err.to_string()))?;
	if had_engine || had_filter {
		Ok(())
	} else {
		Err(ResetStageError::Absent("logging engine"))
	}
}

fn reset_registries() -> Result<(), ResetStageError> {
	let hub = hub::peek().ok_or(ResetStageError::Absent("hub"))?;
	hub.clear();
	Ok(())
}

fn reset_setup() -> Result<(), ResetStageError> {
	setup::coordinator().clear();
	Ok(())
}

fn reset_enrichment() -> Result<(), ResetStageError> {
	enrichment::clear();
	Ok(())
}

fn reset_counters() -> Result<(), ResetStageError> {
	metrics::counters().reset();
	Ok(())
}

fn reset_hub() -> Result<(), ResetStageError> {
	if hub::clear_global() {
		Ok(())
	} else {
		Err(ResetStageError::Absent("hub"))
	}
}

#[cfg(test)]
mod tests;

//! Tracing layer copying events into [`LOG_BUFFER`].

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;

use super::buffer::{LOG_BUFFER, LogRecord};

/// A [`tracing_subscriber::Layer`] that captures every event it sees.
///
/// The `logger` and `marker` fields set by [`Logger`](super::Logger) are lifted
/// out of the field list into their own record slots.
#[derive(Debug, Default)]
pub struct CaptureLayer;

impl CaptureLayer {
	/// Layer writing into [`LOG_BUFFER`].
	pub fn new() -> Self {
		Self
	}
}

#[derive(Default)]
struct RecordVisitor {
	message: String,
	logger: Option<String>,
	marker: Option<String>,
	fields: Vec<(String, String)>,
}

impl RecordVisitor {
	fn record_value(&mut self, field: &Field, value: String) {
		match field.name() {
			"message" => self.message = value,
			"logger" => self.logger = Some(value),
			"marker" => self.marker = Some(value),
			name => self.fields.push((name.to_string(), value)),
		}
	}
}

impl Visit for RecordVisitor {
	fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
		self.record_value(field, format!("{value:?}"));
	}

	fn record_str(&mut self, field: &Field, value: &str) {
		self.record_value(field, value.to_string());
	}
}

impl<S> tracing_subscriber::Layer<S> for CaptureLayer
where
	S: Subscriber,
{
	fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
		let mut visitor = RecordVisitor::default();
		event.record(&mut visitor);

		let metadata = event.metadata();
		LOG_BUFFER.push(LogRecord {
			level: *metadata.level(),
			target: metadata.target().to_string(),
			logger: visitor.logger,
			marker: visitor.marker,
			message: visitor.message,
			fields: visitor.fields,
		});
	}
}

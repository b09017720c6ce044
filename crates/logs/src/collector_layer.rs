use std::{collections::BTreeMap, error::Error, fmt::Debug};

use call_harness_common::LogLevel;
use tracing::{
    Event, Subscriber,
    field::{Field, Visit},
};
use tracing_subscriber::layer::{Context, Layer};

use crate::{ErrorDetail, LogCollector, LogEntry};

const MESSAGE_FIELD: &str = "message";
const ERROR_FIELD: &str = "error";
const CATEGORY_FIELD: &str = "category";

/// Turns `tracing` events into log records.
///
/// A `category` field (falling back to the event target) becomes the category, the `message`
/// field the message, an `error` field the error detail and every other field a structured
/// field.
#[derive(Clone, Debug)]
pub struct CollectorLayer {
    collector: LogCollector,
    min_level: LogLevel,
}

impl CollectorLayer {
    pub fn new(collector: LogCollector, min_level: LogLevel) -> Self {
        Self {
            collector,
            min_level,
        }
    }
}

impl<S: Subscriber> Layer<S> for CollectorLayer {
    // Filtering happens here rather than in `enabled`, which would also silence other layers.
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = LogLevel::from(metadata.level());
        if level < self.min_level {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let category = visitor
            .category
            .unwrap_or_else(|| metadata.target().to_string());
        let mut entry = LogEntry::new(level, visitor.message.unwrap_or_default())
            .with_category(category)
            .with_error_detail(visitor.error);
        entry.fields = visitor.fields;
        self.collector.emit_record(entry);
    }
}

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    category: Option<String>,
    error: Option<ErrorDetail>,
    fields: BTreeMap<String, String>,
}

impl EventVisitor {
    fn record_text(&mut self, field: &Field, text: String) {
        match field.name() {
            MESSAGE_FIELD => self.message = Some(text),
            CATEGORY_FIELD => self.category = Some(text),
            ERROR_FIELD => self.error = Some(ErrorDetail::from_message(text)),
            name => {
                self.fields.insert(name.to_string(), text);
            }
        }
    }
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        if field.name() == ERROR_FIELD {
            self.error = Some(ErrorDetail::from_error(value));
        } else {
            self.record_text(field, value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.record_text(field, format!("{value:?}"));
    }
}

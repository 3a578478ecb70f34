//! In-memory capture of emitted records, for tests.
//!
//! ```rust,ignore
//! let logs = LogCapture::install();
//! retrieve(&ctx).info("hello", &[]);
//! assert_eq!(logs.records().len(), 1);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use crate::logger::TARGET;

/// One captured record.
#[derive(Debug, Clone)]
pub struct CapturedRecord {
    pub level: Level,
    pub message: String,
    /// Top-level tracing fields other than `message` and `fields`.
    pub attributes: Map<String, Value>,
    /// The decoded `fields` object, `{}` when the record had none.
    pub fields: Value,
}

impl CapturedRecord {
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn caller(&self) -> Option<&str> {
        self.attr("caller").and_then(Value::as_str)
    }
}

/// Captures records emitted on the current thread while alive.
pub struct LogCapture {
    records: Arc<Mutex<Vec<CapturedRecord>>>,
    _guard: DefaultGuard,
}

impl LogCapture {
    /// Install a capturing subscriber as the thread's default.
    pub fn install() -> Self {
        let records = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(CaptureLayer {
            records: records.clone(),
        });
        let guard = tracing::subscriber::set_default(subscriber);
        Self {
            records,
            _guard: guard,
        }
    }

    pub fn records(&self) -> Vec<CapturedRecord> {
        self.records.lock().clone()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

struct CaptureLayer {
    records: Arc<Mutex<Vec<CapturedRecord>>>,
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if metadata.target() != TARGET {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        self.records.lock().push(CapturedRecord {
            level: *metadata.level(),
            message: visitor.message.unwrap_or_default(),
            attributes: visitor.attributes,
            fields: visitor.fields.unwrap_or_else(|| Value::Object(Map::new())),
        });
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    fields: Option<Value>,
    attributes: Map<String, Value>,
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.attributes
            .insert(field.name().to_string(), Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.attributes
            .insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.attributes
            .insert(field.name().to_string(), Value::Number(value.into()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{:?}", value);
        match field.name() {
            "message" => self.message = Some(rendered),
            "fields" => {
                self.fields = Some(serde_json::from_str(&rendered).unwrap_or(Value::String(rendered)))
            }
            name => {
                self.attributes
                    .insert(name.to_string(), Value::String(rendered));
            }
        }
    }
}

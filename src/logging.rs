//! Structured JSON-line logging.
//!
//! Every line is one JSON object with exactly the keys `timestamp` (RFC 3339,
//! millisecond precision, UTC), `level`, `category`, `message`, and
//! `context`. Events set `category` explicitly; all remaining event fields
//! land in `context`, so per-request lines carry `context.request_id`.

use std::fmt;
use std::fmt::Write as _;

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

pub const CATEGORY_CONFIG: &str = "CONFIG";
pub const CATEGORY_CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const CATEGORY_VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const CATEGORY_FILTERING: &str = "FILTERING";
pub const CATEGORY_ROUTING: &str = "ROUTING";
pub const CATEGORY_FORWARDING: &str = "FORWARDING";
pub const CATEGORY_RESPONSE: &str = "RESPONSE";
pub const CATEGORY_SERVER: &str = "SERVER";

/// Initialize the process-wide subscriber. `RUST_LOG` wins over the
/// configured level when set.
pub fn init(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .event_format(JsonLineFormat)
        .init();
}

/// One pre-subscriber JSON line for configuration failures, in the same
/// shape the subscriber emits. Startup errors must not depend on a logger
/// that is configured by the very file that failed to load.
pub fn startup_error_line(message: &str) -> String {
    json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "level": "ERROR",
        "category": CATEGORY_CONFIG_ERROR,
        "message": message,
        "context": {},
    })
    .to_string()
}

struct JsonLineFormat;

impl<S, N> FormatEvent<S, N> for JsonLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = EventFields::default();
        event.record(&mut fields);

        let metadata = event.metadata();
        let line = json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "level": metadata.level().to_string(),
            "category": fields
                .category
                .unwrap_or_else(|| metadata.target().to_string()),
            "message": fields.message,
            "context": Value::Object(fields.context),
        });

        writeln!(writer, "{line}")
    }
}

#[derive(Default)]
struct EventFields {
    message: String,
    category: Option<String>,
    context: Map<String, Value>,
}

impl EventFields {
    fn insert(&mut self, name: &str, value: Value) {
        self.context.insert(name.to_string(), value);
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "category" => self.category = Some(value.to_string()),
            name => self.insert(name, Value::from(value)),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{value:?}"),
            "category" => self.category = Some(format!("{value:?}")),
            name => self.insert(name, Value::from(format!("{value:?}"))),
        }
    }
}

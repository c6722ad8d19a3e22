//! Streaming observations and event-time extraction

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Feature vector of a single observation
pub type Features = Vec<f64>;

/// Target value: class index for classification, numeric target for regression
pub type Label = f64;

/// Caller-supplied function deriving a timestamp (seconds) from an event
///
/// Returns `None` when the event carries no usable time.
pub type EventTimeFn = Box<dyn Fn(&Event) -> Option<f64>>;

/// One streaming observation
///
/// Serialized as a flat JSON object with an `X` feature array, an optional
/// `y` label, and any number of extra fields (timestamps, ids, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "X")]
    pub x: Features,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<Label>,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Event {
    pub fn new(x: Features, y: Option<Label>) -> Self {
        Self {
            x,
            y,
            fields: Map::new(),
        }
    }

    /// Attach an extra field (builder style)
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Build a time extractor reading `field` from each event
///
/// Numbers are taken as seconds. Strings are parsed as RFC 3339 and converted
/// to fractional epoch seconds.
pub fn field_time_extractor(field: impl Into<String>) -> EventTimeFn {
    let field = field.into();
    Box::new(move |event: &Event| event.field(&field).and_then(value_as_seconds))
}

fn value_as_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.timestamp_millis() as f64 / 1000.0),
        _ => None,
    }
}

// ============================================
// Lookup adapters
// ============================================
//
// Each adapter wraps one external HTTP data source and normalizes its JSON
// into a flat, ordered field map. IP and phone lookups get exactly one
// fallback hop; nothing is cached or retried beyond that.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod geo;
pub mod phone;
pub mod threat;

pub use geo::GeoLocator;
pub use phone::PhoneValidator;
pub use threat::ThreatIntel;

#[derive(Debug, Error)]
pub enum LookupError {
    /// Input rejected before any request was made
    #[error("{0}")]
    Validation(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    /// The provider answered but flagged the query as failed
    #[error("{0}")]
    Provider(String),

    #[error("unexpected response format: {0}")]
    Parse(String),

    #[error("Primary provider failed: {primary}; fallback provider failed: {fallback}")]
    Exhausted { primary: String, fallback: String },

    #[error("{0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn maps_url(&self) -> String {
        format!("https://www.google.com/maps?q={},{}", self.lat, self.lng)
    }
}

/// Ordered mapping of human-readable field names to display values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(Map<String, Value>);

impl FieldMap {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert only when the value would display as something (the providers
    /// return `""`, `0` and `null` for "unknown").
    pub fn insert_present(&mut self, key: &str, value: Option<&Value>) {
        if let Some(v) = value.filter(|v| is_present(v)) {
            self.0.insert(key.to_string(), v.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

/// Result of one successful lookup call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub data: FieldMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    /// Which provider (or heuristic) produced the data
    pub source: String,
}

/// JavaScript-style truthiness: missing, null, false, 0 and "" are absent.
pub(crate) fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Display a JSON value the way the result table shows it (strings unquoted).
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

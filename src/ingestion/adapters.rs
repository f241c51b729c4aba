//! Dialect adapters: named rules for third-party JSON payload shapes.
//!
//! Adapters are checked in registration order before generic transposition
//! ([`super::json::transpose_json`]). Add a new dialect by registering another adapter.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::{IngestionError, IngestionResult};
use crate::types::DataContainer;

use super::format::SourceFormat;
use super::json::{records_to_columns, transpose_json};

/// Recognizes one JSON dialect and maps it to the column model.
pub trait DialectAdapter: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &str;

    /// Whether this adapter handles the document fetched from `locator`.
    fn matches(&self, locator: &str, value: &Value) -> bool;

    /// Build the column container.
    fn adapt(&self, value: &Value) -> IngestionResult<DataContainer>;
}

/// Weather-service payloads: `{ "response": {...}, "<payload key>": [...] | {...} }`.
///
/// The payload is the object's second property. An array (hourly forecast) is transposed as
/// records; an object (current conditions) is treated as a single record. The result is labeled
/// with the payload key.
#[derive(Debug, Clone)]
pub struct WeatherServiceAdapter {
    locator_pattern: String,
}

impl WeatherServiceAdapter {
    /// Match locators containing `pattern`.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            locator_pattern: pattern.into(),
        }
    }
}

impl Default for WeatherServiceAdapter {
    fn default() -> Self {
        Self::new("wunderground")
    }
}

impl DialectAdapter for WeatherServiceAdapter {
    fn name(&self) -> &str {
        "weather-service"
    }

    fn matches(&self, locator: &str, value: &Value) -> bool {
        locator.contains(&self.locator_pattern) && value.is_object()
    }

    fn adapt(&self, value: &Value) -> IngestionResult<DataContainer> {
        let (key, payload) = value
            .as_object()
            .and_then(|obj| obj.iter().nth(1))
            .ok_or_else(|| IngestionError::json("weather payload needs a second top-level property"))?;

        let top = match payload {
            Value::Array(items) => records_to_columns(items)?,
            Value::Object(_) => records_to_columns(std::slice::from_ref(payload))?,
            _ => {
                return Err(IngestionError::json(format!(
                    "weather payload '{key}' is neither a record list nor a record"
                )));
            }
        };
        top.with_label(key.as_str());
        Ok(top)
    }
}

/// JSONP envelopes: `{ "response": {...metadata}, "<data key>": ... }` fetched from `.jsonp`
/// locators.
///
/// Uses the first property other than `response` and transposes it generically. When that property
/// is neither a record nor a list of records, the whole document is transposed as-is.
#[derive(Debug, Clone, Default)]
pub struct JsonpEnvelopeAdapter;

const ENVELOPE_META_KEY: &str = "response";

fn envelope_data(value: &Value) -> Option<(&String, &Value)> {
    value
        .as_object()?
        .iter()
        .find(|(k, _)| k.as_str() != ENVELOPE_META_KEY)
}

fn is_records(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_object),
        _ => false,
    }
}

impl DialectAdapter for JsonpEnvelopeAdapter {
    fn name(&self) -> &str {
        "jsonp-envelope"
    }

    fn matches(&self, locator: &str, value: &Value) -> bool {
        SourceFormat::from_locator(locator) == SourceFormat::Jsonp
            && value.get(ENVELOPE_META_KEY).is_some()
            && envelope_data(value).is_some()
    }

    fn adapt(&self, value: &Value) -> IngestionResult<DataContainer> {
        let (key, data) =
            envelope_data(value).ok_or_else(|| IngestionError::json("jsonp envelope has no data property"))?;
        if !is_records(data) {
            return transpose_json(value);
        }
        let top = transpose_json(data)?;
        top.with_label(key.as_str());
        Ok(top)
    }
}

/// Ordered list of dialect adapters.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn DialectAdapter>>,
}

impl AdapterRegistry {
    /// An empty registry (generic transposition only).
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in weather-service and JSONP-envelope adapters.
    pub fn with_defaults() -> Self {
        Self::new()
            .with(Arc::new(WeatherServiceAdapter::default()))
            .with(Arc::new(JsonpEnvelopeAdapter))
    }

    /// Append an adapter; earlier adapters win.
    pub fn with(mut self, adapter: Arc<dyn DialectAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// First adapter matching `locator` and `value`.
    pub fn resolve(&self, locator: &str, value: &Value) -> Option<&dyn DialectAdapter> {
        self.adapters
            .iter()
            .find(|a| a.matches(locator, value))
            .map(|a| a.as_ref())
    }

    /// Transpose with the first matching adapter, or generically when none matches.
    pub fn transpose(&self, locator: &str, value: &Value) -> IngestionResult<DataContainer> {
        match self.resolve(locator, value) {
            Some(adapter) => {
                debug!(adapter = adapter.name(), locator, "json dialect adapter selected");
                adapter.adapt(value)
            }
            None => transpose_json(value),
        }
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.adapters.iter().map(|a| a.name()))
            .finish()
    }
}

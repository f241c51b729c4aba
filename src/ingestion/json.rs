//! JSON ingestion implementation.
//!
//! Supported record shapes (checked in this order):
//! - An object with an array-of-objects property: `{"items":[{"x":1},{"x":2}]}`
//! - A JSON array of objects: `[{"x":1}, {"x":2}]`
//! - A single record object: `{"x":1,"y":2}`
//!
//! Records are transposed into columns: one labeled leaf per key, holding that key's value across
//! every record. Columns whose values are all objects become nested branches.
//!
//! Parsing falls back to stripping JSONP padding, then to newline-delimited JSON (NDJSON).

use serde_json::{Map, Number, Value};
use tracing::{debug, error};

use crate::error::{IngestionError, IngestionResult};
use crate::types::{DataContainer, Scalar};

static NULL: Value = Value::Null;

/// Parse JSON text, trying JSONP padding and NDJSON before giving up.
pub fn parse_json_str(input: &str) -> IngestionResult<Value> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IngestionError::json("json input is empty"));
    }

    let first_err = match serde_json::from_str::<Value>(trimmed) {
        Ok(v) => return Ok(v),
        Err(e) => e,
    };

    if let Some(inner) = strip_jsonp_padding(trimmed) {
        if let Ok(v) = serde_json::from_str::<Value>(inner) {
            debug!("parsed json after stripping jsonp padding");
            return Ok(v);
        }
    }

    match parse_ndjson(trimmed) {
        Some(values) => {
            debug!(records = values.len(), "parsed json as ndjson");
            Ok(Value::Array(values))
        }
        None => {
            error!(error = %first_err, "could not parse json input");
            Err(IngestionError::json(format!("invalid json: {first_err}")))
        }
    }
}

/// Return the payload of `callback( ... )`, if `input` looks like a JSONP response.
pub fn strip_jsonp_padding(input: &str) -> Option<&str> {
    let input = input.trim().trim_end_matches(';').trim_end();
    let open = input.find('(')?;
    let callback = input[..open].trim();
    let is_ident = !callback.is_empty()
        && callback
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'));
    if !is_ident || !input.ends_with(')') {
        return None;
    }
    Some(&input[open + 1..input.len() - 1])
}

fn parse_ndjson(input: &str) -> Option<Vec<Value>> {
    let mut values = Vec::new();
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        values.push(serde_json::from_str::<Value>(line).ok()?);
    }
    // A single line would already have parsed as plain JSON.
    (values.len() > 1).then_some(values)
}

/// Transpose a parsed document into columns using the generic record shapes.
pub fn transpose_json(value: &Value) -> IngestionResult<DataContainer> {
    match value {
        Value::Object(map) => {
            let records = map.iter().find_map(|(key, v)| match v {
                Value::Array(items) if is_record_array(items) => Some((key, items)),
                _ => None,
            });
            match records {
                Some((key, items)) => {
                    let top = records_to_columns(items)?;
                    top.with_label(key.as_str());
                    Ok(top)
                }
                None => records_to_columns(std::slice::from_ref(value)),
            }
        }
        Value::Array(items) if is_record_array(items) => records_to_columns(items),
        Value::Array(items) => Ok(DataContainer::from_values(items.iter().map(scalar_from_json))),
        other => Err(IngestionError::json(format!(
            "json must be an object or an array, got {}",
            json_type_name(other)
        ))),
    }
}

fn is_record_array(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(Value::is_object)
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Transpose a sequence of record objects into a branch of labeled columns.
///
/// Keys are the union of all record keys in first-seen order; records missing a key contribute
/// [`Scalar::Null`] to that column. `null` entries in `records` are treated as empty records.
pub fn records_to_columns(records: &[Value]) -> IngestionResult<DataContainer> {
    let empty = Map::new();
    let mut objects: Vec<&Map<String, Value>> = Vec::with_capacity(records.len());
    for (idx0, record) in records.iter().enumerate() {
        match record {
            Value::Object(map) => objects.push(map),
            Value::Null => objects.push(&empty),
            other => {
                return Err(IngestionError::json(format!(
                    "record {} is a {}, not an object",
                    idx0 + 1,
                    json_type_name(other)
                )));
            }
        }
    }

    let mut keys: Vec<&str> = Vec::new();
    for obj in &objects {
        for key in obj.keys() {
            if !keys.contains(&key.as_str()) {
                keys.push(key.as_str());
            }
        }
    }

    let columns = keys
        .into_iter()
        .map(|key| {
            let cells: Vec<&Value> = objects.iter().map(|obj| obj.get(key).unwrap_or(&NULL)).collect();
            column_container(key, &cells)
        })
        .collect::<IngestionResult<Vec<_>>>()?;

    Ok(DataContainer::branch(columns))
}

fn column_container(label: &str, cells: &[&Value]) -> IngestionResult<DataContainer> {
    let mut non_null = cells.iter().filter(|v| !v.is_null()).peekable();
    let nested = non_null.peek().is_some() && non_null.all(|v| v.is_object());

    let column = if nested {
        let records: Vec<Value> = cells.iter().map(|v| (*v).clone()).collect();
        records_to_columns(&records)?
    } else {
        DataContainer::from_values(cells.iter().map(|v| scalar_from_json(v)))
    };
    column.with_label(label);
    Ok(column)
}

/// Convert one JSON value into a scalar.
///
/// Numbers that fit an `i64` become [`Scalar::Integer`]; other numbers become [`Scalar::Number`].
/// Arrays and objects are kept as their JSON text.
pub fn scalar_from_json(v: &Value) -> Scalar {
    match v {
        Value::Null => Scalar::Null,
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Scalar::Integer(i),
            None => n.as_f64().map_or(Scalar::Null, Scalar::Number),
        },
        Value::String(s) => Scalar::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => Scalar::Text(v.to_string()),
    }
}

/// Convert a scalar back into JSON. Integers stay integers and floats stay floats (`2.0` is not
/// narrowed to `2`); non-finite floats become `null`.
pub fn scalar_to_json(s: &Scalar) -> Value {
    match s {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::Text(t) => Value::String(t.clone()),
        Scalar::Integer(i) => Value::from(*i),
        Scalar::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
    }
}

/// Re-transpose a column branch (as produced by [`records_to_columns`]) back into records.
///
/// Nested column branches become nested objects.
pub fn columns_to_records(container: &DataContainer) -> Vec<Value> {
    let columns = container.children();
    let row_count = columns.iter().map(column_len).max().unwrap_or(0);
    let column_cells: Vec<(String, Vec<Value>)> = columns
        .iter()
        .map(|c| (c.label().unwrap_or_default(), column_cells(c)))
        .collect();

    (0..row_count)
        .map(|row| {
            let mut obj = Map::new();
            for (key, cells) in &column_cells {
                obj.insert(key.clone(), cells.get(row).cloned().unwrap_or(Value::Null));
            }
            Value::Object(obj)
        })
        .collect()
}

fn column_len(c: &DataContainer) -> usize {
    if c.is_leaf() {
        c.len()
    } else {
        c.children().iter().map(column_len).max().unwrap_or(0)
    }
}

fn column_cells(c: &DataContainer) -> Vec<Value> {
    match c.values() {
        Some(values) => values.iter().map(scalar_to_json).collect(),
        None => columns_to_records(c),
    }
}

use serde_json::json;

use datatree_ingest::ingestion::json::{columns_to_records, parse_json_str, transpose_json};
use datatree_ingest::ingestion::{AdapterRegistry, JsonpEnvelopeAdapter, WeatherServiceAdapter};
use datatree_ingest::types::Scalar;
use datatree_ingest::ErrorKind;

fn integers(values: &[i64]) -> Vec<Scalar> {
    values.iter().map(|v| Scalar::Integer(*v)).collect()
}

#[test]
fn fixture_array_of_records_is_transposed() {
    let text = std::fs::read_to_string("tests/fixtures/people.json").unwrap();
    let top = transpose_json(&parse_json_str(&text).unwrap()).unwrap();

    assert_eq!(top.len(), 4);
    assert_eq!(top.child("id").unwrap().values().unwrap(), integers(&[1, 2]));
    assert_eq!(
        top.child("active").unwrap().values().unwrap(),
        vec![Scalar::Bool(true), Scalar::Bool(false)]
    );
    assert_eq!(
        top.child("name").unwrap().values().unwrap(),
        vec![Scalar::Text("Ada".to_string()), Scalar::Text("Grace".to_string())]
    );
}

#[test]
fn every_column_has_one_entry_per_record() {
    let v = json!([{"a": 1}, {"b": 2}, {"a": 3, "c": "x"}]);
    let top = transpose_json(&v).unwrap();
    let labels: Vec<_> = top.children().iter().filter_map(|c| c.label()).collect();
    assert_eq!(labels, vec!["a", "b", "c"]);
    for column in top.children() {
        assert_eq!(column.len(), 3);
    }
    assert_eq!(
        top.child("a").unwrap().values().unwrap(),
        vec![Scalar::Integer(1), Scalar::Null, Scalar::Integer(3)]
    );
}

#[test]
fn nested_objects_become_nested_branches() {
    let v = json!([
        {"id": 1, "user": {"name": "Ada"}},
        {"id": 2, "user": {"name": "Grace"}}
    ]);
    let top = transpose_json(&v).unwrap();
    let user = top.child("user").unwrap();
    assert!(user.is_branch());
    assert_eq!(
        user.child("name").unwrap().values().unwrap(),
        vec![Scalar::Text("Ada".to_string()), Scalar::Text("Grace".to_string())]
    );
    assert!(user.parent().unwrap().ptr_eq(&top));

    assert_eq!(columns_to_records(&top), v.as_array().unwrap().clone());
}

#[test]
fn ndjson_is_accepted() {
    let v = parse_json_str("{\"x\": 1}\n{\"x\": 2}\n").unwrap();
    let top = transpose_json(&v).unwrap();
    assert_eq!(top.child("x").unwrap().values().unwrap(), integers(&[1, 2]));
}

#[test]
fn malformed_json_is_a_format_error() {
    let err = parse_json_str("{\"x\": ").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(err.to_string().contains("invalid json"));
}

#[test]
fn bare_scalar_document_is_rejected() {
    let err = transpose_json(&json!(42)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn jsonp_fixture_goes_through_envelope_adapter() {
    let text = std::fs::read_to_string("tests/fixtures/hourly.jsonp").unwrap();
    let v = parse_json_str(&text).unwrap();

    let registry = AdapterRegistry::new().with(std::sync::Arc::new(JsonpEnvelopeAdapter));
    let top = registry.transpose("tests/fixtures/hourly.jsonp", &v).unwrap();
    assert_eq!(top.label().as_deref(), Some("hourly_forecast"));
    assert_eq!(top.child("temp").unwrap().values().unwrap(), integers(&[12, 15]));
}

#[test]
fn weather_adapter_only_applies_to_matching_locators() {
    let current = json!({
        "response": {"version": "0.1"},
        "current_observation": {"temp_c": 11.5, "weather": "Overcast"}
    });
    let registry = AdapterRegistry::new().with(std::sync::Arc::new(WeatherServiceAdapter::default()));

    let top = registry
        .transpose("https://api.wunderground.com/conditions.json", &current)
        .unwrap();
    assert_eq!(top.label().as_deref(), Some("current_observation"));
    assert_eq!(top.child("temp_c").unwrap().values().unwrap(), vec![Scalar::Number(11.5)]);

    // Elsewhere the same document is a plain single record.
    let generic = registry.transpose("https://example.org/conditions.json", &current).unwrap();
    assert!(generic.child("response").is_some());
    assert!(generic.child("current_observation").unwrap().is_branch());
}

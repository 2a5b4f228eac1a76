use chrono::{DateTime, TimeZone, Utc};
use rfc_health::{ComponentDetail, Health, Key, ObservedValue, Status};
use serde_json::{json, Value};

const RFC_EXAMPLE: &str = include_str!("testdata/rfc.json");

fn observed() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 1, 17, 3, 36, 48).unwrap()
}

fn system_detail(key: &Key, value: ObservedValue, unit: &str, status: Status, node: u64) -> ComponentDetail {
    ComponentDetail::new(key.clone(), status)
        .with_component_id("6fd416e0-8920-410f-9c7b-c479000f7227")
        .with_component_type("system")
        .with_observed_value(value)
        .with_observed_unit(unit)
        .with_time(observed())
        .with_property("node", json!(node))
}

/// Drops `"output": ""` members, which the sparse encoding never emits.
fn strip_empty_output(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if map.get("output") == Some(&json!("")) {
                map.remove("output");
            }
            map.values_mut().for_each(strip_empty_output);
        }
        Value::Array(items) => items.iter_mut().for_each(strip_empty_output),
        _ => {}
    }
}

#[test]
fn test_rfc_example_can_be_decoded() {
    let health = Health::from_json(RFC_EXAMPLE.as_bytes()).expect("RFC example should decode");

    assert_eq!(health.status(), Status::Pass);
    assert_eq!(health.version.as_deref(), Some("1"));
    assert_eq!(health.release_id.as_deref(), Some("1.2.2"));
    assert_eq!(health.notes, vec![String::new()]);
    assert!(health.output.is_none());
    assert_eq!(health.service_id.as_deref(), Some("f03e522f-1f44-4062-9b55-9587f91c9c41"));
    assert_eq!(health.description.as_deref(), Some("health of authz service"));
    assert_eq!(health.links["about"], "http://api.example.com/about/authz");
    assert_eq!(
        health.links["http://api.x.io/rel/thresholds"],
        "http://api.x.io/about/authz/thresholds"
    );

    let keys: Vec<_> = health.checks().keys().map(ToString::to_string).collect();
    assert_eq!(
        keys,
        vec![
            "cassandra:responseTime",
            "cassandra:connections",
            "uptime",
            "cpu:utilization",
            "memory:utilization",
        ]
    );

    let response_time = Key::new("cassandra", "responseTime");
    assert_eq!(
        health.checks().get(&response_time).unwrap(),
        &[ComponentDetail::new(response_time.clone(), Status::Pass)
            .with_component_id("dfd6cf2b-1b6e-4412-a0b8-f6f7797a60d2")
            .with_component_type("datastore")
            .with_observed_value(250u64)
            .with_observed_unit("ms")
            .with_affected_endpoints([
                "/users/{userId}",
                "/customers/{customerId}/status",
                "/shopping/{anything}",
            ])
            .with_time(observed())][..]
    );

    let connections = Key::new("cassandra", "connections");
    let detail = &health.checks().get(&connections).unwrap()[0];
    assert_eq!(detail.status, Status::Warn);
    assert_eq!(detail.links["self"], "http://api.example.com/dbnode/dfd6cf2b/health");

    let uptime = Key::component("uptime");
    let detail = &health.checks().get(&uptime).unwrap()[0];
    assert_eq!(detail.observed_value, ObservedValue::from_f64(1209600.245));
    assert!(detail.component_id.is_none());

    let cpu = Key::new("cpu", "utilization");
    assert_eq!(
        health.checks().get(&cpu).unwrap(),
        &[
            system_detail(&cpu, 85u64.into(), "percent", Status::Warn, 1),
            system_detail(&cpu, 85u64.into(), "percent", Status::Warn, 2),
        ][..]
    );

    let memory = Key::new("memory", "utilization");
    assert_eq!(
        health.checks().get(&memory).unwrap(),
        &[
            system_detail(&memory, ObservedValue::from_f64(8.5).unwrap(), "GiB", Status::Warn, 1),
            system_detail(&memory, 5500u64.into(), "MiB", Status::Pass, 2),
        ][..]
    );
}

#[test]
fn test_rfc_example_re_encodes_sparsely() {
    let health = Health::from_json(RFC_EXAMPLE.as_bytes()).unwrap();
    let encoded = health.to_json().unwrap();

    let mut expected: Value = serde_json::from_str(RFC_EXAMPLE).unwrap();
    strip_empty_output(&mut expected);
    let actual: Value = serde_json::from_slice(&encoded).unwrap();
    assert_eq!(actual, expected);

    let again = Health::from_json(&encoded).unwrap();
    assert_eq!(again, health);
    assert_eq!(
        again.checks().keys().collect::<Vec<_>>(),
        health.checks().keys().collect::<Vec<_>>()
    );
}

#[test]
fn test_report_without_status_is_rejected() {
    assert!(Health::from_json(br#"{"version": "1"}"#).is_err());
    assert!(Health::from_json(br#"{"status": "unknown"}"#).is_err());
}

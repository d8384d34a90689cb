//! Resource services exercised against a local API stand-in.
//!
//! These tests cover envelope wrapping, both pagination styles and the
//! per-resource headers, as seen on the wire.

use std::time::Duration;

use pagerduty::custom_fields::{
    CustomField, DataType, DefaultValue, FieldConfiguration, FieldValue, IncidentCustomField,
};
use pagerduty::workflows::{IncidentWorkflowTrigger, TriggerType};
use pagerduty::{Client, ErrorKind, Reference, RetryConfig};
use serde_json::json;

mod utils;
use utils::{set_sequential_responder, start_mitm};

fn client(addr: std::net::SocketAddr) -> Client {
    let retry = RetryConfig {
        delay: Duration::from_millis(1),
        ..RetryConfig::default()
    };
    Client::with_endpoint_retry("dummy", format!("http://{addr}"), None, retry)
        .expect("create client")
}

#[tokio::test]
async fn custom_fields_list_walks_offsets() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let seen = set_sequential_responder(
        &handler,
        vec![
            (
                200,
                json!({
                    "fields": [{"id": "F1", "name": "env", "datatype": "string"}],
                    "offset": 0, "limit": 1, "more": true
                })
                .to_string(),
            ),
            (
                200,
                json!({
                    "fields": [{"id": "F2", "name": "region", "datatype": "integer", "multi_value": true}],
                    "offset": 1, "limit": 1, "more": false
                })
                .to_string(),
            ),
        ],
    );

    let fields = client(addr)
        .resources::<CustomField>()
        .list(&[("include[]", "field_options")])
        .await
        .expect("list fields");

    let ids: Vec<_> = fields.iter().filter_map(|f| f.id.as_deref()).collect();
    assert_eq!(ids, ["F1", "F2"]);
    assert_eq!(fields.get(1).and_then(|f| f.data_type), Some(DataType::Integer));

    let seen = seen.lock().expect("lock seen");
    assert_eq!(seen.len(), 2);
    for (req, offset) in seen.iter().zip(["offset=0", "offset=1"]) {
        assert_eq!(req.path, "/customfields/fields");
        assert!(req.query.contains(offset), "{}", req.query);
        assert!(req.query.contains("include%5B%5D=field_options"), "{}", req.query);
    }
    drop(seen);
    shutdown.shutdown().await;
}

#[tokio::test]
async fn workflow_triggers_page_by_token_with_early_access() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let seen = set_sequential_responder(
        &handler,
        vec![
            (
                200,
                json!({
                    "triggers": [{"id": "T1", "trigger_type": "manual"}],
                    "next_page_token": "abc"
                })
                .to_string(),
            ),
            (
                200,
                json!({
                    "triggers": [{"id": "T2", "trigger_type": "sometime_later"}],
                    "next_page_token": null
                })
                .to_string(),
            ),
        ],
    );

    let triggers = client(addr)
        .resources::<IncidentWorkflowTrigger>()
        .list(&[])
        .await
        .expect("list triggers");

    let types: Vec<_> = triggers.iter().filter_map(|t| t.trigger_type).collect();
    assert_eq!(types, [TriggerType::Manual, TriggerType::Unknown]);

    let seen = seen.lock().expect("lock seen");
    assert_eq!(seen.len(), 2);
    assert!(!seen.iter().any(|r| r.query.contains("offset")));
    assert!(!seen.first().expect("first").query.contains("page_token"));
    assert_eq!(seen.get(1).expect("second").query, "page_token=abc");
    for req in seen.iter() {
        assert_eq!(
            req.header("x-early-access"),
            Some("incident-workflows-early-access")
        );
    }
    drop(seen);
    shutdown.shutdown().await;
}

#[tokio::test]
async fn field_configuration_create_wraps_body() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let seen = set_sequential_responder(
        &handler,
        vec![(
            201,
            json!({
                "field_configuration": {
                    "id": "FC1",
                    "type": "field_configuration",
                    "required": true,
                    "field": {"id": "F1", "type": "field_reference"},
                    "default_value": {"datatype": "integer", "multi_value": true, "value": [42, 78]}
                }
            })
            .to_string(),
        )],
    );

    let config = FieldConfiguration {
        required: true,
        field: CustomField {
            id: Some("F1".into()),
            ..CustomField::default()
        },
        default_value: Some(
            DefaultValue::new(DataType::Integer, true, FieldValue::Integers(vec![42, 78]))
                .expect("legal default"),
        ),
        ..FieldConfiguration::default()
    };
    let created = client(addr)
        .field_configurations("S1")
        .create(&config)
        .await
        .expect("create");

    assert_eq!(created.id.as_deref(), Some("FC1"));
    assert_eq!(
        created.default_value.map(DefaultValue::into_value),
        Some(FieldValue::Integers(vec![42, 78]))
    );

    let seen = seen.lock().expect("lock seen");
    let req = seen.first().expect("one request");
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/customfields/schemas/S1/field_configurations");
    assert_eq!(
        req.json(),
        json!({
            "field_configuration": {
                "required": true,
                "field": {"id": "F1", "multi_value": false, "fixed_options": false},
                "default_value": {"datatype": "integer", "multi_value": true, "value": [42, 78]}
            }
        })
    );
    drop(seen);
    shutdown.shutdown().await;
}

#[tokio::test]
async fn incident_field_get_decodes_default_from_siblings() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let seen = set_sequential_responder(
        &handler,
        vec![(
            200,
            json!({
                "field": {
                    "id": "PT4KHLK",
                    "type": "field",
                    "name": "environment",
                    "data_type": "string",
                    "field_type": "multi_value",
                    "default_value": ["dev", "prod"]
                }
            })
            .to_string(),
        )],
    );

    let field = client(addr)
        .resources::<IncidentCustomField>()
        .get("PT4KHLK", &[])
        .await
        .expect("get field");

    assert_eq!(
        field.default_value,
        Some(FieldValue::Strings(vec!["dev".into(), "prod".into()]))
    );
    assert_eq!(
        field.reference(),
        Some(Reference::new("PT4KHLK", "field_reference"))
    );
    assert_eq!(
        seen.lock().expect("lock seen").first().expect("request").path,
        "/incidents/custom_fields/PT4KHLK"
    );
    shutdown.shutdown().await;
}

#[tokio::test]
async fn update_and_delete_target_the_item_path() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let seen = set_sequential_responder(
        &handler,
        vec![
            (200, json!({"field": {"id": "F1", "name": "renamed"}}).to_string()),
            (204, String::new()),
        ],
    );
    let client = client(addr);
    let fields = client.resources::<CustomField>();
    let updated = fields
        .update(
            "F1",
            &CustomField {
                name: Some("renamed".into()),
                ..CustomField::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.name.as_deref(), Some("renamed"));
    fields.delete("F1").await.expect("delete");

    let seen = seen.lock().expect("lock seen");
    let calls: Vec<_> = seen
        .iter()
        .map(|r| (r.method.as_str(), r.path.as_str()))
        .collect();
    assert_eq!(
        calls,
        [("PUT", "/customfields/fields/F1"), ("DELETE", "/customfields/fields/F1")]
    );
    assert_eq!(
        seen.first().expect("put").json(),
        json!({"field": {"name": "renamed", "multi_value": false, "fixed_options": false}})
    );
    drop(seen);
    shutdown.shutdown().await;
}

#[tokio::test]
async fn missing_resource_is_a_client_error() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    let seen = set_sequential_responder(
        &handler,
        vec![(
            404,
            json!({"error": {"message": "Not Found", "code": 2100}}).to_string(),
        )],
    );
    let err = client(addr)
        .resources::<CustomField>()
        .get("NOPE", &[])
        .await
        .expect_err("404");
    assert_eq!(err.kind(), ErrorKind::Client);
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.api_error().map(|e| e.code), Some(2100));
    assert_eq!(seen.lock().expect("lock seen").len(), 1);
    shutdown.shutdown().await;
}

#[tokio::test]
async fn list_missing_plural_key_is_a_schema_error() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    set_sequential_responder(
        &handler,
        vec![(200, json!({"items": [], "more": false}).to_string())],
    );
    let err = client(addr)
        .resources::<CustomField>()
        .list(&[])
        .await
        .expect_err("no fields key");
    assert_eq!(err.kind(), ErrorKind::Schema);
    shutdown.shutdown().await;
}

#[tokio::test]
async fn create_schema_error_keeps_response_status() {
    let (addr, handler, shutdown) = start_mitm().await.expect("start server");
    set_sequential_responder(&handler, vec![(201, json!({"created": true}).to_string())]);
    let field = CustomField {
        name: Some("environment".into()),
        ..CustomField::default()
    };
    let err = client(addr)
        .resources::<CustomField>()
        .create(&field)
        .await
        .expect_err("no field key");
    assert_eq!(err.kind(), ErrorKind::Schema);
    assert_eq!(err.status(), Some(201));
    shutdown.shutdown().await;
}

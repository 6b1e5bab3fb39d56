mod common;

use chrono::{TimeZone, Utc};
use common::{mock_connection, sample_customer, Customer, Journal, Note, Reading};
use fold_entity::protocol::{LogLevel, MutateResponse, Property};
use fold_entity::query::mutate::{mutate_properties, on_conflict_use_id};
use fold_entity::query::retrieve::{
    with_children, with_decrypted_properties, with_dynamic_properties, with_labels, with_lock,
    with_properties,
};
use fold_entity::{Entity, EntityError, PropertyValue};
use std::collections::BTreeMap;

#[tokio::test]
async fn test_create_assigns_id_and_defines_schema_once() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "10.0.0.1", "user-1", "tests");

    let mut first = sample_customer();
    actor.create(&mut first, "first", &[]).await.unwrap();
    let mut second = sample_customer();
    second.email = "jane@example.com".to_string();
    actor.create(&mut second, "second", &[]).await.unwrap();

    assert!(!first.entity_id().is_empty());
    assert_eq!(first.entity_id, first.entity_id().to_string());
    assert_ne!(first.entity_id(), second.entity_id());
    assert_eq!(transport.define_count("customer").unwrap(), 1);
    assert_eq!(transport.entity_count().unwrap(), 2);

    let request = transport.last_mutate().unwrap().unwrap();
    assert_eq!(request.authorization.workspace_id, "ws-1");
    assert_eq!(request.mutation.comment, "second");
    assert_eq!(request.mutation.mutator.user_id, "user-1");
    assert_eq!(request.mutation.mutator.remote_ip, "10.0.0.1");
    assert_eq!(request.mutation.mutator.client, "fold-entity-rust");
    assert_eq!(request.schema.unwrap().key, "customer");
}

#[tokio::test]
async fn test_create_rejects_existing_entity() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = sample_customer();
    customer.base.entity_id = "ent-1".to_string();

    let result = actor.create(&mut customer, "", &[]).await;
    assert!(matches!(result, Err(EntityError::InvalidInput(_))));
    assert!(transport.mutate_calls().unwrap().is_empty());
}

#[tokio::test]
async fn test_get_round_trip_masks_secret_without_decrypt() {
    let (_transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "user-1", "");

    let mut customer = sample_customer();
    actor.create(&mut customer, "", &[]).await.unwrap();

    let mut loaded = Customer::default();
    actor
        .get_by_id(customer.entity_id(), &mut loaded, &[with_children("line_items", &[])])
        .await
        .unwrap();

    assert_eq!(loaded.entity_id, customer.entity_id);
    assert_eq!(loaded.name, "John Doe");
    assert_eq!(loaded.address, customer.address);
    assert_eq!(loaded.balance, customer.balance);
    let items: Vec<(&str, i64)> = loaded
        .line_items
        .iter()
        .map(|i| (i.name.as_str(), i.quantity))
        .collect();
    assert_eq!(items, vec![("widget", 2), ("gadget", 5)]);
    assert!(loaded.line_items.iter().all(|i| !i.id.is_empty()));
    assert_eq!(loaded.secret.masked, "J**n D*e");
    assert!(loaded.secret.original.is_empty());
    assert!(loaded.base.has_snapshot());
    assert_eq!(loaded.base.details().state, "active");

    let mut decrypted = Customer::default();
    actor
        .get_by_id(customer.entity_id(), &mut decrypted, &[with_decrypted_properties(&["secret"])])
        .await
        .unwrap();
    assert_eq!(decrypted.secret.original, "John Doe");
    // only the requested property group came back
    assert!(decrypted.name.is_empty());
}

#[tokio::test]
async fn test_get_sends_scoped_view() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = sample_customer();
    actor.create(&mut customer, "", &[]).await.unwrap();

    let mut loaded = Customer::default();
    actor
        .get_by_id(
            customer.entity_id(),
            &mut loaded,
            &[with_decrypted_properties(&["secret"]), with_labels()],
        )
        .await
        .unwrap();

    let request = transport.retrieve_calls().unwrap().pop().unwrap();
    let source = request.view.properties[0].source.clone().unwrap();
    assert_eq!(source.vendor_id, "vendor");
    assert_eq!(source.app_id, "app");
    assert!(request.view.labels);
    assert_eq!(request.schema.unwrap().key, "customer");
}

#[tokio::test]
async fn test_update_after_get_sends_only_changes() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = sample_customer();
    actor.create(&mut customer, "", &[]).await.unwrap();

    let mut loaded = Customer::default();
    actor
        .get_by_id(customer.entity_id(), &mut loaded, &[with_children("line_items", &[])])
        .await
        .unwrap();
    loaded.name = "Jane Doe".to_string();
    loaded.line_items[0].quantity = 3;

    actor.update(&mut loaded, "rename", &[]).await.unwrap();

    let request = transport.last_mutate().unwrap().unwrap();
    assert_eq!(request.entity_id.as_deref(), Some(customer.entity_id()));
    assert_eq!(
        request.mutation.properties,
        vec![Property::new("name", PropertyValue::text("Jane Doe"))]
    );
    assert_eq!(request.mutation.children.len(), 1);
    assert_eq!(request.mutation.children[0].child_id, loaded.line_items[0].id);
    assert!(!loaded.base.has_snapshot());

    let stored = transport.entity(customer.entity_id()).unwrap().unwrap();
    assert_eq!(
        stored
            .properties
            .iter()
            .find(|p| p.name == "name")
            .map(|p| p.value.text.as_str()),
        Some("Jane Doe")
    );
    assert_eq!(transport.entity_count().unwrap(), 1);
}

#[tokio::test]
async fn test_update_without_snapshot_sends_everything() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = sample_customer();
    actor.create(&mut customer, "", &[]).await.unwrap();
    let sent_on_create = transport.last_mutate().unwrap().unwrap().mutation.properties.len();

    customer.age = 43;
    actor.update(&mut customer, "", &[]).await.unwrap();

    let request = transport.last_mutate().unwrap().unwrap();
    assert_eq!(request.mutation.properties.len(), sent_on_create);
}

#[tokio::test]
async fn test_write_clears_one_shot_state() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = sample_customer();
    customer.base.add_label("tier", "gold");
    customer
        .base
        .add_event("signed_up", BTreeMap::from([("plan".to_string(), "pro".to_string())]));
    customer
        .base
        .log(LogLevel::Info, "created", "", "tests", "", BTreeMap::new());
    actor.create(&mut customer, "", &[]).await.unwrap();

    let request = transport.last_mutate().unwrap().unwrap();
    assert_eq!(request.mutation.events.len(), 1);
    assert_eq!(request.mutation.logs.len(), 1);
    assert_eq!(request.mutation.labels.len(), 1);

    assert!(customer.base.events().is_empty());
    assert!(customer.base.logs().is_empty());
    // labels are resent with each write
    assert_eq!(customer.base.labels().len(), 1);

    let stored = transport.entity(customer.entity_id()).unwrap().unwrap();
    assert_eq!(stored.events.len(), 1);
    assert_eq!(stored.labels[0].name, "tier");
}

#[tokio::test]
async fn test_removed_property_is_sent_once() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = sample_customer();
    actor.create(&mut customer, "", &[]).await.unwrap();

    customer.base.remove_property("age");
    actor.update(&mut customer, "", &[]).await.unwrap();
    let request = transport.last_mutate().unwrap().unwrap();
    assert_eq!(request.mutation.remove_properties, vec!["age".to_string()]);
    assert!(customer.base.removed_properties().is_empty());
}

#[tokio::test]
async fn test_empty_id_is_rejected_without_rpc() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = Customer::default();
    let result = actor.get_by_id("", &mut customer, &[]).await;
    assert!(matches!(result, Err(EntityError::InvalidInput(_))));

    let generic = actor.get_generic("customer", "", &[]).await;
    assert!(matches!(generic, Err(EntityError::InvalidInput(_))));

    let unique = actor
        .get_by_unique_property("", "john@example.com", &mut customer, &[])
        .await;
    assert!(matches!(unique, Err(EntityError::InvalidInput(_))));

    assert!(transport.retrieve_calls().unwrap().is_empty());
    assert!(transport.define_calls().unwrap().is_empty());
}

#[tokio::test]
async fn test_remote_error_is_surfaced() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");
    transport
        .queue_mutate_response(MutateResponse {
            success: false,
            entity_id: String::new(),
            error_code: 409,
            error_message: "duplicate unique property".to_string(),
        })
        .unwrap();

    let mut customer = sample_customer();
    let error = actor.create(&mut customer, "", &[]).await.unwrap_err();

    assert!(matches!(error, EntityError::Remote { code: 409, .. }));
    assert_eq!(error.to_string(), "error 409: duplicate unique property");
    assert!(customer.entity_id().is_empty());
}

#[tokio::test]
async fn test_unapplied_mutation_leaves_record_unchanged() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");
    transport
        .queue_mutate_response(MutateResponse::default())
        .unwrap();

    let mut customer = sample_customer();
    customer.base.add_event("ping", BTreeMap::new());
    actor.create(&mut customer, "", &[]).await.unwrap();

    assert!(customer.entity_id().is_empty());
    assert_eq!(customer.base.events().len(), 1);
}

#[tokio::test]
async fn test_transport_error_propagates() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");
    connection.ensure_registered::<Customer>().await.unwrap();
    transport.queue_transport_error("connection reset").unwrap();

    let mut customer = sample_customer();
    let result = actor.create(&mut customer, "", &[]).await;
    assert!(matches!(
        result,
        Err(EntityError::Transport(message)) if message == "connection reset"
    ));
}

#[tokio::test]
async fn test_get_missing_entity_reports_not_found() {
    let (_transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = Customer::default();
    let result = actor.get_by_id("missing", &mut customer, &[]).await;
    assert!(matches!(result, Err(EntityError::Remote { code: 404, .. })));
}

#[tokio::test]
async fn test_get_by_unique_property() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = sample_customer();
    actor.create(&mut customer, "", &[]).await.unwrap();

    let mut loaded = Customer::default();
    actor
        .get_by_unique_property("email", "john@example.com", &mut loaded, &[])
        .await
        .unwrap();
    assert_eq!(loaded.entity_id, customer.entity_id);

    // unique lookups address the schema by its server id
    let schema = connection.registry().schema::<Customer>().unwrap().unwrap();
    let request = transport.retrieve_calls().unwrap().pop().unwrap();
    match request.locator {
        fold_entity::protocol::EntityLocator::ByUnique { schema_id, .. } => {
            assert_eq!(schema_id, schema.id)
        }
        other => panic!("unexpected locator {:?}", other),
    }
}

#[tokio::test]
async fn test_on_conflict_reuses_existing_entity() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut first = sample_customer();
    actor.create(&mut first, "", &[]).await.unwrap();

    let mut duplicate = sample_customer();
    duplicate.age = 50;
    actor
        .mutate(&mut duplicate, "", &[on_conflict_use_id(&["email"])])
        .await
        .unwrap();

    assert_eq!(duplicate.entity_id(), first.entity_id());
    assert_eq!(transport.entity_count().unwrap(), 1);
}

#[tokio::test]
async fn test_find_records_and_generic_results() {
    let (_transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    for (name, email) in [("Ada", "ada@example.com"), ("Grace", "grace@example.com")] {
        let mut customer = sample_customer();
        customer.name = name.to_string();
        customer.email = email.to_string();
        actor.create(&mut customer, "", &[]).await.unwrap();
    }

    let records: Vec<Customer> = actor.find_records(&[]).await.unwrap();
    let mut names: Vec<&str> = records.iter().map(|c| c.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Ada", "Grace"]);
    assert!(records.iter().all(|c| !c.entity_id.is_empty() && c.base.has_snapshot()));

    let generic = actor.find_generic("customer", &[]).await.unwrap();
    assert_eq!(generic.len(), 2);
    assert!(generic.iter().all(|g| g.text("email").is_some()));

    let one = actor
        .get_generic("customer", &records[0].entity_id, &[])
        .await
        .unwrap();
    assert_eq!(one.entity_id, records[0].entity_id);
    assert_eq!(one.text("name"), Some(records[0].name.as_str()));
}

#[tokio::test]
async fn test_remote_mutate_sends_only_events_and_logs() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = sample_customer();
    assert!(matches!(
        actor.remote_mutate(&mut customer, "").await,
        Err(EntityError::InvalidInput(_))
    ));

    actor.create(&mut customer, "", &[]).await.unwrap();
    customer.name = "Changed".to_string();
    customer.base.add_event("login", BTreeMap::new());
    actor.remote_mutate(&mut customer, "audit").await.unwrap();

    let request = transport.last_mutate().unwrap().unwrap();
    assert!(request.mutation.properties.is_empty());
    assert!(request.schema.is_none());
    assert_eq!(request.mutation.events.len(), 1);
    assert!(customer.base.events().is_empty());

    let stored = transport.entity(customer.entity_id()).unwrap().unwrap();
    assert_eq!(stored.events.len(), 1);
}

#[tokio::test]
async fn test_dynamic_properties_round_trip() {
    let (_transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = sample_customer();
    actor.create(&mut customer, "", &[]).await.unwrap();
    let id = customer.entity_id().to_string();

    actor
        .set_dynamic_properties(
            &id,
            vec![
                Property::new("colour", PropertyValue::text("blue")),
                Property::new("score", PropertyValue::int(7)),
            ],
            &[],
            "",
        )
        .await
        .unwrap();
    actor
        .set_dynamic_properties(&id, Vec::new(), &["score"], "")
        .await
        .unwrap();

    let values = actor.get_dynamic_properties(&id, &["colour", "score"]).await.unwrap();
    assert_eq!(values.get("colour"), Some(&PropertyValue::text("blue")));
    assert!(values.get("score").is_none());

    // dynamic properties never show up among declared ones
    let mut loaded = Customer::default();
    actor
        .get_by_id(&id, &mut loaded, &[with_dynamic_properties(&["colour"])])
        .await
        .unwrap();
    assert_eq!(loaded.name, "John Doe");

    assert!(matches!(
        actor.set_dynamic_properties("", Vec::new(), &[], "").await,
        Err(EntityError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_actor_identity_and_client_override() {
    let (transport, connection) = mock_connection();
    let mut actor = connection.actor("ws-9", "192.168.1.4", "user-2", "agent/1.0");

    assert_eq!(actor.workspace_id(), "ws-9");
    assert_eq!(actor.user_agent(), "agent/1.0");
    assert_eq!(actor.vendor_id(), "vendor");
    assert_eq!(actor.app_id(), "app");
    assert_eq!(actor.authorization().access_token, "token");

    actor.set_client("batch-import");
    let mut customer = sample_customer();
    actor.create(&mut customer, "", &[]).await.unwrap();

    let request = transport.last_mutate().unwrap().unwrap();
    assert_eq!(request.mutation.mutator.client, "batch-import");
    assert_eq!(request.mutation.mutator.user_agent, "agent/1.0");
}

fn note(text: &str) -> Note {
    Note {
        text: text.to_string(),
    }
}

#[tokio::test]
async fn test_update_does_not_resend_children_without_ids() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut journal = Journal {
        name: "Trip".to_string(),
        notes: vec![note("packed"), note("left")],
        ..Journal::default()
    };
    actor.create(&mut journal, "", &[]).await.unwrap();
    let id = journal.entity_id().to_string();

    let mut loaded = Journal::default();
    actor
        .get_by_id(&id, &mut loaded, &[with_children("notes", &[])])
        .await
        .unwrap();
    assert_eq!(loaded.notes.len(), 2);
    loaded.name = "Road trip".to_string();
    actor.update(&mut loaded, "", &[]).await.unwrap();

    let request = transport.last_mutate().unwrap().unwrap();
    assert!(request.mutation.children.is_empty());
    assert_eq!(request.mutation.properties.len(), 1);
    assert_eq!(transport.entity(&id).unwrap().unwrap().children.len(), 2);

    let mut loaded = Journal::default();
    actor
        .get_by_id(&id, &mut loaded, &[with_children("notes", &[])])
        .await
        .unwrap();
    loaded.notes.push(note("arrived"));
    actor.update(&mut loaded, "", &[]).await.unwrap();

    let request = transport.last_mutate().unwrap().unwrap();
    assert_eq!(request.mutation.children.len(), 1);
    assert_eq!(transport.entity(&id).unwrap().unwrap().children.len(), 3);
}

#[tokio::test]
async fn test_update_after_projected_get_sends_unloaded_fields() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = sample_customer();
    actor.create(&mut customer, "", &[]).await.unwrap();
    let id = customer.entity_id().to_string();

    let mut partial = Customer::default();
    actor
        .get_by_id(&id, &mut partial, &[with_properties(&["name"])])
        .await
        .unwrap();
    assert!(partial.email.is_empty());
    partial.name = "Jane Doe".to_string();

    actor
        .update(&mut partial.clone(), "", &[mutate_properties(&["name"])])
        .await
        .unwrap();
    let request = transport.last_mutate().unwrap().unwrap();
    assert_eq!(
        request.mutation.properties,
        vec![Property::new("name", PropertyValue::text("Jane Doe"))]
    );

    actor.update(&mut partial, "", &[]).await.unwrap();
    let request = transport.last_mutate().unwrap().unwrap();
    let email = request
        .mutation
        .properties
        .iter()
        .find(|p| p.name == "email")
        .map(|p| p.value.text.as_str());
    assert_eq!(email, Some(""));
}

#[tokio::test]
async fn test_measurements_are_sent_once() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let mut customer = sample_customer();
    customer.base.add_measurement("temperature", 21.5);
    actor.create(&mut customer, "", &[]).await.unwrap();

    let request = transport.last_mutate().unwrap().unwrap();
    assert_eq!(request.mutation.measurements.len(), 1);
    assert_eq!(request.mutation.measurements[0].sensor, "temperature");
    assert!(customer.base.measurements().is_empty());

    customer.base.add_measurement_with_data(
        "humidity",
        40.0,
        BTreeMap::from([("room".to_string(), "lab".to_string())]),
    );
    actor.remote_mutate(&mut customer, "sensor sweep").await.unwrap();

    let request = transport.last_mutate().unwrap().unwrap();
    assert!(request.schema.is_none());
    assert!(request.mutation.properties.is_empty());
    assert_eq!(request.mutation.measurements.len(), 1);
    assert_eq!(request.mutation.measurements[0].data.get("room").unwrap(), "lab");
    assert!(customer.base.measurements().is_empty());

    let stored = transport.entity(customer.entity_id()).unwrap().unwrap();
    let sensors: Vec<&str> = stored.measurements.iter().map(|m| m.sensor.as_str()).collect();
    assert_eq!(sensors, vec!["temperature", "humidity"]);
}

#[tokio::test]
async fn test_report_time_series_appends_points() {
    let (transport, connection) = mock_connection();
    let actor = connection.actor("ws-1", "", "", "");

    let first_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let mut reading = Reading {
        device: "sensor-7".to_string(),
        temperature: 18.25,
        taken_at: Some(first_at),
        ..Reading::default()
    };
    reading.base.add_label("site", "north");
    actor.report_time_series(&mut reading, "").await.unwrap();

    let id = reading.entity_id().to_string();
    assert!(!id.is_empty());
    assert_eq!(transport.define_count("reading").unwrap(), 1);

    reading.temperature = 19.0;
    reading.taken_at = Some(first_at + chrono::Duration::minutes(5));
    actor.report_time_series(&mut reading, "").await.unwrap();

    let calls = transport.time_series_calls().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].entity_id.is_none());
    assert_eq!(calls[1].entity_id.as_deref(), Some(id.as_str()));
    // each point carries every property, changed or not
    assert_eq!(calls[1].mutation.properties.len(), 2);
    assert_eq!(calls[1].mutation.labels[0].name, "site");

    let stored = transport.entity(&id).unwrap().unwrap();
    assert_eq!(transport.entity_count().unwrap(), 1);
    assert_eq!(stored.time_series.len(), 2);
    assert_eq!(stored.time_series[0].timestamp, first_at);
    let temperature = stored
        .properties
        .iter()
        .find(|p| p.name == "temperature")
        .map(|p| p.value.float);
    assert_eq!(temperature, Some(19.0));
}

#[tokio::test]
async fn test_lock_is_granted_to_first_reader_only() {
    let (transport, connection) = mock_connection();
    let editor = connection.actor("ws-1", "", "editor", "");
    let reviewer = connection.actor("ws-1", "", "reviewer", "");

    let mut customer = sample_customer();
    editor.create(&mut customer, "", &[]).await.unwrap();
    let id = customer.entity_id().to_string();

    let mut mine = Customer::default();
    editor
        .get_by_id(&id, &mut mine, &[with_lock(60, "editing")])
        .await
        .unwrap();
    assert!(mine.base.acquired_lock());
    let request = transport.retrieve_calls().unwrap().pop().unwrap();
    assert_eq!(request.view.lock.unwrap().duration_seconds, 60);

    let mut theirs = Customer::default();
    reviewer
        .get_by_id(&id, &mut theirs, &[with_lock(60, "review")])
        .await
        .unwrap();
    assert!(!theirs.base.acquired_lock());
    let held = theirs.base.lock_info().unwrap();
    assert_eq!(held.message, "editing");
    assert_eq!(held.id, mine.base.lock_info().unwrap().id);

    let mut plain = Customer::default();
    reviewer.get_by_id(&id, &mut plain, &[]).await.unwrap();
    assert!(plain.base.lock_info().is_none());
}

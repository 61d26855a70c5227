//! Tests for compiled CRUD statements: virtual host tables for every
//! storage strategy, field selection, pagination, authorization filters
//! and writes.

mod common;
use common::*;

use oxide_resource_core::ResourceError;
use oxide_resource_sql::prelude::*;
use serde_json::{json, Value};

fn read(set: &DefinitionSet, resource: &str, request: &ReadRequest) -> Statement {
    QueryCompiler::new(set)
        .read(resource, request)
        .unwrap_or_else(|e| panic!("Failed to compile read of {resource}: {e}"))
}

#[test]
fn test_guest_one_to_many_aggregates_host_column() {
    let set = definitions(pets());
    let statement = read(&set, "person", &ReadRequest::many());

    assert!(statement.sql.starts_with(
        "WITH pets_virtual_host AS (SELECT cat.owner_id AS host_id, \
         array_agg(cat.id) AS ids FROM cat GROUP BY cat.owner_id) "
    ));
    assert!(statement.sql.contains(
        "(SELECT pets_virtual_host.ids FROM pets_virtual_host \
         WHERE pets_virtual_host.host_id = person.id) AS pet_ids"
    ));
    assert!(statement.sql.contains("ORDER BY person.id"));
}

#[test]
fn test_read_one_filters_virtual_table_by_id() {
    let set = definitions(pets());
    let statement = read(&set, "person", &ReadRequest::one(42));

    assert!(statement
        .sql
        .contains("FROM cat WHERE cat.owner_id = $1 GROUP BY cat.owner_id"));
    assert!(statement.sql.ends_with("FROM person WHERE person.id = $1"));
    assert!(!statement.sql.contains("LIMIT"));
    assert_eq!(statement.params.len(), 1);
    assert_eq!(statement.param("id"), Some(&SqlValue::Int(42)));
}

#[test]
fn test_host_side_reads_local_column() {
    let set = definitions(pets());
    let statement = read(&set, "cat", &ReadRequest::one(1));
    assert_eq!(statement.sql, "SELECT cat.* FROM cat WHERE cat.id = $1");
}

#[test]
fn test_many_to_many_from_both_sides() {
    let set = definitions(pizzas());

    let pizza = read(&set, "pizza", &ReadRequest::one(1));
    assert!(pizza.sql.starts_with(
        "WITH toppings_virtual_host AS (SELECT pizza_topping.pizza_id AS host_id, \
         array_agg(pizza_topping.topping_id) AS ids FROM pizza_topping \
         WHERE pizza_topping.pizza_id = $1 GROUP BY pizza_topping.pizza_id)"
    ));
    assert!(pizza.sql.contains("AS topping_ids"));

    // Inferred on the guest side as the host's plural form.
    let topping = read(&set, "topping", &ReadRequest::one(1));
    assert!(topping.sql.starts_with(
        "WITH pizzas_virtual_host AS (SELECT pizza_topping.topping_id AS host_id, \
         array_agg(pizza_topping.pizza_id) AS ids FROM pizza_topping"
    ));
    assert!(topping.sql.contains("AS pizza_ids"));
}

#[test]
fn test_self_reference_uses_relationship_named_virtual_table() {
    let set = definitions(employees());
    let statement = read(&set, "employee", &ReadRequest::one(3));

    assert!(statement.sql.starts_with(
        "WITH employees_virtual_host AS (SELECT employee.manager_id AS host_id, \
         array_agg(employee.id) AS ids FROM employee WHERE employee.manager_id = $1 \
         GROUP BY employee.manager_id)"
    ));
    assert!(statement.sql.contains(
        "(SELECT employees_virtual_host.ids FROM employees_virtual_host \
         WHERE employees_virtual_host.host_id = employee.id) AS employee_ids"
    ));
}

fn messages(sent: Value, received: Value) -> Vec<Value> {
    vec![
        json!({
            "name": "message",
            "relationships": {
                "sender": { "resource": "account", "cardinality": "many-to-one" },
                "recipient": { "resource": "account", "cardinality": "many-to-one" }
            }
        }),
        json!({
            "name": "account",
            "relationships": { "sent": sent, "received": received }
        }),
    ]
}

#[test]
fn test_two_relationships_to_same_resource() {
    let set = definitions(messages(
        json!({ "resource": "message", "cardinality": "one-to-many", "host": false, "inverse": "sender" }),
        json!({ "resource": "message", "cardinality": "one-to-many", "host": false, "inverse": "recipient" }),
    ));
    let statement = read(&set, "account", &ReadRequest::many());

    assert!(statement.sql.starts_with(
        "WITH received_virtual_host AS (SELECT message.recipient_id AS host_id, \
         array_agg(message.id) AS ids FROM message GROUP BY message.recipient_id), \
         sent_virtual_host AS (SELECT message.sender_id AS host_id, \
         array_agg(message.id) AS ids FROM message GROUP BY message.sender_id) "
    ));
    assert!(statement.sql.contains(
        "(SELECT sent_virtual_host.ids FROM sent_virtual_host \
         WHERE sent_virtual_host.host_id = account.id) AS sent_ids"
    ));
    assert!(statement.sql.contains("AS received_ids"));
}

#[test]
fn test_ambiguous_inverse_fails_to_build() {
    let raw = messages(
        json!({ "resource": "message", "cardinality": "one-to-many", "host": false }),
        json!({ "resource": "message", "cardinality": "one-to-many", "host": false }),
    )
    .into_iter()
    .map(resource)
    .collect();
    let err = DefinitionSet::build(compile_models(raw).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        ResourceError::UnresolvedRelationship { ref reason, .. }
            if reason.contains("ambiguous counterpart")
    ));
}

#[test]
fn test_self_referential_many_to_many() {
    let set = definitions(friends());
    let statement = read(&set, "person", &ReadRequest::one(5));

    assert!(statement.sql.starts_with(
        "WITH friends_virtual_host AS (SELECT person_person.person_id AS host_id, \
         array_agg(person_person.friends_id) AS ids FROM person_person \
         WHERE person_person.person_id = $1 GROUP BY person_person.person_id), \
         persons_virtual_host AS (SELECT person_person.friends_id AS host_id, \
         array_agg(person_person.person_id) AS ids FROM person_person \
         WHERE person_person.friends_id = $1 GROUP BY person_person.friends_id) "
    ));
    assert!(statement.sql.contains(
        "(SELECT friends_virtual_host.ids FROM friends_virtual_host \
         WHERE friends_virtual_host.host_id = person.id) AS friend_ids"
    ));
    // People listing this person as a friend.
    assert!(statement.sql.contains("AS person_ids"));
    assert!(statement.sql.ends_with("FROM person WHERE person.id = $1"));
}

#[test]
fn test_pagination_appends_total_count_and_limit() {
    let set = definitions(pets());
    let statement = read(&set, "cat", &ReadRequest::many().page(Page::new(2, 25)));

    assert_eq!(
        statement.sql,
        "SELECT cat.*, count(*) OVER () AS meta_total_count FROM cat \
         ORDER BY cat.id LIMIT $1 OFFSET $2"
    );
    assert_eq!(statement.param("limit"), Some(&SqlValue::Int(25)));
    assert_eq!(statement.param("offset"), Some(&SqlValue::Int(25)));
}

#[test]
fn test_model_pagination_defaults_and_disabling() {
    let set = definitions(vec![
        json!({ "name": "cat", "pagination": { "default_page_size": 50 } }),
        json!({ "name": "dog", "pagination": false }),
    ]);

    let cats = read(&set, "cat", &ReadRequest::many());
    assert_eq!(cats.param("limit"), Some(&SqlValue::Int(50)));
    assert_eq!(cats.param("offset"), Some(&SqlValue::Int(0)));

    let dogs = read(&set, "dog", &ReadRequest::many().page(Page::new(4, 5)));
    assert_eq!(dogs.sql, "SELECT dog.* FROM dog ORDER BY dog.id");
    assert!(dogs.params.is_empty());
}

#[test]
fn test_field_selection() {
    let set = definitions(pets());
    let statement = read(&set, "person", &ReadRequest::many().fields(["pets"]));
    assert!(statement.sql.contains(
        "SELECT person.id, person.meta_created_at, person.meta_updated_at, \
         (SELECT pets_virtual_host.ids"
    ));
    assert!(!statement.sql.contains("person.name"));

    let err = QueryCompiler::new(&set)
        .read("person", &ReadRequest::many().fields(["age"]))
        .unwrap_err();
    assert!(matches!(err, CompileError::UnknownField { ref field, .. } if field == "age"));
}

#[test]
fn test_authorization_filter_is_anded() {
    let set = definitions(pets());
    let compiler = QueryCompiler::new(&set).with_authorization(
        |definition: &ResourceDefinition, _: &ReadRequest, action: CrudAction| {
            (definition.name() == "cat" && action == CrudAction::ReadOne)
                .then(|| "cat.owner_id IS NOT NULL".to_string())
        },
    );

    let one = compiler.read("cat", &ReadRequest::one(9)).unwrap();
    assert!(one
        .sql
        .ends_with("WHERE cat.id = $1 AND (cat.owner_id IS NOT NULL)"));

    let many = compiler.read("cat", &ReadRequest::many()).unwrap();
    assert!(!many.sql.contains("IS NOT NULL"));
}

#[test]
fn test_disabled_actions_are_rejected() {
    let set = definitions(vec![json!({
        "name": "log",
        "actions": { "update": false, "delete": false }
    })]);
    let compiler = QueryCompiler::new(&set);

    assert!(matches!(
        compiler.update("log", &WriteRequest::new().id(1)),
        Err(CompileError::ActionDisabled {
            action: CrudAction::Update,
            ..
        })
    ));
    assert!(matches!(
        compiler.delete("log", Some(1)),
        Err(CompileError::ActionDisabled {
            action: CrudAction::Delete,
            ..
        })
    ));
    assert!(compiler.create("log", &WriteRequest::new()).is_ok());
}

#[test]
fn test_create_update_delete() {
    let set = definitions(pets());
    let compiler = QueryCompiler::new(&set);

    let create = compiler
        .create(
            "cat",
            &WriteRequest::new().value("name", "Tom").value("owner", 2),
        )
        .unwrap();
    assert_eq!(
        create.sql,
        "INSERT INTO cat (name, owner_id) VALUES ($1, $2) RETURNING *"
    );

    let update = compiler
        .update("cat", &WriteRequest::new().id(7).value("lives", 8))
        .unwrap();
    assert_eq!(
        update.sql,
        "UPDATE cat SET lives = $1 WHERE cat.id = $2 RETURNING *"
    );
    let values: Vec<&SqlValue> = update.values().collect();
    assert_eq!(values, vec![&SqlValue::Int(8), &SqlValue::Int(7)]);

    let delete = compiler.delete("cat", Some(7)).unwrap();
    assert_eq!(delete.sql, "DELETE FROM cat WHERE cat.id = $1 RETURNING *");
}

#[test]
fn test_request_values_never_reach_sql_text() {
    let set = definitions(pets());
    let malicious = "'); DROP TABLE cat; --";
    let statement = QueryCompiler::new(&set)
        .create("cat", &WriteRequest::new().value("name", malicious))
        .unwrap();
    assert!(!statement.sql.contains("DROP"));
    assert_eq!(
        statement.param("name"),
        Some(&SqlValue::Text(malicious.to_string()))
    );
}

#![allow(dead_code)]

use oxide_resource_sql::prelude::*;
use serde_json::{json, Value};

pub fn resource(value: Value) -> RawResource {
    RawResource::from_value(value.clone())
        .unwrap_or_else(|e| panic!("Invalid resource document: {value}\nError: {e}"))
}

pub fn definitions(resources: Vec<Value>) -> DefinitionSet {
    let raw = resources.into_iter().map(resource).collect();
    let models = compile_models(raw).unwrap_or_else(|e| panic!("Failed to compile models: {e}"));
    DefinitionSet::build(models).unwrap_or_else(|e| panic!("Failed to build definitions: {e}"))
}

pub fn migration(resources: Vec<Value>) -> Migration {
    MigrationCompiler::new()
        .compile(&definitions(resources))
        .unwrap_or_else(|e| panic!("Failed to compile migration: {e}"))
}

/// The statement creating `table`.
pub fn create_statement<'a>(migration: &'a Migration, table: &str) -> &'a str {
    let prefix = format!("CREATE TABLE {table} (");
    migration
        .statements
        .iter()
        .find(|s| s.starts_with(&prefix))
        .unwrap_or_else(|| panic!("No CREATE TABLE for {table} in:\n{}", migration.script()))
}

/// `cat` owned by `person`; `person` declares the guest side as `pets`.
pub fn pets() -> Vec<Value> {
    vec![
        json!({
            "name": "cat",
            "attributes": {
                "name": { "type": "text", "nullable": false },
                "lives": { "type": "integer", "default": 9 }
            },
            "relationships": {
                "owner": { "resource": "person", "cardinality": "many-to-one" }
            }
        }),
        json!({
            "name": "person",
            "plural_form": "people",
            "attributes": { "name": "text" },
            "relationships": {
                "pets": { "resource": "cat", "cardinality": "one-to-many", "host": false }
            }
        }),
    ]
}

/// `pizza` hosting a many-to-many relationship to `topping`.
pub fn pizzas() -> Vec<Value> {
    vec![
        json!({
            "name": "pizza",
            "attributes": { "name": "text" },
            "relationships": {
                "toppings": { "resource": "topping", "cardinality": "many-to-many" }
            }
        }),
        json!({ "name": "topping", "attributes": { "name": "text" } }),
    ]
}

/// Employees reporting to a manager of the same resource.
pub fn employees() -> Vec<Value> {
    vec![json!({
        "name": "employee",
        "attributes": { "name": "text" },
        "relationships": {
            "manager": { "resource": "employee", "cardinality": "many-to-one" }
        }
    })]
}

/// `person` befriending other persons through a self-referencing join table.
pub fn friends() -> Vec<Value> {
    vec![json!({
        "name": "person",
        "attributes": { "name": "text" },
        "relationships": {
            "friends": { "resource": "person", "cardinality": "many-to-many" }
        }
    })]
}

//! End-to-end tests from a directory of resource documents to SQL.

use std::fs;

use oxide_resource_core::{loader, ResourceError};
use oxide_resource_sql::prelude::*;

fn write_resources(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, body) in files {
        fs::write(dir.path().join(name), body).unwrap();
    }
    dir
}

#[test]
fn test_directory_to_migration_and_query() {
    let dir = write_resources(&[
        (
            "cat.json",
            r#"{
                "name": "cat",
                "attributes": { "name": "text" },
                "relationships": {
                    "owner": { "resource": "person", "cardinality": "many-to-one" }
                }
            }"#,
        ),
        ("person.json", r#"{ "name": "person" }"#),
    ]);

    let raw = loader::load_dir(dir.path()).unwrap();
    let definitions = DefinitionSet::build(compile_models(raw).unwrap()).unwrap();

    let migration = MigrationCompiler::new().compile(&definitions).unwrap();
    assert_eq!(migration.order, vec!["person", "cat"]);
    assert!(migration
        .script()
        .contains("owner_id INTEGER REFERENCES person(id)"));

    // The inverse was inferred from the cat document alone.
    let statement = QueryCompiler::new(&definitions)
        .read("person", &ReadRequest::one(1))
        .unwrap();
    assert!(statement.sql.contains("AS cat_ids"));
}

#[test]
fn test_shorthand_relationship_targets_its_name() {
    let dir = write_resources(&[
        (
            "cat.json",
            r#"{ "name": "cat", "relationships": { "person": "many-to-one" } }"#,
        ),
        ("person.json", r#"{ "name": "person" }"#),
    ]);

    let raw = loader::load_dir(dir.path()).unwrap();
    let definitions = DefinitionSet::build(compile_models(raw).unwrap()).unwrap();
    let migration = MigrationCompiler::new().compile(&definitions).unwrap();
    assert!(migration
        .script()
        .contains("person_id INTEGER REFERENCES person(id)"));
}

#[test]
fn test_validation_reports_every_document() {
    let dir = write_resources(&[
        ("a.json", r#"{ "name": "Cat" }"#),
        ("b.json", r#"{ "name": "dog", "attributes": { "meta_x": "text" } }"#),
    ]);

    let raw = loader::load_dir(dir.path()).unwrap();
    let Err(ResourceError::ModelValidation(issues)) = compile_models(raw) else {
        panic!("expected validation failure");
    };
    assert!(issues.iter().any(|i| i.resource == "Cat"));
    assert!(issues.iter().any(|i| i.resource == "dog"));
}

#[test]
fn test_unknown_relationship_target_is_unresolved() {
    let dir = write_resources(&[(
        "cat.json",
        r#"{ "name": "cat", "relationships": { "owner": { "resource": "ghost", "cardinality": "many-to-one" } } }"#,
    )]);

    let raw = loader::load_dir(dir.path()).unwrap();
    let err = DefinitionSet::build(compile_models(raw).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        ResourceError::UnresolvedRelationship { ref target, .. } if target == "ghost"
    ));
}

#[test]
fn test_malformed_document_names_its_path() {
    let dir = write_resources(&[("broken.json", "{ not json")]);
    let err = loader::load_dir(dir.path()).unwrap_err();
    let ResourceError::Parse { path, .. } = err else {
        panic!("expected parse error, got {err:?}");
    };
    assert!(path.ends_with("broken.json"));
}

//! INSERT, UPDATE and DELETE statements.
//!
//! Every statement returns the affected row, so callers can tell a deleted
//! row from one that never existed.

use std::collections::BTreeMap;

use oxide_resource_core::{Ident, ResourceDefinition, Storage};
use tracing::debug;

use crate::error::{CompileError, Result};
use crate::value::{Params, Statement};

/// The column a write key maps to.
///
/// Relationships stored elsewhere cannot be written through this resource.
fn writable_column<'a>(definition: &'a ResourceDefinition, key: &str) -> Result<&'a Ident> {
    if let Some(field) = definition.field(key) {
        return Ok(&field.column);
    }
    match definition.relationship(key).map(|r| &r.storage) {
        Some(Storage::OwnTable { column }) => Ok(column),
        _ => Err(CompileError::UnknownField {
            resource: definition.name().to_string(),
            field: key.to_string(),
        }),
    }
}

pub(super) fn insert(
    definition: &ResourceDefinition,
    request: &super::WriteRequest,
) -> Result<Statement> {
    let table = definition.table();
    let mut params = Params::new();
    let mut columns = Vec::with_capacity(request.values.len());
    let mut placeholders = Vec::with_capacity(request.values.len());

    for (key, value) in &request.values {
        columns.push(writable_column(definition, key)?.escaped());
        placeholders.push(params.bind(key, value.clone()));
    }

    let sql = if columns.is_empty() {
        format!("INSERT INTO {table} DEFAULT VALUES RETURNING *")
    } else {
        format!(
            "INSERT INTO {table} ({}) VALUES ({}) RETURNING *",
            columns.join(", "),
            placeholders.join(", ")
        )
    };

    debug!(resource = definition.name(), sql = %sql, "Compiled create");
    Ok(Statement::new(sql, params))
}

pub(super) fn update(
    definition: &ResourceDefinition,
    id: i64,
    values: &BTreeMap<String, serde_json::Value>,
) -> Result<Statement> {
    let table = definition.table();
    let mut params = Params::new();
    let mut assignments = Vec::with_capacity(values.len());

    for (key, value) in values {
        let column = writable_column(definition, key)?;
        let placeholder = params.bind(key, value.clone());
        assignments.push(format!("{column} = {placeholder}"));
    }
    let id = params.bind("id", id);

    let sql = format!(
        "UPDATE {table} SET {} WHERE {} = {id} RETURNING *",
        assignments.join(", "),
        definition.qualified_id()
    );

    debug!(resource = definition.name(), sql = %sql, "Compiled update");
    Ok(Statement::new(sql, params))
}

pub(super) fn delete(definition: &ResourceDefinition, id: i64) -> Statement {
    let mut params = Params::new();
    let id = params.bind("id", id);
    let sql = format!(
        "DELETE FROM {} WHERE {} = {id} RETURNING *",
        definition.table(),
        definition.qualified_id()
    );

    debug!(resource = definition.name(), sql = %sql, "Compiled delete");
    Statement::new(sql, params)
}

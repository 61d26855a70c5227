//! "Create from scratch" migrations for a definition set.
//!
//! The script starts with the shared trigger function, followed by each
//! resource's table and trigger in dependency order. Associative tables
//! reference both of their resources, so they are emitted after every
//! resource table exists.
//!
//! # Example
//!
//! ```rust
//! use oxide_resource_core::{compile_models, DefinitionSet, RawResource};
//! use oxide_resource_sql::migration::MigrationCompiler;
//! use serde_json::json;
//!
//! let models = compile_models(vec![
//!     RawResource::from_value(json!({
//!         "name": "cat",
//!         "relationships": { "owner": { "resource": "person", "cardinality": "many-to-one" } }
//!     }))
//!     .unwrap(),
//!     RawResource::named("person"),
//! ])
//! .unwrap();
//! let definitions = DefinitionSet::build(models).unwrap();
//!
//! let migration = MigrationCompiler::new().compile(&definitions).unwrap();
//! assert_eq!(migration.order, vec!["person", "cat"]);
//! assert!(migration.script().contains("owner_id INTEGER REFERENCES person(id)"));
//! ```

mod postgres;
mod schema;

pub use postgres::{column_definition, create_table, updated_at_function, updated_at_trigger};
pub use schema::{ColumnSchema, ForeignKeyAction, ForeignKeyRef, TableSchema};

use std::collections::BTreeSet;

use oxide_resource_core::{
    BuiltInMeta, Cardinality, DefinitionSet, DependencyGraph, FieldDefinition,
    RelationshipDefinition, ResourceDefinition, Storage,
};
use tracing::{debug, info};

use crate::error::{CompileError, Result};
use crate::escape;

/// Type of the surrogate key column.
const ID_TYPE: &str = "SERIAL";

/// Type of every foreign-key column.
const FOREIGN_KEY_TYPE: &str = "INTEGER";

/// An ordered migration script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// Resource names in the order their tables are created.
    pub order: Vec<String>,
    /// DDL statements; the first is the shared trigger function.
    pub statements: Vec<String>,
}

impl Migration {
    /// All statements joined into one script.
    #[must_use]
    pub fn script(&self) -> String {
        let mut script = self.statements.join(";\n\n");
        if !script.is_empty() {
            script.push_str(";\n");
        }
        script
    }
}

/// Compiles definition sets into migrations.
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationCompiler;

impl MigrationCompiler {
    /// Creates a new migration compiler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Compiles the full migration for every resource in `definitions`.
    ///
    /// Fails on cyclic host relationships, unsafe type literals or clashing
    /// table and column names, without producing any statements.
    pub fn compile(&self, definitions: &DefinitionSet) -> Result<Migration> {
        let order = DependencyGraph::from_models(definitions.models()).topological_order()?;

        let mut statements = vec![updated_at_function()];
        let mut associative = Vec::new();
        let mut tables = BTreeSet::new();

        for name in &order {
            let definition = definitions
                .get(name)
                .ok_or_else(|| CompileError::UnknownResource(name.clone()))?;

            let table = self.resource_table(definitions, definition)?;
            statements.push(create_table(check_names(&mut tables, &table)?));

            if definition.model().has_built_in(BuiltInMeta::UpdatedAt) {
                statements.push(updated_at_trigger(definition.table()));
            }

            associative.extend(
                definition
                    .hosted_associative_relationships()
                    .filter_map(|rel| self.associative_table(definitions, definition, rel)),
            );
        }

        for table in &associative {
            statements.push(create_table(check_names(&mut tables, table)?));
        }

        info!(
            resources = order.len(),
            statements = statements.len(),
            "Compiled migration"
        );
        Ok(Migration { order, statements })
    }

    /// The primary table of a resource.
    pub fn resource_table(
        &self,
        definitions: &DefinitionSet,
        definition: &ResourceDefinition,
    ) -> Result<TableSchema> {
        let mut table = TableSchema::new(definition.table().clone())
            .column(ColumnSchema::new(definition.id_column().clone(), ID_TYPE).primary_key());

        for field in definition.attributes().iter().chain(definition.meta()) {
            table = table.column(field_column(definition, field)?);
        }

        for rel in definition.relationships_in_own_table() {
            let Storage::OwnTable { column } = &rel.storage else {
                continue;
            };
            let related = definitions.related(rel);
            let mut col = ColumnSchema::new(column.clone(), FOREIGN_KEY_TYPE)
                .references(ForeignKeyRef::new(
                    related.table().clone(),
                    related.id_column().clone(),
                ))
                .nullable(rel.relationship.nullable);
            if rel.relationship.cardinality == Cardinality::OneToOne {
                col = col.unique();
            }
            table = table.column(col);
        }

        debug!(table = %definition.table(), columns = table.columns.len(), "Built table schema");
        Ok(table)
    }

    /// The associative table backing a hosted many-to-many relationship of
    /// `host`, or `None` when `rel` is not stored in one.
    ///
    /// Deleting a host row removes its links; deleting a guest row is
    /// refused while links exist.
    #[must_use]
    pub fn associative_table(
        &self,
        definitions: &DefinitionSet,
        host: &ResourceDefinition,
        rel: &RelationshipDefinition,
    ) -> Option<TableSchema> {
        let Storage::Associative {
            table,
            local_column,
            foreign_column,
            ..
        } = &rel.storage
        else {
            return None;
        };
        let guest = definitions.related(rel);

        let table = TableSchema::new(table.clone())
            .column(
                ColumnSchema::new(local_column.clone(), FOREIGN_KEY_TYPE).references(
                    ForeignKeyRef::new(host.table().clone(), host.id_column().clone())
                        .on_update(ForeignKeyAction::Cascade)
                        .on_delete(ForeignKeyAction::Cascade),
                ),
            )
            .column(
                ColumnSchema::new(foreign_column.clone(), FOREIGN_KEY_TYPE).references(
                    ForeignKeyRef::new(guest.table().clone(), guest.id_column().clone())
                        .on_update(ForeignKeyAction::Cascade),
                ),
            )
            .primary_key(vec![local_column.clone(), foreign_column.clone()]);

        debug!(table = %table.name, host = host.name(), guest = guest.name(), "Built associative table");
        Some(table)
    }
}

/// Records `table` in `seen`, rejecting a repeated table or column name.
fn check_names<'t>(
    seen: &mut BTreeSet<String>,
    table: &'t TableSchema,
) -> Result<&'t TableSchema> {
    if !seen.insert(table.name.raw().to_string()) {
        return Err(CompileError::DuplicateTable {
            table: table.name.raw().to_string(),
        });
    }
    let mut columns = BTreeSet::new();
    for column in &table.columns {
        if !columns.insert(column.name.raw()) {
            return Err(CompileError::DuplicateColumn {
                table: table.name.raw().to_string(),
                column: column.name.raw().to_string(),
            });
        }
    }
    Ok(table)
}

fn field_column(definition: &ResourceDefinition, field: &FieldDefinition) -> Result<ColumnSchema> {
    let sql_type = escape::render_type(&field.attribute.sql_type).ok_or_else(|| {
        CompileError::InvalidType {
            resource: definition.name().to_string(),
            field: field.key.clone(),
            sql_type: field.attribute.sql_type.clone(),
        }
    })?;

    Ok(ColumnSchema::new(field.column.clone(), sql_type)
        .nullable(field.attribute.nullable)
        .default(field.attribute.default.as_ref().and_then(escape::render_default)))
}

//! PostgreSQL DDL rendering.

use oxide_resource_core::{naming, Ident};

use super::schema::{ColumnSchema, ForeignKeyRef, TableSchema};

/// Renders a column definition.
///
/// The order is `<name> <type> [PRIMARY KEY] [REFERENCES ...] [NOT NULL]
/// [UNIQUE] [DEFAULT ...]`.
#[must_use]
pub fn column_definition(col: &ColumnSchema) -> String {
    let mut sql = format!("{} {}", col.name, col.sql_type);

    if col.primary_key {
        sql.push_str(" PRIMARY KEY");
    }

    if let Some(ref fk) = col.references {
        sql.push(' ');
        sql.push_str(&references(fk));
    }

    if !col.primary_key {
        if !col.nullable {
            sql.push_str(" NOT NULL");
        }
        if col.unique {
            sql.push_str(" UNIQUE");
        }
    }

    if let Some(ref default) = col.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(default);
    }

    sql
}

fn references(fk: &ForeignKeyRef) -> String {
    let mut sql = format!("REFERENCES {}({})", fk.table, fk.column);
    if let Some(action) = fk.on_update {
        sql.push_str(" ON UPDATE ");
        sql.push_str(action.as_sql());
    }
    if let Some(action) = fk.on_delete {
        sql.push_str(" ON DELETE ");
        sql.push_str(action.as_sql());
    }
    sql
}

/// Renders `CREATE TABLE`.
#[must_use]
pub fn create_table(table: &TableSchema) -> String {
    let mut sql = String::from("CREATE TABLE ");
    sql.push_str(table.name.escaped());
    sql.push_str(" (\n");

    let mut defs: Vec<String> = table
        .columns
        .iter()
        .map(|c| format!("    {}", column_definition(c)))
        .collect();

    if !table.primary_key.is_empty() {
        let columns: Vec<&str> = table.primary_key.iter().map(Ident::escaped).collect();
        defs.push(format!("    PRIMARY KEY ({})", columns.join(", ")));
    }

    sql.push_str(&defs.join(",\n"));
    sql.push_str("\n)");
    sql
}

/// The shared trigger function keeping `updated_at` current.
#[must_use]
pub fn updated_at_function() -> String {
    format!(
        "CREATE OR REPLACE FUNCTION {function}() RETURNS TRIGGER AS $$\n\
         BEGIN\n    NEW.{column} = now();\n    RETURN NEW;\nEND;\n\
         $$ LANGUAGE plpgsql",
        function = naming::escape_identifier(&naming::updated_at_function()),
        column = naming::escape_identifier(&naming::meta_column("updated_at")),
    )
}

/// Binds the shared trigger function to `table`.
#[must_use]
pub fn updated_at_trigger(table: &Ident) -> String {
    format!(
        "CREATE TRIGGER {trigger} BEFORE UPDATE ON {table} \
         FOR EACH ROW EXECUTE PROCEDURE {function}()",
        trigger = naming::escape_identifier(&naming::updated_at_trigger(table.raw())),
        function = naming::escape_identifier(&naming::updated_at_function()),
    )
}

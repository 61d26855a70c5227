//! Table and column schemas produced from resource definitions.

use oxide_resource_core::Ident;

/// Foreign key action (ON DELETE, ON UPDATE).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForeignKeyAction {
    /// Cascade the change to referencing rows.
    Cascade,
    /// Set the referencing column to NULL.
    SetNull,
    /// Refuse the change while rows reference it.
    Restrict,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of this action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::Restrict => "RESTRICT",
        }
    }
}

/// Target of a foreign-key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: Ident,
    pub column: Ident,
    pub on_update: Option<ForeignKeyAction>,
    pub on_delete: Option<ForeignKeyAction>,
}

impl ForeignKeyRef {
    /// References `table(column)` with no referential actions.
    #[must_use]
    pub fn new(table: Ident, column: Ident) -> Self {
        Self {
            table,
            column,
            on_update: None,
            on_delete: None,
        }
    }

    #[must_use]
    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    #[must_use]
    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }
}

/// Schema definition for a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    /// Column name.
    pub name: Ident,
    /// Type literal, already checked safe to emit.
    pub sql_type: String,
    /// Whether the column allows NULL values.
    pub nullable: bool,
    /// Rendered default expression.
    pub default: Option<String>,
    /// Whether this is the table's single-column primary key.
    pub primary_key: bool,
    /// Whether this column has a UNIQUE constraint.
    pub unique: bool,
    /// Foreign-key target, if any.
    pub references: Option<ForeignKeyRef>,
}

impl ColumnSchema {
    /// Creates a nullable column.
    #[must_use]
    pub fn new(name: Ident, sql_type: impl Into<String>) -> Self {
        Self {
            name,
            sql_type: sql_type.into(),
            nullable: true,
            default: None,
            primary_key: false,
            unique: false,
            references: None,
        }
    }

    /// Sets the column as NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets whether the column allows NULL values.
    #[must_use]
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Sets the rendered default expression.
    #[must_use]
    pub fn default(mut self, default: Option<String>) -> Self {
        self.default = default;
        self
    }

    /// Sets the column as the primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false; // Primary keys are always NOT NULL
        self
    }

    /// Sets the column as unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Sets the foreign-key target.
    #[must_use]
    pub fn references(mut self, target: ForeignKeyRef) -> Self {
        self.references = Some(target);
        self
    }
}

/// Complete schema definition for a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Table name.
    pub name: Ident,
    /// Column definitions.
    pub columns: Vec<ColumnSchema>,
    /// Composite primary key, when not declared on a single column.
    pub primary_key: Vec<Ident>,
}

impl TableSchema {
    /// Creates a new table schema.
    #[must_use]
    pub fn new(name: Ident) -> Self {
        Self {
            name,
            columns: Vec::new(),
            primary_key: Vec::new(),
        }
    }

    /// Adds a column to the table.
    #[must_use]
    pub fn column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    /// Sets the composite primary key columns.
    #[must_use]
    pub fn primary_key(mut self, columns: Vec<Ident>) -> Self {
        self.primary_key = columns;
        self
    }

    /// Gets a column by raw name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name.raw() == name)
    }
}

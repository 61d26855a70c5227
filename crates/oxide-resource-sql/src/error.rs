//! Error types for migration and query compilation.

use oxide_resource_core::ResourceError;

use crate::query::CrudAction;

/// Errors that can occur while compiling SQL.
///
/// A statement is either produced whole or not at all.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// Building or ordering the resource set failed.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// The requested resource is not part of the definition set.
    #[error("Unknown resource '{0}'")]
    UnknownResource(String),

    /// A request names a field the resource does not have.
    #[error("Resource '{resource}' has no field '{field}'")]
    UnknownField {
        /// Resource being queried.
        resource: String,
        /// The offending field.
        field: String,
    },

    /// The resource turned the action off.
    #[error("Action '{action}' is disabled on resource '{resource}'")]
    ActionDisabled {
        /// Resource being queried.
        resource: String,
        /// The disabled action.
        action: CrudAction,
    },

    /// An action that targets a single row was requested without an id.
    #[error("Action '{action}' on resource '{resource}' requires an id")]
    MissingId {
        /// Resource being queried.
        resource: String,
        /// The action requiring an id.
        action: CrudAction,
    },

    /// Two tables of the migration would share a name.
    #[error("Table '{table}' would be created twice")]
    DuplicateTable {
        /// The clashing table name.
        table: String,
    },

    /// A table would carry two columns with the same name.
    #[error("Table '{table}' would have two columns named '{column}'")]
    DuplicateColumn {
        /// Table being built.
        table: String,
        /// The clashing column name.
        column: String,
    },

    /// A column type literal cannot be emitted safely.
    #[error("Field '{resource}.{field}' has unsupported type literal '{sql_type}'")]
    InvalidType {
        /// Resource owning the field.
        resource: String,
        /// Field key.
        field: String,
        /// The rejected literal.
        sql_type: String,
    },
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, CompileError>;

//! Pure naming functions for tables, columns and aliases.
//!
//! Every physical name the compilers emit is derived here from explicit
//! resource and relationship values, never from ambient state.

use std::fmt;

use crate::model::Cardinality;

/// Prefix separating meta columns from user attribute columns.
pub const META_PREFIX: &str = "meta_";

/// Surrogate key column present on every resource table.
pub const ID_COLUMN: &str = "id";

/// Words PostgreSQL refuses as bare identifiers.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both",
    "case", "cast", "check", "collate", "column", "constraint", "create", "current_catalog",
    "current_date", "current_role", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "do", "else", "end", "except", "false",
    "fetch", "for", "foreign", "from", "grant", "group", "having", "in", "initially",
    "intersect", "into", "lateral", "leading", "limit", "localtime", "localtimestamp", "not",
    "null", "offset", "on", "only", "or", "order", "placing", "primary", "references",
    "returning", "select", "session_user", "some", "symmetric", "table", "then", "to",
    "trailing", "true", "union", "unique", "user", "using", "variadic", "when", "where",
    "window", "with",
];

/// Escapes an identifier for PostgreSQL.
///
/// Plain lower-case identifiers that are not reserved words are returned
/// unchanged; anything else is double-quoted with embedded quotes doubled.
#[must_use]
pub fn escape_identifier(name: &str) -> String {
    if is_plain_identifier(name) && !RESERVED_WORDS.contains(&name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$')
}

/// An identifier in both raw and escaped form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    raw: String,
    escaped: String,
}

impl Ident {
    /// Creates an identifier, escaping it once.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let escaped = escape_identifier(&raw);
        Self { raw, escaped }
    }

    /// The unescaped name.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The escaped name, safe to splice into SQL.
    #[must_use]
    pub fn escaped(&self) -> &str {
        &self.escaped
    }

    /// `<table>.<column>` with both parts escaped.
    #[must_use]
    pub fn qualify(&self, column: &Ident) -> String {
        format!("{}.{}", self.escaped, column.escaped)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.escaped)
    }
}

/// Default plural form of a resource name.
#[must_use]
pub fn default_plural(name: &str) -> String {
    format!("{name}s")
}

/// Drops one trailing `s`, if any.
#[must_use]
pub fn singular(name: &str) -> &str {
    match name.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem,
        _ => name,
    }
}

/// Physical column of a meta field.
#[must_use]
pub fn meta_column(key: &str) -> String {
    format!("{META_PREFIX}{key}")
}

/// Foreign-key column a host relationship adds to its own table.
#[must_use]
pub fn foreign_key_column(relationship: &str) -> String {
    format!("{relationship}_id")
}

/// Output column carrying a relationship's related id(s).
///
/// To-one relationships read as `<name>_id`; to-many relationships as
/// `<singular name>_ids`, so `pets` reads as `pet_ids`.
#[must_use]
pub fn relationship_alias(relationship: &str, cardinality: Cardinality) -> String {
    if cardinality.is_to_many() {
        format!("{}_ids", singular(relationship))
    } else {
        foreign_key_column(relationship)
    }
}

/// Associative table backing a many-to-many relationship.
#[must_use]
pub fn associative_table(host: &str, guest: &str) -> String {
    format!("{host}_{guest}")
}

/// Host and guest id columns of an associative table.
///
/// A self-referencing relationship would otherwise produce two identical
/// columns, so its guest column is named after the relationship instead.
#[must_use]
pub fn associative_columns(host: &str, guest: &str, relationship: &str) -> (String, String) {
    let host_column = foreign_key_column(host);
    let guest_column = if host == guest {
        foreign_key_column(relationship)
    } else {
        foreign_key_column(guest)
    };
    (host_column, guest_column)
}

/// `WITH` clause name of a relationship's virtual host table.
#[must_use]
pub fn virtual_table(relationship: &str) -> String {
    format!("{relationship}_virtual_host")
}

/// Shared trigger function refreshing `updated_at`.
#[must_use]
pub fn updated_at_function() -> String {
    format!("set_{}", meta_column("updated_at"))
}

/// Per-table trigger binding [`updated_at_function`].
#[must_use]
pub fn updated_at_trigger(table: &str) -> String {
    format!("{table}_{}", updated_at_function())
}

//! Escaping of description-supplied values spliced into DDL.
//!
//! DDL cannot take bound parameters, so column defaults and type literals
//! coming from resource descriptions go through these functions instead of
//! being concatenated as-is.

use oxide_resource_core::validation::is_type_literal;

/// Default expressions emitted unquoted. Anything else is a literal.
const DEFAULT_FUNCTIONS: &[&str] = &[
    "now()",
    "current_timestamp",
    "current_date",
    "current_time",
    "localtimestamp",
];

/// Quotes a string as a PostgreSQL literal.
///
/// Single quotes are doubled; strings containing backslashes use the
/// `E'...'` form with backslashes doubled.
#[must_use]
pub fn escape_literal(value: &str) -> String {
    let quoted = value.replace('\'', "''");
    if quoted.contains('\\') {
        format!("E'{}'", quoted.replace('\\', "\\\\"))
    } else {
        format!("'{quoted}'")
    }
}

/// Renders a column default, or `None` when there is nothing to emit.
#[must_use]
pub fn render_default(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(true) => Some("TRUE".to_string()),
        serde_json::Value::Bool(false) => Some("FALSE".to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => {
            let lowered = s.to_ascii_lowercase();
            if DEFAULT_FUNCTIONS.contains(&lowered.as_str()) {
                Some(lowered)
            } else {
                Some(escape_literal(s))
            }
        }
        other => Some(escape_literal(&other.to_string())),
    }
}

/// Returns the type literal if it is safe to emit verbatim.
#[must_use]
pub fn render_type(sql_type: &str) -> Option<&str> {
    is_type_literal(sql_type).then_some(sql_type)
}

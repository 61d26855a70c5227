//! SQL values and bound parameters.
//!
//! Request data never reaches SQL text: every value is bound as a
//! positional `$n` parameter of a [`Statement`].

use std::fmt;

/// A SQL value bound as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Structured value for `json`/`jsonb` columns.
    Json(serde_json::Value),
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map_or(Self::Json(serde_json::Value::Number(n)), Self::Float),
            },
            serde_json::Value::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for serde_json::Value {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::from(self)
    }
}

/// A named parameter bound at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub value: SqlValue,
}

/// Parameters collected while a statement is being written.
///
/// Binding the same name twice reuses its placeholder.
#[derive(Debug, Clone, Default)]
pub struct Params {
    params: Vec<Param>,
}

impl Params {
    /// Creates an empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a value and returns its placeholder.
    pub fn bind(&mut self, name: &str, value: impl ToSqlValue) -> String {
        if let Some(position) = self.params.iter().position(|p| p.name == name) {
            return placeholder(position);
        }
        self.params.push(Param {
            name: name.to_string(),
            value: value.to_sql_value(),
        });
        placeholder(self.params.len() - 1)
    }

    /// Finishes the parameter list.
    #[must_use]
    pub fn into_vec(self) -> Vec<Param> {
        self.params
    }
}

fn placeholder(position: usize) -> String {
    format!("${}", position + 1)
}

/// A compiled statement and its bound parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Param>,
}

impl Statement {
    /// Creates a statement from SQL text and the parameters it references.
    #[must_use]
    pub fn new(sql: String, params: Params) -> Self {
        Self {
            sql,
            params: params.into_vec(),
        }
    }

    /// Looks up a bound value by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&SqlValue> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    /// Bound values in placeholder order.
    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.params.iter().map(|p| &p.value)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

//! SELECT statement assembly.
//!
//! Fragments are already-escaped SQL; values go through [`Params`] before
//! they reach the builder.
//!
//! [`Params`]: crate::value::Params

/// A named subquery in a `WITH` clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonTable {
    pub name: String,
    pub query: String,
}

/// A SELECT statement builder over string fragments.
#[derive(Debug, Clone, Default)]
pub struct Select {
    with: Vec<CommonTable>,
    columns: Vec<String>,
    from: String,
    conditions: Vec<String>,
    group_by: Vec<String>,
    order_by: Vec<String>,
    limit: Option<String>,
    offset: Option<String>,
}

impl Select {
    /// Creates a SELECT over `table`.
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            from: table.into(),
            ..Self::default()
        }
    }

    /// Adds a `WITH` subquery.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, query: impl Into<String>) -> Self {
        self.with.push(CommonTable {
            name: name.into(),
            query: query.into(),
        });
        self
    }

    /// Adds a projected column.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    /// Adds a condition; conditions are joined with `AND`.
    #[must_use]
    pub fn and_where(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    #[must_use]
    pub fn group_by(mut self, column: impl Into<String>) -> Self {
        self.group_by.push(column.into());
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by.push(column.into());
        self
    }

    /// Sets `LIMIT` to a placeholder.
    #[must_use]
    pub fn limit(mut self, placeholder: impl Into<String>) -> Self {
        self.limit = Some(placeholder.into());
        self
    }

    /// Sets `OFFSET` to a placeholder.
    #[must_use]
    pub fn offset(mut self, placeholder: impl Into<String>) -> Self {
        self.offset = Some(placeholder.into());
        self
    }

    /// Builds the SQL text. Without columns the projection is `*`.
    #[must_use]
    pub fn build(&self) -> String {
        let mut sql = String::new();

        if !self.with.is_empty() {
            let tables: Vec<String> = self
                .with
                .iter()
                .map(|t| format!("{} AS ({})", t.name, t.query))
                .collect();
            sql.push_str("WITH ");
            sql.push_str(&tables.join(", "));
            sql.push(' ');
        }

        sql.push_str("SELECT ");
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.from);

        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        if let Some(ref limit) = self.limit {
            sql.push_str(" LIMIT ");
            sql.push_str(limit);
        }

        if let Some(ref offset) = self.offset {
            sql.push_str(" OFFSET ");
            sql.push_str(offset);
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_select() {
        assert_eq!(Select::table("cat").build(), "SELECT * FROM cat");
    }

    #[test]
    fn test_select_all_clauses() {
        let sql = Select::table("person")
            .with("v", "SELECT 1 AS host_id")
            .column("person.*")
            .column("count(*) OVER () AS meta_total_count")
            .and_where("person.id > 0")
            .and_where("(person.active)")
            .order_by("person.id")
            .limit("$1")
            .offset("$2")
            .build();
        assert_eq!(
            sql,
            "WITH v AS (SELECT 1 AS host_id) \
             SELECT person.*, count(*) OVER () AS meta_total_count FROM person \
             WHERE person.id > 0 AND (person.active) ORDER BY person.id LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_group_by() {
        let sql = Select::table("cat")
            .column("cat.owner_id")
            .group_by("cat.owner_id")
            .build();
        assert_eq!(sql, "SELECT cat.owner_id FROM cat GROUP BY cat.owner_id");
    }
}

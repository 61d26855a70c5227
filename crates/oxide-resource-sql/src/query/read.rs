//! Read queries with virtual host tables.

use std::collections::BTreeSet;

use oxide_resource_core::{
    naming, DefinitionSet, Ident, RelationshipDefinition, ResourceDefinition, Storage,
};
use tracing::debug;

use super::select::Select;
use super::{Page, ReadRequest};
use crate::error::{CompileError, Result};
use crate::value::{Params, Statement};

/// Column of a virtual host table matching the queried row's id.
const HOST_ID: &str = "host_id";

/// Column of a virtual host table holding the aggregated related ids.
const IDS: &str = "ids";

pub(super) fn compile(
    definitions: &DefinitionSet,
    definition: &ResourceDefinition,
    request: &ReadRequest,
    filter: Option<&str>,
) -> Result<Statement> {
    let fields = request.fields.as_ref();
    if let Some(fields) = fields {
        check_fields(definition, fields)?;
    }
    let requested = |name: &str| fields.map_or(true, |f| f.contains(name));

    let table = definition.table();
    let mut params = Params::new();
    let id = request.id.map(|id| params.bind("id", id));

    let mut select = Select::table(table.escaped());

    match fields {
        None => select = select.column(format!("{table}.*")),
        Some(_) => {
            select = select.column(definition.qualified_id());
            for field in definition.meta() {
                select = select.column(table.qualify(&field.column));
            }
            for field in definition.attributes() {
                if requested(&field.key) {
                    select = select.column(table.qualify(&field.column));
                }
            }
            for rel in definition.relationships_in_own_table() {
                if requested(&rel.name) {
                    if let Some(source) = own_column(rel) {
                        select = select.column(table.qualify(source));
                    }
                }
            }
        }
    }

    for rel in definition
        .virtual_relationships()
        .filter(|r| requested(&r.name))
    {
        let Some(query) = virtual_host_table(definitions, rel, id.as_deref()) else {
            continue;
        };
        select = select
            .with(rel.virtual_table.escaped(), query)
            .column(computed_column(definition, rel));
    }

    if let Some(ref placeholder) = id {
        select = select.and_where(format!("{} = {placeholder}", definition.qualified_id()));
    }
    if let Some(filter) = filter {
        select = select.and_where(format!("({filter})"));
    }

    if id.is_none() {
        select = select.order_by(definition.qualified_id());

        let pagination = definition.model().pagination;
        if pagination.enabled {
            let page = request.page.unwrap_or_else(|| Page::default_for(&pagination));
            let total = Ident::new(naming::meta_column("total_count"));
            select = select
                .column(format!("count(*) OVER () AS {total}"))
                .limit(params.bind("limit", i64::from(page.size)))
                .offset(params.bind("offset", page.offset()));
        }
    }

    let statement = Statement::new(select.build(), params);
    debug!(
        resource = definition.name(),
        action = %request.action(),
        sql = %statement.sql,
        "Compiled read"
    );
    Ok(statement)
}

fn check_fields(definition: &ResourceDefinition, fields: &BTreeSet<String>) -> Result<()> {
    match fields
        .iter()
        .find(|f| definition.field(f).is_none() && definition.relationship(f).is_none())
    {
        Some(unknown) => Err(CompileError::UnknownField {
            resource: definition.name().to_string(),
            field: unknown.clone(),
        }),
        None => Ok(()),
    }
}

fn own_column(rel: &RelationshipDefinition) -> Option<&Ident> {
    match &rel.storage {
        Storage::OwnTable { column } => Some(column),
        _ => None,
    }
}

/// `SELECT key AS host_id, array_agg(value) AS ids ... GROUP BY key` over
/// the table that stores the relationship, pre-filtered to the queried row
/// when reading one.
fn virtual_host_table(
    definitions: &DefinitionSet,
    rel: &RelationshipDefinition,
    id: Option<&str>,
) -> Option<String> {
    let source = rel.storage.virtual_source()?;
    let key = source.table.qualify(source.key);
    let value = source.value.unwrap_or_else(|| definitions.related(rel).id_column());

    let mut select = Select::table(source.table.escaped())
        .column(format!("{key} AS {HOST_ID}"))
        .column(format!("array_agg({}) AS {IDS}", source.table.qualify(value)));
    if let Some(placeholder) = id {
        select = select.and_where(format!("{key} = {placeholder}"));
    }
    Some(select.group_by(key).build())
}

/// Correlated lookup of the aggregated ids for the current row.
///
/// To-one relationships yield the single id rather than an array.
fn computed_column(definition: &ResourceDefinition, rel: &RelationshipDefinition) -> String {
    let virtual_table = rel.virtual_table.escaped();
    let value = if rel.is_to_many() {
        format!("{virtual_table}.{IDS}")
    } else {
        format!("({virtual_table}.{IDS})[1]")
    };
    format!(
        "(SELECT {value} FROM {virtual_table} WHERE {virtual_table}.{HOST_ID} = {}) AS {}",
        definition.qualified_id(),
        rel.alias
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;
    use oxide_resource_core::{compile_models, Cardinality, RawRelationship, RawResource};

    fn pets() -> DefinitionSet {
        let models = compile_models(vec![
            RawResource::named("cat").attribute("name", "text").relationship(
                "owner",
                RawRelationship::full("person", Cardinality::ManyToOne, true),
            ),
            RawResource::named("person")
                .attribute("name", "text")
                .relationship(
                    "pets",
                    RawRelationship::full("cat", Cardinality::OneToMany, false),
                ),
        ])
        .unwrap();
        DefinitionSet::build(models).unwrap()
    }

    fn read(set: &DefinitionSet, resource: &str, request: &ReadRequest) -> Statement {
        compile(set, set.get(resource).unwrap(), request, None).unwrap()
    }

    #[test]
    fn test_read_one_prefilters_virtual_table() {
        let set = pets();
        let statement = read(&set, "person", &ReadRequest::one(7));
        assert_eq!(
            statement.sql,
            "WITH pets_virtual_host AS (SELECT cat.owner_id AS host_id, array_agg(cat.id) AS ids \
             FROM cat WHERE cat.owner_id = $1 GROUP BY cat.owner_id) \
             SELECT person.*, (SELECT pets_virtual_host.ids FROM pets_virtual_host \
             WHERE pets_virtual_host.host_id = person.id) AS pet_ids \
             FROM person WHERE person.id = $1"
        );
        assert_eq!(statement.params.len(), 1);
        assert_eq!(statement.param("id"), Some(&SqlValue::Int(7)));
    }

    #[test]
    fn test_read_many_paginates() {
        let set = pets();
        let statement = read(&set, "person", &ReadRequest::many().page(Page::new(3, 20)));
        assert!(statement
            .sql
            .contains("FROM cat GROUP BY cat.owner_id) SELECT person.*"));
        assert!(statement.sql.contains("count(*) OVER () AS meta_total_count"));
        assert!(statement
            .sql
            .ends_with("FROM person ORDER BY person.id LIMIT $1 OFFSET $2"));
        assert_eq!(statement.param("limit"), Some(&SqlValue::Int(20)));
        assert_eq!(statement.param("offset"), Some(&SqlValue::Int(40)));
    }

    #[test]
    fn test_default_page_applies() {
        let set = pets();
        let statement = read(&set, "cat", &ReadRequest::many());
        assert_eq!(statement.param("limit"), Some(&SqlValue::Int(10)));
        assert_eq!(statement.param("offset"), Some(&SqlValue::Int(0)));
    }

    #[test]
    fn test_own_table_relationship_has_no_virtual_table() {
        let set = pets();
        let statement = read(&set, "cat", &ReadRequest::one(1));
        assert_eq!(statement.sql, "SELECT cat.* FROM cat WHERE cat.id = $1");
    }

    #[test]
    fn test_sparse_fields_keep_id_and_meta() {
        let set = pets();
        let statement = read(&set, "person", &ReadRequest::one(1).fields(["name"]));
        assert_eq!(
            statement.sql,
            "SELECT person.id, person.meta_created_at, person.meta_updated_at, person.name \
             FROM person WHERE person.id = $1"
        );
    }

    #[test]
    fn test_sparse_fields_select_relationships() {
        let set = pets();
        let cat = read(&set, "cat", &ReadRequest::one(1).fields(["owner"]));
        assert!(cat.sql.starts_with(
            "SELECT cat.id, cat.meta_created_at, cat.meta_updated_at, cat.owner_id FROM cat"
        ));

        let person = read(&set, "person", &ReadRequest::one(1).fields(["pets"]));
        assert!(person.sql.contains("AS pet_ids"));
        assert!(!person.sql.contains("person.name"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let set = pets();
        let err = compile(
            &set,
            set.get("cat").unwrap(),
            &ReadRequest::one(1).fields(["whiskers"]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, CompileError::UnknownField { ref field, .. } if field == "whiskers"));
    }

    #[test]
    fn test_filter_is_anded() {
        let set = pets();
        let statement = compile(
            &set,
            set.get("cat").unwrap(),
            &ReadRequest::one(2),
            Some("cat.owner_id IS NOT NULL"),
        )
        .unwrap();
        assert!(statement
            .sql
            .ends_with("WHERE cat.id = $1 AND (cat.owner_id IS NOT NULL)"));
    }

    #[test]
    fn test_to_one_guest_reads_single_id() {
        let models = compile_models(vec![
            RawResource::named("passport").relationship(
                "holder",
                RawRelationship::full("person", Cardinality::OneToOne, true),
            ),
            RawResource::named("person"),
        ])
        .unwrap();
        let set = DefinitionSet::build(models).unwrap();
        let statement = read(&set, "person", &ReadRequest::one(1));
        assert!(statement.sql.contains(
            "(SELECT (passport_virtual_host.ids)[1] FROM passport_virtual_host \
             WHERE passport_virtual_host.host_id = person.id) AS passport_id"
        ));
    }
}

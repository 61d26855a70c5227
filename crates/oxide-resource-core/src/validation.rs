//! Structural checks on raw resource descriptions.
//!
//! Validation runs over the whole set before normalization and reports
//! every issue found, not just the first one.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ModelIssue, ResourceError, Result};
use crate::naming::{self, ID_COLUMN, META_PREFIX};
use crate::raw::{RawAttribute, RawPagination, RawRelationship, RawResource};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("identifier pattern is valid"));

/// Words, an optional `(n)` or `(n, m)` modifier, trailing words, and array
/// suffixes: `varchar(64)`, `timestamp(3) with time zone`, `integer[]`.
static TYPE_LITERAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^[a-z][a-z0-9_]*( [a-z][a-z0-9_]*)*( ?\(\d+( ?, ?\d+)?\))?( [a-z][a-z0-9_]*)*(\[\])*$",
    )
    .expect("type literal pattern is valid")
});

/// Whether `name` may be used as a resource, attribute or relationship key.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Whether `sql_type` can be emitted verbatim as a column type.
#[must_use]
pub fn is_type_literal(sql_type: &str) -> bool {
    TYPE_LITERAL.is_match(sql_type)
}

/// Validates every description, failing with all issues at once.
pub fn validate(resources: &[RawResource]) -> Result<()> {
    let mut issues = Vec::new();
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();

    for resource in resources {
        *seen.entry(resource.name.as_str()).or_default() += 1;
        validate_resource(resource, &mut issues);
    }

    for (name, count) in seen {
        if count > 1 {
            issues.push(ModelIssue::new(
                name,
                "",
                format!("resource declared {count} times"),
            ));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(ResourceError::ModelValidation(issues))
    }
}

fn validate_resource(resource: &RawResource, issues: &mut Vec<ModelIssue>) {
    let name = resource.name.as_str();

    if !is_identifier(name) {
        issues.push(ModelIssue::new(name, "name", "not a valid identifier"));
    }
    if let Some(plural) = &resource.plural_form {
        if !is_identifier(plural) {
            issues.push(ModelIssue::new(name, "plural_form", "not a valid identifier"));
        }
    }

    validate_fields(name, "attributes", &resource.attributes, issues);
    validate_fields(name, "meta", &resource.meta, issues);
    for key in resource.meta.keys() {
        if resource.attributes.contains_key(key) {
            issues.push(ModelIssue::new(
                name,
                format!("meta.{key}"),
                "also declared as an attribute",
            ));
        }
    }

    for (key, rel) in &resource.relationships {
        let path = format!("relationships.{key}");
        if !is_identifier(key) {
            issues.push(ModelIssue::new(name, &path, "not a valid identifier"));
        } else if key == ID_COLUMN {
            issues.push(ModelIssue::new(name, &path, "'id' is reserved"));
        } else if key.starts_with(META_PREFIX) {
            issues.push(ModelIssue::new(
                name,
                &path,
                format!("prefix '{META_PREFIX}' is reserved"),
            ));
        }
        if resource.attributes.contains_key(key) {
            issues.push(ModelIssue::new(name, &path, "also declared as an attribute"));
        }
        if resource.meta.contains_key(key) {
            issues.push(ModelIssue::new(name, &path, "also declared as a meta field"));
        }

        let column = naming::foreign_key_column(key);
        if resource.attributes.contains_key(&column) {
            issues.push(ModelIssue::new(
                name,
                format!("attributes.{column}"),
                format!("clashes with the key column of relationship '{key}'"),
            ));
        }

        if let RawRelationship::Full {
            resource: Some(target),
            ..
        } = rel
        {
            if !is_identifier(target) {
                issues.push(ModelIssue::new(
                    name,
                    format!("{path}.resource"),
                    "not a valid identifier",
                ));
            }
        }
        if let Some(inverse) = rel.inverse() {
            if !is_identifier(inverse) {
                issues.push(ModelIssue::new(
                    name,
                    format!("{path}.inverse"),
                    "not a valid identifier",
                ));
            }
        }
    }

    if let Some(RawPagination::Settings {
        default_page_size,
        default_page_number,
        ..
    }) = &resource.pagination
    {
        if *default_page_size == Some(0) {
            issues.push(ModelIssue::new(
                name,
                "pagination.default_page_size",
                "must be at least 1",
            ));
        }
        if *default_page_number == Some(0) {
            issues.push(ModelIssue::new(
                name,
                "pagination.default_page_number",
                "must be at least 1",
            ));
        }
    }
}

fn validate_fields(
    resource: &str,
    section: &str,
    fields: &BTreeMap<String, RawAttribute>,
    issues: &mut Vec<ModelIssue>,
) {
    for (key, field) in fields {
        let path = format!("{section}.{key}");
        if !is_identifier(key) {
            issues.push(ModelIssue::new(resource, &path, "not a valid identifier"));
        } else if key == ID_COLUMN {
            issues.push(ModelIssue::new(resource, &path, "'id' is reserved"));
        } else if key.starts_with(META_PREFIX) {
            issues.push(ModelIssue::new(
                resource,
                &path,
                format!("prefix '{META_PREFIX}' is reserved"),
            ));
        }

        let sql_type = match field {
            RawAttribute::Type(t) | RawAttribute::Full { sql_type: t, .. } => t,
        };
        if !is_type_literal(sql_type) {
            issues.push(ModelIssue::new(
                resource,
                format!("{path}.type"),
                format!("unsupported type literal '{sql_type}'"),
            ));
        }
    }
}

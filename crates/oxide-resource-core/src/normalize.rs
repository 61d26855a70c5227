//! Default-filling for raw resource descriptions.
//!
//! Normalization is total: anything structurally wrong must already have
//! been rejected by [`validation`](crate::validation).

use std::collections::BTreeMap;

use crate::model::{
    Actions, Attribute, BuiltInMeta, Pagination, Relationship, ResourceModel, DEFAULT_PAGE_NUMBER,
    DEFAULT_PAGE_SIZE,
};
use crate::naming;
use crate::raw::{RawActions, RawAttribute, RawPagination, RawRelationship, RawResource};

/// Expands a raw description into its canonical model.
#[must_use]
pub fn normalize(raw: RawResource) -> ResourceModel {
    let plural_form = raw
        .plural_form
        .unwrap_or_else(|| naming::default_plural(&raw.name));

    let attributes = normalize_attributes(raw.attributes);

    let built_in_meta = raw
        .built_in_meta
        .unwrap_or_else(|| BuiltInMeta::ALL.into_iter().collect());

    let mut meta = normalize_attributes(raw.meta);
    for field in &built_in_meta {
        meta.insert(field.key().to_string(), field.attribute());
    }

    let relationships = raw
        .relationships
        .into_iter()
        .map(|(name, rel)| {
            let rel = normalize_relationship(&name, rel);
            (name, rel)
        })
        .collect();

    ResourceModel {
        name: raw.name,
        plural_form,
        attributes,
        meta,
        relationships,
        actions: normalize_actions(raw.actions),
        pagination: normalize_pagination(raw.pagination),
        built_in_meta,
    }
}

fn normalize_attributes(raw: BTreeMap<String, RawAttribute>) -> BTreeMap<String, Attribute> {
    raw.into_iter()
        .map(|(name, attr)| (name, normalize_attribute(attr)))
        .collect()
}

fn normalize_attribute(raw: RawAttribute) -> Attribute {
    match raw {
        RawAttribute::Type(sql_type) => Attribute::new(sql_type),
        RawAttribute::Full {
            sql_type,
            nullable,
            default,
        } => Attribute {
            sql_type,
            nullable: nullable.unwrap_or(true),
            // An explicit `null` default is the same as none.
            default: default.filter(|v| !v.is_null()),
        },
    }
}

fn normalize_relationship(name: &str, raw: RawRelationship) -> Relationship {
    match raw {
        RawRelationship::Cardinality(cardinality) => Relationship::new(name, cardinality),
        RawRelationship::Full {
            resource,
            cardinality,
            host,
            nullable,
            inverse,
        } => Relationship {
            resource: resource.unwrap_or_else(|| name.to_string()),
            cardinality,
            host: host.unwrap_or(true),
            nullable: nullable.unwrap_or(true),
            inverse,
        },
    }
}

fn normalize_actions(raw: Option<RawActions>) -> Actions {
    let raw = raw.unwrap_or_default();
    let defaults = Actions::default();
    Actions {
        create: raw.create.unwrap_or(defaults.create),
        read_one: raw.read_one.unwrap_or(defaults.read_one),
        read_many: raw.read_many.unwrap_or(defaults.read_many),
        update: raw.update.unwrap_or(defaults.update),
        delete: raw.delete.unwrap_or(defaults.delete),
    }
}

fn normalize_pagination(raw: Option<RawPagination>) -> Pagination {
    match raw {
        None | Some(RawPagination::Enabled(true)) => Pagination::default(),
        Some(RawPagination::Enabled(false)) => Pagination::disabled(),
        Some(RawPagination::Settings {
            enabled,
            default_page_size,
            default_page_number,
        }) => Pagination {
            enabled: enabled.unwrap_or(true),
            default_page_size: default_page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            default_page_number: default_page_number.unwrap_or(DEFAULT_PAGE_NUMBER),
        },
    }
}

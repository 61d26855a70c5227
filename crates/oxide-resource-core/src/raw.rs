//! Possibly-partial resource descriptions as authors write them.
//!
//! Shorthand forms are accepted wherever a full object would be:
//!
//! ```json
//! {
//!     "name": "cat",
//!     "attributes": { "name": "text" },
//!     "relationships": { "owner": "many-to-one" },
//!     "pagination": false
//! }
//! ```
//!
//! Keys outside the canonical set are dropped on deserialization.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::model::{BuiltInMeta, Cardinality};

/// An attribute or meta field: a bare type literal or a full object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAttribute {
    /// `"text"`
    Type(String),
    /// `{ "type": "text", "nullable": false, "default": "x" }`
    Full {
        #[serde(rename = "type")]
        sql_type: String,
        #[serde(default)]
        nullable: Option<bool>,
        #[serde(default)]
        default: Option<serde_json::Value>,
    },
}

/// A relationship: a bare cardinality or a full object.
///
/// In both forms the related resource defaults to the relationship key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawRelationship {
    /// `"many-to-one"`
    Cardinality(Cardinality),
    /// `{ "resource": "person", "cardinality": "many-to-one", "host": true }`
    Full {
        #[serde(default)]
        resource: Option<String>,
        cardinality: Cardinality,
        #[serde(default)]
        host: Option<bool>,
        #[serde(default)]
        nullable: Option<bool>,
        /// Host relationship on `resource` backing a guest side.
        #[serde(default)]
        inverse: Option<String>,
    },
}

/// Pagination: a flag or a partial settings object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawPagination {
    Enabled(bool),
    Settings {
        #[serde(default)]
        enabled: Option<bool>,
        #[serde(default)]
        default_page_size: Option<u32>,
        #[serde(default)]
        default_page_number: Option<u32>,
    },
}

/// Partial action toggles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawActions {
    #[serde(default)]
    pub create: Option<bool>,
    #[serde(default)]
    pub read_one: Option<bool>,
    #[serde(default)]
    pub read_many: Option<bool>,
    #[serde(default)]
    pub update: Option<bool>,
    #[serde(default)]
    pub delete: Option<bool>,
}

/// A resource description before normalization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawResource {
    pub name: String,
    #[serde(default)]
    pub plural_form: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, RawAttribute>,
    #[serde(default)]
    pub meta: BTreeMap<String, RawAttribute>,
    #[serde(default)]
    pub relationships: BTreeMap<String, RawRelationship>,
    #[serde(default)]
    pub actions: Option<RawActions>,
    #[serde(default)]
    pub pagination: Option<RawPagination>,
    /// Built-in meta fields to opt into; both when absent.
    #[serde(default)]
    pub built_in_meta: Option<BTreeSet<BuiltInMeta>>,
}

impl RawResource {
    /// A bare description with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            plural_form: None,
            attributes: BTreeMap::new(),
            meta: BTreeMap::new(),
            relationships: BTreeMap::new(),
            actions: None,
            pagination: None,
            built_in_meta: None,
        }
    }

    /// Adds a shorthand attribute.
    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.attributes
            .insert(name.into(), RawAttribute::Type(sql_type.into()));
        self
    }

    /// Adds a relationship.
    #[must_use]
    pub fn relationship(mut self, name: impl Into<String>, relationship: RawRelationship) -> Self {
        self.relationships.insert(name.into(), relationship);
        self
    }

    /// Parses a description from a JSON value.
    pub fn from_value(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}

impl RawRelationship {
    /// A full relationship object with every field given.
    #[must_use]
    pub fn full(resource: &str, cardinality: Cardinality, host: bool) -> Self {
        Self::Full {
            resource: Some(resource.to_string()),
            cardinality,
            host: Some(host),
            nullable: None,
            inverse: None,
        }
    }

    /// Names the host relationship on the related resource that stores
    /// this relationship's key.
    #[must_use]
    pub fn inverse_of(self, relationship: &str) -> Self {
        match self {
            Self::Cardinality(cardinality) => Self::Full {
                resource: None,
                cardinality,
                host: None,
                nullable: None,
                inverse: Some(relationship.to_string()),
            },
            Self::Full {
                resource,
                cardinality,
                host,
                nullable,
                ..
            } => Self::Full {
                resource,
                cardinality,
                host,
                nullable,
                inverse: Some(relationship.to_string()),
            },
        }
    }

    /// The explicitly named inverse, if any.
    #[must_use]
    pub fn inverse(&self) -> Option<&str> {
        match self {
            Self::Cardinality(_) => None,
            Self::Full { inverse, .. } => inverse.as_deref(),
        }
    }
}

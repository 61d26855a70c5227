//! Canonical, fully-defaulted resource models.
//!
//! A [`ResourceModel`] is what the normalizer produces from a
//! [`RawResource`](crate::raw::RawResource). Every field is present; its
//! serialized form is itself a valid raw description, so normalizing it
//! again yields the same model.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Default page size when pagination omits one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Default (one-indexed) page number when pagination omits one.
pub const DEFAULT_PAGE_NUMBER: u32 = 1;

/// A typed column description shared by attributes and meta fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    /// Database type literal, emitted verbatim (e.g. `text`, `varchar(64)`).
    #[serde(rename = "type")]
    pub sql_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Column default, if any.
    pub default: Option<serde_json::Value>,
}

impl Attribute {
    /// A nullable attribute with no default.
    #[must_use]
    pub fn new(sql_type: impl Into<String>) -> Self {
        Self {
            sql_type: sql_type.into(),
            nullable: true,
            default: None,
        }
    }

    /// Marks the attribute NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = if value.is_null() { None } else { Some(value) };
        self
    }
}

/// The four supported relationship cardinalities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    /// `one-to-one`
    OneToOne,
    /// `one-to-many`
    OneToMany,
    /// `many-to-one`
    ManyToOne,
    /// `many-to-many`
    ManyToMany,
}

impl Cardinality {
    /// The cardinality seen from the other end of the relationship.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::OneToMany => Self::ManyToOne,
            Self::ManyToOne => Self::OneToMany,
            Self::OneToOne => Self::OneToOne,
            Self::ManyToMany => Self::ManyToMany,
        }
    }

    /// Whether reading this end yields many related ids.
    #[must_use]
    pub const fn is_to_many(self) -> bool {
        matches!(self, Self::OneToMany | Self::ManyToMany)
    }

    /// The literal used in resource documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneToOne => "one-to-one",
            Self::OneToMany => "one-to-many",
            Self::ManyToOne => "many-to-one",
            Self::ManyToMany => "many-to-many",
        }
    }
}

/// A typed link from one resource to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Related resource name.
    pub resource: String,
    /// Cardinality seen from the declaring resource.
    pub cardinality: Cardinality,
    /// Whether the declaring resource's table carries the key.
    ///
    /// For many-to-many relationships the key lives in an associative
    /// table; `host` then only decides which side names that table.
    pub host: bool,
    /// Whether the key column accepts NULL.
    pub nullable: bool,
    /// On a guest relationship, the host relationship on the related
    /// resource that stores its key. Needed when several host
    /// relationships point back at this resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<String>,
}

impl Relationship {
    /// A nullable, host-side relationship.
    #[must_use]
    pub fn new(resource: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            resource: resource.into(),
            cardinality,
            host: true,
            nullable: true,
            inverse: None,
        }
    }

    /// Marks the relationship as guest-side.
    #[must_use]
    pub fn guest(mut self) -> Self {
        self.host = false;
        self
    }

    /// Marks the key column NOT NULL.
    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Names the host relationship this guest side reads through.
    #[must_use]
    pub fn inverse_of(mut self, relationship: impl Into<String>) -> Self {
        self.inverse = Some(relationship.into());
        self
    }
}

/// CRUD verbs a resource exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actions {
    pub create: bool,
    pub read_one: bool,
    pub read_many: bool,
    pub update: bool,
    pub delete: bool,
}

impl Default for Actions {
    fn default() -> Self {
        Self {
            create: true,
            read_one: true,
            read_many: true,
            update: true,
            delete: true,
        }
    }
}

/// List pagination settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub enabled: bool,
    pub default_page_size: u32,
    pub default_page_number: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            enabled: true,
            default_page_size: DEFAULT_PAGE_SIZE,
            default_page_number: DEFAULT_PAGE_NUMBER,
        }
    }
}

impl Pagination {
    /// Pagination turned off, other fields at their defaults.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Metadata fields maintained by the database itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltInMeta {
    /// Set once on insert.
    CreatedAt,
    /// Refreshed by a trigger on every update.
    UpdatedAt,
}

impl BuiltInMeta {
    /// Every built-in field, in catalog order.
    pub const ALL: [Self; 2] = [Self::CreatedAt, Self::UpdatedAt];

    /// The meta key this field is stored under.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// The catalog column description.
    #[must_use]
    pub fn attribute(self) -> Attribute {
        match self {
            Self::CreatedAt => Attribute::new("timestamptz")
                .not_null()
                .default_value(serde_json::Value::String("now()".to_string())),
            Self::UpdatedAt => Attribute::new("timestamptz"),
        }
    }
}

/// The canonical description of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceModel {
    /// Singular name, also the table name.
    pub name: String,
    pub plural_form: String,
    pub attributes: BTreeMap<String, Attribute>,
    /// Stored with the [`META_PREFIX`](crate::naming::META_PREFIX) column prefix.
    pub meta: BTreeMap<String, Attribute>,
    pub relationships: BTreeMap<String, Relationship>,
    pub actions: Actions,
    pub pagination: Pagination,
    pub built_in_meta: BTreeSet<BuiltInMeta>,
}

impl ResourceModel {
    /// Whether the resource opted into the given built-in field.
    #[must_use]
    pub fn has_built_in(&self, meta: BuiltInMeta) -> bool {
        self.built_in_meta.contains(&meta)
    }
}

//! Cross-linked resource definitions.
//!
//! A [`DefinitionSet`] is an arena of [`ResourceDefinition`]s indexed by
//! resource name. It is built in two passes: bare definitions first, then
//! every relationship is resolved to a [`DefinitionId`] and a [`Storage`]
//! strategy. The set is immutable once built; the query compiler relies on
//! every cross-link being present.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ResourceError, Result};
use crate::model::{Attribute, Cardinality, Relationship, ResourceModel};
use crate::naming::{self, Ident};

/// Handle to a definition inside its [`DefinitionSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefinitionId(usize);

/// Which end of a many-to-many relationship a definition sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociativeSide {
    /// The side that names the associative table.
    Host,
    Guest,
}

/// Where a relationship's key physically lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// A foreign-key column on this resource's own table.
    OwnTable {
        /// `<relationship>_id`
        column: Ident,
    },
    /// A foreign-key column on the related resource's table pointing back
    /// at this resource.
    HostTable {
        /// The related table.
        table: Ident,
        /// Its foreign-key column.
        column: Ident,
    },
    /// A row in an associative table.
    Associative {
        table: Ident,
        side: AssociativeSide,
        /// Column holding this resource's id.
        local_column: Ident,
        /// Column holding the related resource's id.
        foreign_column: Ident,
    },
}

impl Storage {
    /// The table, grouping key and aggregated value column from which a
    /// relationship not stored locally is read.
    ///
    /// Returns `None` for [`Storage::OwnTable`].
    #[must_use]
    pub fn virtual_source(&self) -> Option<VirtualSource<'_>> {
        match self {
            Self::OwnTable { .. } => None,
            Self::HostTable { table, column } => Some(VirtualSource {
                table,
                key: column,
                value: None,
            }),
            Self::Associative {
                table,
                local_column,
                foreign_column,
                ..
            } => Some(VirtualSource {
                table,
                key: local_column,
                value: Some(foreign_column),
            }),
        }
    }
}

/// Columns backing a virtual host table.
#[derive(Debug, Clone, Copy)]
pub struct VirtualSource<'a> {
    /// Table storing the key.
    pub table: &'a Ident,
    /// Column matching this resource's id.
    pub key: &'a Ident,
    /// Column holding the related id; the table's own `id` when `None`.
    pub value: Option<&'a Ident>,
}

/// A relationship with its storage resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipDefinition {
    pub name: String,
    pub relationship: Relationship,
    /// The related definition.
    pub related: DefinitionId,
    pub storage: Storage,
    /// Output column carrying the related id(s).
    pub alias: Ident,
    /// `WITH` clause name used when the key is not stored locally.
    pub virtual_table: Ident,
}

impl RelationshipDefinition {
    /// Whether reading this relationship yields many ids.
    #[must_use]
    pub fn is_to_many(&self) -> bool {
        self.relationship.cardinality.is_to_many()
    }
}

/// An attribute or meta field with its physical column.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    /// Key in the resource description.
    pub key: String,
    pub column: Ident,
    pub attribute: Attribute,
}

/// Derived, read-only view over one resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDefinition {
    model: ResourceModel,
    table: Ident,
    id_column: Ident,
    attributes: Vec<FieldDefinition>,
    meta: Vec<FieldDefinition>,
    relationships: BTreeMap<String, RelationshipDefinition>,
}

impl ResourceDefinition {
    fn bare(model: ResourceModel) -> Self {
        let attributes = model
            .attributes
            .iter()
            .map(|(key, attribute)| FieldDefinition {
                key: key.clone(),
                column: Ident::new(key.as_str()),
                attribute: attribute.clone(),
            })
            .collect();
        let meta = model
            .meta
            .iter()
            .map(|(key, attribute)| FieldDefinition {
                key: key.clone(),
                column: Ident::new(naming::meta_column(key)),
                attribute: attribute.clone(),
            })
            .collect();

        Self {
            table: Ident::new(model.name.as_str()),
            id_column: Ident::new(naming::ID_COLUMN),
            attributes,
            meta,
            relationships: BTreeMap::new(),
            model,
        }
    }

    /// The normalized model this definition was built from.
    #[must_use]
    pub fn model(&self) -> &ResourceModel {
        &self.model
    }

    /// Resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.model.name
    }

    #[must_use]
    pub fn table(&self) -> &Ident {
        &self.table
    }

    #[must_use]
    pub fn id_column(&self) -> &Ident {
        &self.id_column
    }

    /// `<table>.id`, escaped.
    #[must_use]
    pub fn qualified_id(&self) -> String {
        self.table.qualify(&self.id_column)
    }

    #[must_use]
    pub fn attributes(&self) -> &[FieldDefinition] {
        &self.attributes
    }

    #[must_use]
    pub fn meta(&self) -> &[FieldDefinition] {
        &self.meta
    }

    /// Looks up an attribute or meta field by key.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FieldDefinition> {
        self.attributes
            .iter()
            .chain(&self.meta)
            .find(|f| f.key == key)
    }

    /// All relationships, keyed by name.
    #[must_use]
    pub fn relationships(&self) -> &BTreeMap<String, RelationshipDefinition> {
        &self.relationships
    }

    #[must_use]
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDefinition> {
        self.relationships.get(name)
    }

    /// Relationships whose key is a column on this table.
    pub fn relationships_in_own_table(&self) -> impl Iterator<Item = &RelationshipDefinition> {
        self.relationships
            .values()
            .filter(|r| matches!(r.storage, Storage::OwnTable { .. }))
    }

    /// Relationships whose key is a column on the related table.
    pub fn relationships_in_host_table(&self) -> impl Iterator<Item = &RelationshipDefinition> {
        self.relationships
            .values()
            .filter(|r| matches!(r.storage, Storage::HostTable { .. }))
    }

    /// Many-to-many relationships, from either side.
    pub fn relationships_in_associative_table(
        &self,
    ) -> impl Iterator<Item = &RelationshipDefinition> {
        self.relationships
            .values()
            .filter(|r| matches!(r.storage, Storage::Associative { .. }))
    }

    /// Many-to-many relationships whose associative table this resource
    /// names and therefore creates.
    pub fn hosted_associative_relationships(
        &self,
    ) -> impl Iterator<Item = &RelationshipDefinition> {
        self.relationships.values().filter(|r| {
            matches!(
                r.storage,
                Storage::Associative {
                    side: AssociativeSide::Host,
                    ..
                }
            )
        })
    }

    /// Relationships read through a virtual host table.
    pub fn virtual_relationships(&self) -> impl Iterator<Item = &RelationshipDefinition> {
        self.relationships
            .values()
            .filter(|r| !matches!(r.storage, Storage::OwnTable { .. }))
    }
}

/// Arena of cross-linked definitions.
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet {
    definitions: Vec<ResourceDefinition>,
    index: BTreeMap<String, DefinitionId>,
}

impl DefinitionSet {
    /// Builds and cross-links definitions for a normalized, inferred model set.
    pub fn build(models: Vec<ResourceModel>) -> Result<Self> {
        let mut set = Self::default();
        for model in models {
            let id = DefinitionId(set.definitions.len());
            set.index.insert(model.name.clone(), id);
            set.definitions.push(ResourceDefinition::bare(model));
        }

        let mut resolved = Vec::with_capacity(set.definitions.len());
        for definition in &set.definitions {
            resolved.push(set.resolve_relationships(definition.model())?);
        }
        for (definition, relationships) in set.definitions.iter_mut().zip(resolved) {
            definition.relationships = relationships;
        }

        debug!(resources = set.definitions.len(), "Built resource definitions");
        Ok(set)
    }

    fn resolve_relationships(
        &self,
        model: &ResourceModel,
    ) -> Result<BTreeMap<String, RelationshipDefinition>> {
        model
            .relationships
            .iter()
            .map(|(name, rel)| {
                let related = self.index.get(&rel.resource).copied().ok_or_else(|| {
                    ResourceError::unresolved(&model.name, name, &rel.resource, "unknown resource")
                })?;
                let storage = self.resolve_storage(model, name, rel, related)?;
                let definition = RelationshipDefinition {
                    name: name.clone(),
                    relationship: rel.clone(),
                    related,
                    storage,
                    alias: Ident::new(naming::relationship_alias(name, rel.cardinality)),
                    virtual_table: Ident::new(naming::virtual_table(name)),
                };
                Ok((name.clone(), definition))
            })
            .collect()
    }

    fn resolve_storage(
        &self,
        model: &ResourceModel,
        name: &str,
        rel: &Relationship,
        related: DefinitionId,
    ) -> Result<Storage> {
        let target = self.by_id(related).model();

        match (rel.cardinality, rel.host) {
            (Cardinality::ManyToMany, true) => {
                let (host_column, guest_column) =
                    naming::associative_columns(&model.name, &target.name, name);
                Ok(Storage::Associative {
                    table: Ident::new(naming::associative_table(&model.name, &target.name)),
                    side: AssociativeSide::Host,
                    local_column: Ident::new(host_column),
                    foreign_column: Ident::new(guest_column),
                })
            }
            (Cardinality::ManyToMany, false) => {
                let host_name = counterpart(model, name, rel, target)?;
                let (host_column, guest_column) =
                    naming::associative_columns(&target.name, &model.name, host_name);
                Ok(Storage::Associative {
                    table: Ident::new(naming::associative_table(&target.name, &model.name)),
                    side: AssociativeSide::Guest,
                    local_column: Ident::new(guest_column),
                    foreign_column: Ident::new(host_column),
                })
            }
            (_, true) => Ok(Storage::OwnTable {
                column: Ident::new(naming::foreign_key_column(name)),
            }),
            (_, false) => {
                let host_name = counterpart(model, name, rel, target)?;
                Ok(Storage::HostTable {
                    table: Ident::new(target.name.as_str()),
                    column: Ident::new(naming::foreign_key_column(host_name)),
                })
            }
        }
    }

    fn by_id(&self, id: DefinitionId) -> &ResourceDefinition {
        &self.definitions[id.0]
    }

    /// Looks up a definition by resource name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResourceDefinition> {
        self.index.get(name).map(|id| self.by_id(*id))
    }

    /// The definition on the other end of a relationship.
    #[must_use]
    pub fn related(&self, relationship: &RelationshipDefinition) -> &ResourceDefinition {
        self.by_id(relationship.related)
    }

    /// Definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceDefinition> {
        self.definitions.iter()
    }

    /// The underlying models, in insertion order.
    pub fn models(&self) -> impl Iterator<Item = &ResourceModel> {
        self.definitions.iter().map(ResourceDefinition::model)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// The host relationship on `target` that stores the key of `model`'s
/// guest relationship `name`.
///
/// An explicit `inverse` must name a matching host relationship. Without
/// one, exactly one host relationship on `target` may point back at
/// `model` with the inverse cardinality.
fn counterpart<'a>(
    model: &ResourceModel,
    name: &str,
    rel: &Relationship,
    target: &'a ResourceModel,
) -> Result<&'a str> {
    let cardinality = rel.cardinality.inverse();
    let points_back = |r: &Relationship| {
        r.host && r.resource == model.name && r.cardinality == cardinality
    };
    let unresolved =
        |reason: String| ResourceError::unresolved(&model.name, name, &target.name, reason);

    if let Some(inverse) = &rel.inverse {
        return match target.relationships.get_key_value(inverse) {
            Some((key, r)) if points_back(r) => Ok(key.as_str()),
            _ => Err(unresolved(format!(
                "inverse '{inverse}' is not a host-side {} relationship back to this resource",
                cardinality.as_str()
            ))),
        };
    }

    let candidates: Vec<&str> = target
        .relationships
        .iter()
        .filter(|(_, r)| points_back(r))
        .map(|(key, _)| key.as_str())
        .collect();
    match candidates[..] {
        [host] => Ok(host),
        [] => Err(unresolved(format!(
            "no host-side {} relationship back to this resource",
            cardinality.as_str()
        ))),
        [first, second, ..] => Err(unresolved(format!(
            "ambiguous counterpart, '{first}' and '{second}' both point back; name one with 'inverse'"
        ))),
    }
}

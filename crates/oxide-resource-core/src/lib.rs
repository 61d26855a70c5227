//! # oxide-resource-core
//!
//! Declarative resource models and the relationship algebra behind them.
//!
//! A resource is described by a name, typed attributes, meta fields and
//! typed relationships to other resources. This crate turns a set of such
//! descriptions into cross-linked [`ResourceDefinition`]s:
//!
//! - **Validation** rejects structurally invalid descriptions, reporting
//!   every issue at once
//! - **Normalization** expands shorthand and fills defaults
//! - **Inference** makes every relationship visible from both ends
//! - **Dependency ordering** sorts resources so referenced tables come first
//! - **Definitions** precompute names and resolve where each relationship's
//!   key is stored
//!
//! # Example
//!
//! ```rust
//! use oxide_resource_core::{compile_models, DefinitionSet, RawResource};
//! use serde_json::json;
//!
//! let raw = vec![
//!     RawResource::from_value(json!({
//!         "name": "cat",
//!         "relationships": {
//!             "owner": { "resource": "person", "cardinality": "many-to-one" }
//!         }
//!     }))
//!     .unwrap(),
//!     RawResource::named("person"),
//! ];
//!
//! let models = compile_models(raw).unwrap();
//! let definitions = DefinitionSet::build(models).unwrap();
//!
//! let person = definitions.get("person").unwrap();
//! assert!(person.relationship("cats").is_some());
//! ```

pub mod definition;
pub mod error;
pub mod graph;
pub mod inference;
pub mod loader;
pub mod model;
pub mod naming;
pub mod normalize;
pub mod raw;
pub mod validation;

pub use definition::{
    AssociativeSide, DefinitionId, DefinitionSet, FieldDefinition, RelationshipDefinition,
    ResourceDefinition, Storage, VirtualSource,
};
pub use error::{ModelIssue, ResourceError, Result};
pub use graph::DependencyGraph;
pub use model::{
    Actions, Attribute, BuiltInMeta, Cardinality, Pagination, Relationship, ResourceModel,
};
pub use naming::Ident;
pub use raw::{RawAttribute, RawPagination, RawRelationship, RawResource};

/// Validates, normalizes and completes a set of raw descriptions.
///
/// The result has every inverse relationship present and is ready for
/// [`DefinitionSet::build`] and [`DependencyGraph::from_models`].
pub fn compile_models(raw: Vec<RawResource>) -> Result<Vec<ResourceModel>> {
    validation::validate(&raw)?;
    let mut models: Vec<ResourceModel> = raw.into_iter().map(normalize::normalize).collect();
    inference::infer_relationships(&mut models);
    Ok(models)
}

//! CRUD statement compilation.
//!
//! A [`QueryCompiler`] borrows a built [`DefinitionSet`] and turns a
//! resource name plus a request shape into one parameterized
//! [`Statement`]. Reads expose relationships whose key lives elsewhere
//! through `WITH` clause aggregates, so every row carries the ids of its
//! related rows regardless of where they are stored.
//!
//! # Example
//!
//! ```rust
//! use oxide_resource_core::{compile_models, DefinitionSet, RawResource};
//! use oxide_resource_sql::query::{QueryCompiler, ReadRequest};
//! use serde_json::json;
//!
//! let models = compile_models(vec![
//!     RawResource::from_value(json!({
//!         "name": "cat",
//!         "relationships": { "owner": { "resource": "person", "cardinality": "many-to-one" } }
//!     }))
//!     .unwrap(),
//!     RawResource::named("person"),
//! ])
//! .unwrap();
//! let definitions = DefinitionSet::build(models).unwrap();
//!
//! let statement = QueryCompiler::new(&definitions)
//!     .read("person", &ReadRequest::one(1))
//!     .unwrap();
//! assert!(statement.sql.starts_with("WITH cats_virtual_host AS"));
//! assert!(statement.sql.contains("AS cat_ids"));
//! ```

mod read;
mod select;
mod write;

pub use select::{CommonTable, Select};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use oxide_resource_core::{Actions, DefinitionSet, Pagination, ResourceDefinition};
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};
use crate::value::Statement;

/// The CRUD verbs a resource exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrudAction {
    Create,
    ReadOne,
    ReadMany,
    Update,
    Delete,
}

impl CrudAction {
    /// Whether the resource left this action enabled.
    #[must_use]
    pub const fn is_enabled(self, actions: &Actions) -> bool {
        match self {
            Self::Create => actions.create,
            Self::ReadOne => actions.read_one,
            Self::ReadMany => actions.read_many,
            Self::Update => actions.update,
            Self::Delete => actions.delete,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::ReadOne => "read_one",
            Self::ReadMany => "read_many",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for CrudAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A one-indexed page of a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    #[must_use]
    pub const fn new(number: u32, size: u32) -> Self {
        Self { number, size }
    }

    /// The resource's default page.
    #[must_use]
    pub const fn default_for(pagination: &Pagination) -> Self {
        Self::new(pagination.default_page_number, pagination.default_page_size)
    }

    /// Rows skipped before this page.
    #[must_use]
    pub fn offset(self) -> i64 {
        i64::from(self.number.saturating_sub(1)) * i64::from(self.size)
    }
}

/// Shape of a read.
///
/// Without an id the read lists rows; `fields` narrows the projection to
/// the named attributes and relationships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadRequest {
    pub id: Option<i64>,
    pub fields: Option<BTreeSet<String>>,
    pub page: Option<Page>,
}

impl ReadRequest {
    /// Lists rows with the resource's default page.
    #[must_use]
    pub fn many() -> Self {
        Self::default()
    }

    /// Reads a single row.
    #[must_use]
    pub fn one(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn page(mut self, page: Page) -> Self {
        self.page = Some(page);
        self
    }

    /// The read action this request performs.
    #[must_use]
    pub const fn action(&self) -> CrudAction {
        if self.id.is_some() {
            CrudAction::ReadOne
        } else {
            CrudAction::ReadMany
        }
    }
}

/// Shape of a create or update.
///
/// Keys are attribute names, meta names or names of relationships stored
/// on the resource's own table; a relationship's value is the related id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteRequest {
    pub id: Option<i64>,
    pub values: BTreeMap<String, serde_json::Value>,
}

impl WriteRequest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets an existing row.
    #[must_use]
    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn value(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

/// Supplies an extra read filter, ANDed into the `WHERE` clause verbatim.
///
/// The fragment is trusted SQL written by the host application; it must
/// not contain request data.
pub trait AuthorizationHook {
    fn filter(
        &self,
        definition: &ResourceDefinition,
        request: &ReadRequest,
        action: CrudAction,
    ) -> Option<String>;
}

impl<F> AuthorizationHook for F
where
    F: Fn(&ResourceDefinition, &ReadRequest, CrudAction) -> Option<String>,
{
    fn filter(
        &self,
        definition: &ResourceDefinition,
        request: &ReadRequest,
        action: CrudAction,
    ) -> Option<String> {
        self(definition, request, action)
    }
}

/// Compiles CRUD statements against a definition set.
pub struct QueryCompiler<'a> {
    definitions: &'a DefinitionSet,
    authorization: Option<Box<dyn AuthorizationHook + Send + Sync + 'a>>,
}

impl fmt::Debug for QueryCompiler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCompiler")
            .field("resources", &self.definitions.len())
            .field("authorization", &self.authorization.is_some())
            .finish()
    }
}

impl<'a> QueryCompiler<'a> {
    #[must_use]
    pub fn new(definitions: &'a DefinitionSet) -> Self {
        Self {
            definitions,
            authorization: None,
        }
    }

    /// Installs the hook consulted on every read.
    #[must_use]
    pub fn with_authorization(
        mut self,
        hook: impl AuthorizationHook + Send + Sync + 'a,
    ) -> Self {
        self.authorization = Some(Box::new(hook));
        self
    }

    /// Compiles a read of one row (`request.id` set) or a list.
    pub fn read(&self, resource: &str, request: &ReadRequest) -> Result<Statement> {
        let definition = self.definition(resource, request.action())?;
        self.read_definition(definition, request, request.action())
    }

    /// Compiles an `INSERT` returning the new row.
    pub fn create(&self, resource: &str, request: &WriteRequest) -> Result<Statement> {
        let definition = self.definition(resource, CrudAction::Create)?;
        write::insert(definition, request)
    }

    /// Compiles an `UPDATE` returning the updated row.
    ///
    /// Without values the update is a no-op and compiles to a read of the
    /// targeted row instead. The authorization hook still sees
    /// [`CrudAction::Update`].
    pub fn update(&self, resource: &str, request: &WriteRequest) -> Result<Statement> {
        let definition = self.definition(resource, CrudAction::Update)?;
        let id = require_id(definition, request.id, CrudAction::Update)?;
        if request.values.is_empty() {
            return self.read_definition(definition, &ReadRequest::one(id), CrudAction::Update);
        }
        write::update(definition, id, &request.values)
    }

    /// Compiles a `DELETE` returning the deleted row.
    pub fn delete(&self, resource: &str, id: Option<i64>) -> Result<Statement> {
        let definition = self.definition(resource, CrudAction::Delete)?;
        let id = require_id(definition, id, CrudAction::Delete)?;
        Ok(write::delete(definition, id))
    }

    fn read_definition(
        &self,
        definition: &ResourceDefinition,
        request: &ReadRequest,
        action: CrudAction,
    ) -> Result<Statement> {
        let filter = self
            .authorization
            .as_ref()
            .and_then(|hook| hook.filter(definition, request, action));
        read::compile(self.definitions, definition, request, filter.as_deref())
    }

    fn definition(&self, resource: &str, action: CrudAction) -> Result<&'a ResourceDefinition> {
        let definition = self
            .definitions
            .get(resource)
            .ok_or_else(|| CompileError::UnknownResource(resource.to_string()))?;
        if !action.is_enabled(&definition.model().actions) {
            return Err(CompileError::ActionDisabled {
                resource: resource.to_string(),
                action,
            });
        }
        Ok(definition)
    }
}

fn require_id(definition: &ResourceDefinition, id: Option<i64>, action: CrudAction) -> Result<i64> {
    id.ok_or_else(|| CompileError::MissingId {
        resource: definition.name().to_string(),
        action,
    })
}

//! PostgreSQL compilation for declarative resources.
//!
//! `oxide-resource-sql` takes the cross-linked definitions built by
//! `oxide-resource-core` and produces SQL text; it never talks to a
//! database.
//!
//! - **Migration** - a "create from scratch" script: the shared
//!   `updated_at` trigger function, one table per resource in dependency
//!   order, then one associative table per many-to-many relationship
//! - **Query** - one parameterized statement per CRUD verb, with
//!   relationships stored on other tables read back through `WITH` clause
//!   aggregates
//!
//! Description-supplied defaults and type literals are escaped before they
//! reach DDL; request values are always bound as `$n` parameters.
//!
//! # Example
//!
//! ```rust
//! use oxide_resource_sql::prelude::*;
//! use serde_json::json;
//!
//! let models = compile_models(vec![
//!     RawResource::from_value(json!({
//!         "name": "pizza",
//!         "relationships": {
//!             "toppings": { "resource": "topping", "cardinality": "many-to-many" }
//!         }
//!     }))
//!     .unwrap(),
//!     RawResource::named("topping"),
//! ])
//! .unwrap();
//! let definitions = DefinitionSet::build(models).unwrap();
//!
//! let migration = MigrationCompiler::new().compile(&definitions).unwrap();
//! assert!(migration.script().contains("CREATE TABLE pizza_topping"));
//!
//! let read = QueryCompiler::new(&definitions)
//!     .read("topping", &ReadRequest::many())
//!     .unwrap();
//! assert!(read.sql.contains("array_agg(pizza_topping.pizza_id)"));
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the migration for every resource in ./resources
//! oxide-resource migrate
//!
//! # Show the order tables are created in
//! oxide-resource --resources api/resources order
//!
//! # Compile a paginated read
//! oxide-resource query person --fields name,pets --page 2
//! ```

pub mod error;
pub mod escape;
pub mod migration;
pub mod query;
pub mod value;

pub use error::{CompileError, Result};
pub use migration::{Migration, MigrationCompiler};
pub use query::{
    AuthorizationHook, CrudAction, Page, QueryCompiler, ReadRequest, WriteRequest,
};
pub use value::{Param, Params, SqlValue, Statement, ToSqlValue};

/// Commonly used types.
pub mod prelude {
    pub use crate::error::{CompileError, Result};
    pub use crate::migration::{Migration, MigrationCompiler};
    pub use crate::query::{
        AuthorizationHook, CrudAction, Page, QueryCompiler, ReadRequest, WriteRequest,
    };
    pub use crate::value::{SqlValue, Statement};
    pub use oxide_resource_core::{
        compile_models, DefinitionSet, DependencyGraph, RawResource, ResourceDefinition,
        ResourceModel,
    };
}

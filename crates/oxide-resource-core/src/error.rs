//! Error types for building resource models and definitions.

use std::fmt;
use std::path::PathBuf;

/// A single structural problem found in a resource description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelIssue {
    /// Resource the issue belongs to.
    pub resource: String,
    /// Dotted path of the offending key (e.g. `attributes.Name`).
    pub path: String,
    /// What is wrong with it.
    pub message: String,
}

impl ModelIssue {
    /// Creates a new issue.
    #[must_use]
    pub fn new(
        resource: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            resource: resource.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ModelIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.resource, self.message)
        } else {
            write!(f, "{}.{}: {}", self.resource, self.path, self.message)
        }
    }
}

/// Errors that can occur while building the resource set.
///
/// All variants are fatal for the current build: no partial model or
/// definition set is ever returned alongside them.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// One or more resource descriptions failed structural checks.
    #[error("Invalid resource descriptions:\n{}", .0.iter().map(|i| format!("  - {i}")).collect::<Vec<_>>().join("\n"))]
    ModelValidation(Vec<ModelIssue>),

    /// Host relationships form a cycle, so no migration order exists.
    #[error("Cyclic host relationships between resources: {}", .resources.join(", "))]
    DependencyGraph {
        /// Resources participating in the cycle.
        resources: Vec<String>,
    },

    /// A relationship cannot be linked to its counterpart.
    #[error("Relationship '{resource}.{relationship}' to '{target}' cannot be resolved: {reason}")]
    UnresolvedRelationship {
        /// Resource declaring the relationship.
        resource: String,
        /// Relationship name.
        relationship: String,
        /// Related resource name.
        target: String,
        /// Why resolution failed.
        reason: String,
    },

    /// IO error while reading a resource directory.
    #[error("IO error on '{path}': {source}")]
    Io {
        /// File or directory being read.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A resource document is not valid JSON for a resource description.
    #[error("Failed to parse resource file '{path}': {source}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
}

impl ResourceError {
    /// Shorthand for an unresolved relationship.
    pub(crate) fn unresolved(
        resource: &str,
        relationship: &str,
        target: &str,
        reason: impl Into<String>,
    ) -> Self {
        Self::UnresolvedRelationship {
            resource: resource.to_string(),
            relationship: relationship.to_string(),
            target: target.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for resource operations.
pub type Result<T> = std::result::Result<T, ResourceError>;

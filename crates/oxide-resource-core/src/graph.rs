//! Dependency ordering of resources for migration.
//!
//! An edge `A -> B` exists when `A` hosts a foreign key to `B`, so `B` must
//! be created first. Many-to-many relationships live in associative tables
//! and self-references are accepted inside a single `CREATE TABLE`; neither
//! adds an edge.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ResourceError, Result};
use crate::model::{Cardinality, ResourceModel};

/// Resources and the resources each one references through a host key.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    dependencies: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Builds the graph from a model set.
    #[must_use]
    pub fn from_models<'a>(models: impl IntoIterator<Item = &'a ResourceModel>) -> Self {
        let models: Vec<&ResourceModel> = models.into_iter().collect();
        let mut graph = Self::default();
        for model in &models {
            graph.add_node(&model.name);
        }
        for model in &models {
            for rel in model.relationships.values() {
                if rel.host
                    && rel.cardinality != Cardinality::ManyToMany
                    && rel.resource != model.name
                {
                    graph.add_edge(&model.name, &rel.resource);
                }
            }
        }
        graph
    }

    /// Adds a resource with no dependencies.
    pub fn add_node(&mut self, name: &str) {
        self.dependencies.entry(name.to_string()).or_default();
    }

    /// Records that `from` must be migrated after `to`.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.add_node(to);
        self.dependencies
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
    }

    /// Resources `name` depends on.
    pub fn dependencies_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.dependencies
            .get(name)
            .into_iter()
            .flat_map(|deps| deps.iter().map(String::as_str))
    }

    /// Returns every resource, referenced resources first.
    ///
    /// Among resources with no ordering between them, names sort
    /// alphabetically. Fails with the resources left on a cycle.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        // Kahn's algorithm over remaining dependency counts.
        let mut remaining: BTreeMap<&str, usize> = self
            .dependencies
            .iter()
            .map(|(name, deps)| (name.as_str(), deps.len()))
            .collect();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (name, deps) in &self.dependencies {
            for dep in deps {
                dependents.entry(dep.as_str()).or_default().push(name.as_str());
            }
        }

        let mut ready: BTreeSet<&str> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut order = Vec::with_capacity(remaining.len());

        while let Some(name) = ready.pop_first() {
            remaining.remove(name);
            order.push(name.to_string());

            for dependent in dependents.get(name).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if remaining.is_empty() {
            Ok(order)
        } else {
            Err(ResourceError::DependencyGraph {
                resources: remaining.keys().map(|name| (*name).to_string()).collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Relationship;
    use crate::normalize::normalize;
    use crate::raw::RawResource;

    fn model(name: &str, host_refs: &[&str]) -> ResourceModel {
        let mut model = normalize(RawResource::named(name));
        for target in host_refs {
            model.relationships.insert(
                (*target).to_string(),
                Relationship::new(*target, Cardinality::ManyToOne),
            );
        }
        model
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn test_referenced_before_referencer() {
        let models = vec![model("cat", &["person"]), model("person", &[])];
        let order = DependencyGraph::from_models(&models)
            .topological_order()
            .unwrap();
        assert_eq!(order, vec!["person", "cat"]);
    }

    #[test]
    fn test_chain_order() {
        let models = vec![
            model("a", &["b", "c"]),
            model("b", &["c"]),
            model("c", &[]),
            model("d", &[]),
        ];
        let order = DependencyGraph::from_models(&models)
            .topological_order()
            .unwrap();
        assert_eq!(order.len(), 4);
        assert!(position(&order, "c") < position(&order, "b"));
        assert!(position(&order, "b") < position(&order, "a"));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let models = vec![
            model("a", &["b"]),
            model("b", &["c"]),
            model("c", &["a"]),
            model("d", &[]),
        ];
        let err = DependencyGraph::from_models(&models)
            .topological_order()
            .unwrap_err();
        match err {
            ResourceError::DependencyGraph { resources } => {
                assert_eq!(resources, vec!["a", "b", "c"]);
            }
            other => panic!("expected DependencyGraph, got {other:?}"),
        }
    }

    #[test]
    fn test_self_reference_adds_no_edge() {
        let models = vec![model("employee", &["employee"])];
        let graph = DependencyGraph::from_models(&models);
        assert_eq!(graph.dependencies_of("employee").count(), 0);
        assert_eq!(graph.topological_order().unwrap(), vec!["employee"]);
    }

    #[test]
    fn test_guest_and_many_to_many_add_no_edge() {
        let mut pizza = model("pizza", &[]);
        pizza.relationships.insert(
            "toppings".to_string(),
            Relationship::new("topping", Cardinality::ManyToMany),
        );
        let mut topping = model("topping", &[]);
        topping.relationships.insert(
            "pizzas".to_string(),
            Relationship::new("pizza", Cardinality::ManyToMany).guest(),
        );
        let graph = DependencyGraph::from_models(&[pizza, topping]);
        assert_eq!(graph.dependencies_of("pizza").count(), 0);
        assert_eq!(graph.dependencies_of("topping").count(), 0);
    }
}

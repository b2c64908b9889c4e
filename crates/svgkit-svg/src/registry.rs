//! Write-once id tables for cross references.

use crate::filter::FilterSpec;
use crate::paint::Gradient;
use crate::scene::NodeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use tracing::debug;

/// Id lookup tables filled while a document is assembled.
///
/// Each table keeps the first value registered under an id; later registrations are
/// ignored. Lookups of unknown ids return `None`.
#[derive(Debug, Clone, Default)]
pub struct IdRegistry {
    gradients: HashMap<String, Gradient>,
    filters: HashMap<String, FilterSpec>,
    templates: HashMap<String, svgkit_dom::NodeId>,
    nodes: HashMap<String, NodeId>,
}

fn insert_once<V>(table: &mut HashMap<String, V>, kind: &'static str, id: &str, value: V) -> bool {
    match table.entry(id.to_string()) {
        Entry::Occupied(_) => {
            debug!(kind, id, "Duplicate id, keeping first definition");
            false
        }
        Entry::Vacant(slot) => {
            slot.insert(value);
            true
        }
    }
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gradient under its own id. Returns `false` if the id was taken.
    pub fn register_gradient(&mut self, gradient: Gradient) -> bool {
        let id = gradient.id().to_string();
        insert_once(&mut self.gradients, "gradient", &id, gradient)
    }

    /// Register a filter under its own id. Returns `false` if the id was taken.
    pub fn register_filter(&mut self, filter: FilterSpec) -> bool {
        let id = filter.id.clone();
        insert_once(&mut self.filters, "filter", &id, filter)
    }

    /// Register an element that `<use>` may instantiate.
    pub fn register_template(&mut self, id: &str, node: svgkit_dom::NodeId) -> bool {
        insert_once(&mut self.templates, "template", id, node)
    }

    /// Register a scene node built for an element carrying `id`.
    pub fn register_node(&mut self, id: &str, node: NodeId) -> bool {
        insert_once(&mut self.nodes, "node", id, node)
    }

    pub fn gradient(&self, id: &str) -> Option<&Gradient> {
        self.gradients.get(id)
    }

    pub(crate) fn gradient_mut(&mut self, id: &str) -> Option<&mut Gradient> {
        self.gradients.get_mut(id)
    }

    pub fn filter(&self, id: &str) -> Option<&FilterSpec> {
        self.filters.get(id)
    }

    pub fn template(&self, id: &str) -> Option<svgkit_dom::NodeId> {
        self.templates.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<NodeId> {
        self.nodes.get(id).copied()
    }

    /// Take the id → scene node table, leaving it empty.
    pub(crate) fn take_nodes(&mut self) -> HashMap<String, NodeId> {
        std::mem::take(&mut self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSpec;

    #[test]
    fn test_first_registration_wins() {
        let mut registry = IdRegistry::new();
        assert!(registry.register_node("a", NodeId::new(1)));
        assert!(!registry.register_node("a", NodeId::new(2)));
        assert_eq!(registry.node("a"), Some(NodeId::new(1)));
    }

    #[test]
    fn test_missing_ids_are_none() {
        let registry = IdRegistry::new();
        assert!(registry.gradient("g").is_none());
        assert!(registry.filter("f").is_none());
        assert!(registry.template("t").is_none());
        assert!(registry.node("n").is_none());
    }

    #[test]
    fn test_tables_are_independent() {
        let mut registry = IdRegistry::new();
        assert!(registry.register_filter(FilterSpec::new("x")));
        assert!(!registry.register_filter(FilterSpec::new("x")));
        assert!(registry.register_node("x", NodeId::new(0)));
    }
}

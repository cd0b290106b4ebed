//! Graph Translation
//!
//! The translator turns front nodes into back components and copies their
//! settings across. It is the extension point where node types are added;
//! the synchronizer never looks at node kinds itself.

use std::collections::HashMap;

use super::IdentityMap;
use crate::engine::Component;
use crate::front::{EditorGraph, FrontGraph, FrontNode, FrontNodeId};

/// Maps front-graph vocabulary onto back-graph vocabulary.
///
/// Both methods receive the current [`IdentityMap`] so a translation can
/// depend on sibling nodes that are already mirrored.
pub trait Translator<G: FrontGraph + ?Sized, C> {
    /// Build the component for a front node, or `None` if its kind has no
    /// back-graph counterpart.
    fn translate_node(&self, graph: &G, node: FrontNodeId, mapped: &IdentityMap) -> Option<C>;

    /// Copy the node's current settings onto its existing component.
    fn apply_properties(&self, graph: &G, node: FrontNodeId, component: &mut C, mapped: &IdentityMap);
}

type Factory<P> = Box<dyn Fn(&FrontNode) -> Option<Component<P>>>;

/// Kind-keyed translator for [`EditorGraph`] nodes.
///
/// Each registered factory builds the component for one node kind. Property
/// application is generic: the node's property bag is merged over the
/// component's, so factories can seed defaults.
pub struct TranslatorRegistry<P> {
    factories: HashMap<String, Factory<P>>,
}

impl<P> TranslatorRegistry<P> {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register the factory for a node kind, replacing any previous one.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&FrontNode) -> Option<Component<P>> + 'static,
    {
        self.factories.insert(kind.into(), Box::new(factory));
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<F>(mut self, kind: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&FrontNode) -> Option<Component<P>> + 'static,
    {
        self.register(kind, factory);
        self
    }

    pub fn supports(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }
}

impl<P> Default for TranslatorRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Translator<EditorGraph, Component<P>> for TranslatorRegistry<P> {
    fn translate_node(
        &self,
        graph: &EditorGraph,
        node: FrontNodeId,
        _mapped: &IdentityMap,
    ) -> Option<Component<P>> {
        let node = graph.node(node)?;
        let factory = self.factories.get(node.kind())?;
        factory(node)
    }

    fn apply_properties(
        &self,
        graph: &EditorGraph,
        node: FrontNodeId,
        component: &mut Component<P>,
        _mapped: &IdentityMap,
    ) {
        let Some(node) = graph.node(node) else {
            return;
        };
        let props = component.props_mut();
        for (key, value) in node.props() {
            props.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::PropValue;

    fn registry() -> TranslatorRegistry<f64> {
        TranslatorRegistry::new().with("scale", |node| {
            let component: Component<f64> = Component::from_fn(node.kind(), node.input_count(), 1, |inputs, props| {
                let factor = props.get("factor").and_then(PropValue::as_float).unwrap_or(1.0);
                Ok(vec![inputs[0].unwrap_or(0.0) * factor])
            });
            Some(component)
        })
    }

    #[test]
    fn unknown_kind_is_not_translated() {
        let mut graph = EditorGraph::new();
        let id = graph.add_node(FrontNode::new("comment", 0, 0));

        let registry = registry();
        assert!(!registry.supports("comment"));
        assert!(registry
            .translate_node(&graph, id, &IdentityMap::new())
            .is_none());
    }

    #[test]
    fn known_kind_builds_component() {
        let mut graph = EditorGraph::new();
        let id = graph.add_node(FrontNode::new("scale", 1, 1));

        let component = registry()
            .translate_node(&graph, id, &IdentityMap::new())
            .unwrap();
        assert_eq!(component.name(), "scale");
        assert_eq!(component.input_count(), 1);
    }

    #[test]
    fn properties_merge_over_defaults() {
        let mut graph = EditorGraph::new();
        let id = graph.add_node(FrontNode::new("scale", 1, 1).with_prop("factor", 3.0));

        let registry = registry();
        let mapped = IdentityMap::new();
        let mut component = registry.translate_node(&graph, id, &mapped).unwrap();
        component.props_mut().insert("mode".into(), "linear".into());

        registry.apply_properties(&graph, id, &mut component, &mapped);
        assert_eq!(component.props().get("factor"), Some(&PropValue::Float(3.0)));
        assert_eq!(component.props().get("mode"), Some(&PropValue::from("linear")));
    }
}

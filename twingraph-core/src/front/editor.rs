//! Reference Editor Graph
//!
//! A small in-memory front graph. Hosts with their own node model implement
//! [`FrontGraph`] directly; this one backs the tests and simple embeddings.

use indexmap::IndexMap;

use super::{FrontConnection, FrontGraph, FrontNodeId, NodeNaming, Pin};
use crate::props::{PropValue, Properties};

/// A node as the editor sees it.
#[derive(Debug, Clone)]
pub struct FrontNode {
    id: FrontNodeId,
    kind: String,
    /// `None` for node kinds without a displayed name.
    name: Option<String>,
    inputs: usize,
    outputs: usize,
    props: Properties,
}

impl FrontNode {
    /// Create a node of the given kind with pin counts. The node is not
    /// nameable until [`with_name`](Self::with_name) is called.
    pub fn new(kind: impl Into<String>, inputs: usize, outputs: usize) -> Self {
        Self {
            id: FrontNodeId::new(),
            kind: kind.into(),
            name: None,
            inputs,
            outputs,
            props: Properties::new(),
        }
    }

    /// Make the node nameable with an initial displayed name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> FrontNodeId {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn input_count(&self) -> usize {
        self.inputs
    }

    pub fn output_count(&self) -> usize {
        self.outputs
    }

    pub fn props(&self) -> &Properties {
        &self.props
    }

    pub fn set_prop(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        self.props.insert(key.into(), value.into());
    }

    /// User-driven rename. Ignored for nodes that are not nameable.
    pub fn rename(&mut self, name: impl Into<String>) {
        if self.name.is_some() {
            self.name = Some(name.into());
        }
    }
}

/// A front graph holding nodes and their connections.
#[derive(Debug, Clone, Default)]
pub struct EditorGraph {
    nodes: IndexMap<FrontNodeId, FrontNode>,
    /// Connections grouped by the node they feed, each group ordered by
    /// input pin.
    incoming: IndexMap<FrontNodeId, Vec<FrontConnection>>,
}

impl EditorGraph {
    /// Creates a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node and returns its ID.
    pub fn add_node(&mut self, node: FrontNode) -> FrontNodeId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Removes a node and every connection touching it.
    pub fn remove_node(&mut self, id: FrontNodeId) -> Option<FrontNode> {
        self.incoming.shift_remove(&id);
        self.incoming.retain(|_, group| {
            group.retain(|conn| conn.from.node != id);
            !group.is_empty()
        });
        self.nodes.shift_remove(&id)
    }

    pub fn node_mut(&mut self, id: FrontNodeId) -> Option<&mut FrontNode> {
        self.nodes.get_mut(&id)
    }

    /// Connects an output pin to an input pin.
    ///
    /// Returns `None` if either node is missing or a pin index is out of
    /// range. An input pin holds at most one connection; connecting to an
    /// occupied input replaces the previous connection.
    pub fn connect(&mut self, from: Pin, to: Pin) -> Option<FrontConnection> {
        let from_node = self.nodes.get(&from.node)?;
        let to_node = self.nodes.get(&to.node)?;
        if from.pos_idx >= from_node.outputs || to.pos_idx >= to_node.inputs {
            return None;
        }

        let conn = FrontConnection::new(from, to);
        let group = self.incoming.entry(to.node).or_default();
        match group.binary_search_by_key(&to.pos_idx, |c| c.to.pos_idx) {
            Ok(slot) => group[slot] = conn,
            Err(slot) => group.insert(slot, conn),
        }
        Some(conn)
    }

    /// Removes a connection. Returns whether it existed.
    pub fn disconnect(&mut self, conn: &FrontConnection) -> bool {
        let Some(group) = self.incoming.get_mut(&conn.to.node) else {
            return false;
        };
        let Some(slot) = group.iter().position(|c| c == conn) else {
            return false;
        };
        group.remove(slot);
        if group.is_empty() {
            self.incoming.shift_remove(&conn.to.node);
        }
        true
    }

    /// Removes every node and connection.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.incoming.clear();
    }

    /// All connections, grouped by target node.
    pub fn connections(&self) -> impl Iterator<Item = &FrontConnection> {
        self.incoming.values().flatten()
    }

    pub fn connection_count(&self) -> usize {
        self.incoming.values().map(Vec::len).sum()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &FrontNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl FrontGraph for EditorGraph {
    type Node = FrontNode;

    fn node(&self, id: FrontNodeId) -> Option<&FrontNode> {
        self.nodes.get(&id)
    }

    fn display_name(&self, id: FrontNodeId) -> Option<&str> {
        self.nodes.get(&id).and_then(FrontNode::name)
    }

    fn incoming(&self, id: FrontNodeId) -> Vec<FrontConnection> {
        self.incoming.get(&id).cloned().unwrap_or_default()
    }
}

impl NodeNaming for EditorGraph {
    fn set_name(&mut self, id: FrontNodeId, name: &str) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.rename(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_nodes() -> (EditorGraph, FrontNodeId, FrontNodeId) {
        let mut graph = EditorGraph::new();
        let a = graph.add_node(FrontNode::new("const", 0, 1));
        let b = graph.add_node(FrontNode::new("scale", 2, 1).with_name("scale"));
        (graph, a, b)
    }

    #[test]
    fn remove_node_drops_its_connections() {
        let (mut graph, a, b) = two_nodes();
        graph.connect(Pin::new(a, 0), Pin::new(b, 0)).unwrap();
        assert_eq!(graph.connection_count(), 1);

        graph.remove_node(a);
        assert_eq!(graph.connection_count(), 0);
        assert!(graph.incoming(b).is_empty());
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn incoming_only_holds_connections_into_the_node() {
        let (mut graph, a, b) = two_nodes();
        let c = graph.add_node(FrontNode::new("scale", 1, 1));

        let a_to_b = graph.connect(Pin::new(a, 0), Pin::new(b, 1)).unwrap();
        let b_to_c = graph.connect(Pin::new(b, 0), Pin::new(c, 0)).unwrap();

        assert_eq!(graph.incoming(b), vec![a_to_b]);
        assert_eq!(graph.incoming(c), vec![b_to_c]);
        assert!(graph.incoming(a).is_empty());

        assert!(graph.disconnect(&a_to_b));
        assert!(!graph.disconnect(&a_to_b));
        assert!(graph.incoming(b).is_empty());
        assert_eq!(graph.connections().collect::<Vec<_>>(), vec![&b_to_c]);
    }

    #[test]
    fn connect_rejects_bad_pins() {
        let (mut graph, a, b) = two_nodes();
        assert!(graph.connect(Pin::new(a, 1), Pin::new(b, 0)).is_none());
        assert!(graph.connect(Pin::new(a, 0), Pin::new(b, 2)).is_none());
        assert!(graph
            .connect(Pin::new(a, 0), Pin::new(FrontNodeId::new(), 0))
            .is_none());
    }

    #[test]
    fn connecting_occupied_input_replaces() {
        let (mut graph, a, b) = two_nodes();
        let c = graph.add_node(FrontNode::new("const", 0, 1));

        graph.connect(Pin::new(a, 0), Pin::new(b, 0)).unwrap();
        graph.connect(Pin::new(c, 0), Pin::new(b, 0)).unwrap();

        let incoming = graph.incoming(b);
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].from.node, c);
    }

    #[test]
    fn incoming_is_ordered_by_input_pin() {
        let (mut graph, a, b) = two_nodes();
        let c = graph.add_node(FrontNode::new("const", 0, 1));

        graph.connect(Pin::new(c, 0), Pin::new(b, 1)).unwrap();
        graph.connect(Pin::new(a, 0), Pin::new(b, 0)).unwrap();

        let pins: Vec<_> = graph.incoming(b).iter().map(|c| c.to.pos_idx).collect();
        assert_eq!(pins, vec![0, 1]);
    }

    #[test]
    fn set_name_only_touches_nameable_nodes() {
        let (mut graph, a, b) = two_nodes();
        graph.set_name(a, "ignored");
        graph.set_name(b, "scale_1");

        assert_eq!(graph.display_name(a), None);
        assert_eq!(graph.display_name(b), Some("scale_1"));
    }
}

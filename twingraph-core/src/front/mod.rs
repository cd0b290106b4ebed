//! Front Graph
//!
//! The front graph is the node graph the user edits. It belongs to the host
//! editor; this crate only reads it through [`FrontGraph`] and asks for
//! renames through [`NodeNaming`].
//!
//! # Identity
//!
//! Front nodes are identified by [`FrontNodeId`], a token handed out when the
//! node is created and never reused. Two nodes with identical contents are
//! still different nodes.
//!
//! # Pins
//!
//! A [`Pin`] names its parent node and its positional index in that node's
//! input or output list. The positional index is what ends up in the back
//! graph's port address, so it must not change when a node is renamed.

mod editor;

pub use editor::{EditorGraph, FrontNode};

use std::sync::atomic::{AtomicU64, Ordering};

/// Stable identity of a node in the front graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrontNodeId(u64);

impl FrontNodeId {
    /// Generate a new unique front node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for FrontNodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// One endpoint of a front connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pin {
    /// The node that owns this pin.
    pub node: FrontNodeId,
    /// Position of the pin within its node's input or output list.
    pub pos_idx: usize,
}

impl Pin {
    pub fn new(node: FrontNodeId, pos_idx: usize) -> Self {
        Self { node, pos_idx }
    }
}

/// An edge from an output pin to an input pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrontConnection {
    pub from: Pin,
    pub to: Pin,
}

impl FrontConnection {
    pub fn new(from: Pin, to: Pin) -> Self {
        Self { from, to }
    }
}

/// Read-only view of the front graph.
pub trait FrontGraph {
    /// The host's node type.
    type Node;

    /// Look up a node by identity.
    fn node(&self, id: FrontNodeId) -> Option<&Self::Node>;

    /// The node's displayed name, or `None` if its kind cannot be named.
    fn display_name(&self, id: FrontNodeId) -> Option<&str>;

    /// Every connection that ends on one of the node's input pins,
    /// ordered by input pin.
    fn incoming(&self, id: FrontNodeId) -> Vec<FrontConnection>;
}

/// The only mutation the synchronizer may ask of the front graph.
pub trait NodeNaming {
    /// Set the displayed name of a nameable node. Unknown or unnamed
    /// nodes are ignored.
    fn set_name(&mut self, id: FrontNodeId, name: &str);
}

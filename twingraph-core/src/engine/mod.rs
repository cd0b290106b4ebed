//! Dependency Graph Engine
//!
//! The back graph: components, the connections between their ports, dirty
//! tracking, and recomputation in dependency order.
//!
//! # Overview
//!
//! The synchronizer only talks to the engine through [`DependencyGraph`].
//! [`DagEngine`] is the implementation shipped with this crate:
//!
//! - Components are indexed by [`ComponentId`] for O(1) lookups.
//! - Each input port holds at most one incoming connection. Connecting to
//!   an occupied input replaces the previous source.
//! - Connections that would close a cycle are rejected.
//! - Changing a component marks it dirty and everything downstream maybe
//!   dirty. [`DependencyGraph::update`] then walks the pending components in
//!   topological order and only recomputes a maybe-dirty component if one
//!   of its inputs actually produced a different value.

mod component;
mod scheduler;

pub use component::{Component, ComponentId, DirtyState, Operator};
pub use scheduler::{DagEngine, UpdateReport};

use crate::error::EngineResult;

/// One endpoint of a back-graph connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortAddr {
    pub component: ComponentId,
    /// Positional port index within the component.
    pub index: usize,
}

impl PortAddr {
    pub fn new(component: ComponentId, index: usize) -> Self {
        Self { component, index }
    }
}

/// A back-graph connection from an output port to an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Link {
    pub from: PortAddr,
    pub to: PortAddr,
}

impl Link {
    pub fn new(from: PortAddr, to: PortAddr) -> Self {
        Self { from, to }
    }
}

/// The operations the synchronizer needs from a dependency graph engine.
pub trait DependencyGraph {
    /// The engine's component type, as produced by the translator.
    type Component;

    /// Take ownership of a component and return its handle.
    fn add_component(&mut self, component: Self::Component) -> ComponentId;

    /// Remove a component together with every connection touching it.
    /// Returns whether the component existed.
    fn remove_component(&mut self, id: ComponentId) -> bool;

    fn clear_all_components(&mut self);

    fn contains(&self, id: ComponentId) -> bool;

    /// Canonical name of a component.
    fn component_name(&self, id: ComponentId) -> Option<&str>;

    fn component_mut(&mut self, id: ComponentId) -> Option<&mut Self::Component>;

    fn connect(&mut self, from: PortAddr, to: PortAddr) -> EngineResult<()>;

    fn disconnect(&mut self, from: PortAddr, to: PortAddr) -> EngineResult<()>;

    /// Replace the whole connection set in one step.
    ///
    /// Links naming an unknown component or an out-of-range port are left
    /// out and the rest are applied. A cycle rejects the whole batch and the
    /// previous connections stay in place.
    fn rebuild_connections(&mut self, links: &[Link]) -> EngineResult<()>;

    /// Mark a component as changed so the next update recomputes it and
    /// everything downstream.
    fn mark_dirty(&mut self, id: ComponentId);

    /// Recompute all dirty components in dependency order. Calling it again
    /// on a clean graph does nothing.
    fn update(&mut self);
}

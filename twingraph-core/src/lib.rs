//! Twingraph Core
//!
//! This crate keeps two graphs in step: the node graph a user edits (the
//! front graph) and the dependency graph that actually computes results
//! (the back graph). It implements:
//!
//! - A bidirectional identity map between front nodes and back components
//! - Event handlers that replay front edits onto the back graph
//! - An incremental dependency graph engine with dirty propagation
//! - A preview builder that publishes results after every update
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `front`: Front-graph introspection traits and a reference editor graph
//! - `engine`: Dependency graph contract and the `DagEngine` implementation
//! - `sync`: Identity map, node translation and the `Synchronizer`
//! - `preview`: Preview builder contract and snapshot artifacts
//! - `config`, `props`, `error`: Shared configuration, property values and errors
//!
//! # Example
//!
//! ```rust,ignore
//! use twingraph_core::prelude::*;
//!
//! let translator = TranslatorRegistry::new().with("value", |node| {
//!     Some(Component::from_fn(node.kind(), 0, 1, |_, props| {
//!         Ok(vec![props.get("value").and_then(PropValue::as_float).unwrap_or(0.0)])
//!     }))
//! });
//! let mut sync = Synchronizer::new(DagEngine::<f64>::new(), translator, SnapshotPreview::new());
//!
//! let mut graph = EditorGraph::new();
//! let node = graph.add_node(FrontNode::new("value", 0, 1).with_prop("value", 2.0));
//! if let Some(rename) = sync.on_add_node(&graph, node, true) {
//!     rename.apply(&mut graph);
//! }
//!
//! // The preview now holds the computed output
//! let artifact = sync.preview().latest().unwrap();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod front;
pub mod preview;
pub mod props;
pub mod sync;

/// The types most hosts need.
pub mod prelude {
    pub use crate::config::SyncConfig;
    pub use crate::engine::{Component, ComponentId, DagEngine, DependencyGraph, Link, PortAddr};
    pub use crate::error::{ComputeError, EngineError};
    pub use crate::front::{EditorGraph, FrontConnection, FrontGraph, FrontNode, FrontNodeId, NodeNaming, Pin};
    pub use crate::preview::{PreviewBuilder, SnapshotPreview};
    pub use crate::props::{PropValue, Properties};
    pub use crate::sync::{Rename, SyncStats, Synchronizer, Translator, TranslatorRegistry};
}

//! Synchronizer
//!
//! Receives front-graph edit events and replays them on the back graph.
//!
//! # Handler Contract
//!
//! Every handler takes the back graph from one consistent state to the next:
//!
//! - A component exists exactly while its front node is in the identity map.
//! - A back connection exists only if both endpoints are mirrored.
//! - The component's name wins over the front node's displayed name.
//!
//! Events that reference something the back graph does not know about
//! (unsupported node kinds, nodes already removed, connections to unmirrored
//! nodes) are dropped. They are logged at `debug` and counted in
//! [`SyncStats`], never reported to the caller. Mutations the engine refuses
//! are logged at `warn` and counted the same way.
//!
//! # Renames
//!
//! Handlers never write to the front graph. When the displayed name of a
//! node has to follow its component, the handler returns a [`Rename`] for
//! the caller to apply.

use tracing::{debug, warn};

use super::{IdentityMap, Translator};
use crate::config::SyncConfig;
use crate::engine::{ComponentId, DependencyGraph, Link, PortAddr};
use crate::front::{FrontConnection, FrontGraph, FrontNodeId, NodeNaming};
use crate::preview::PreviewBuilder;

/// A front node whose displayed name must change to match its component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rename {
    pub node: FrontNodeId,
    pub name: String,
}

impl Rename {
    /// Apply the rename to the front graph.
    pub fn apply<N: NodeNaming + ?Sized>(self, target: &mut N) {
        target.set_name(self.node, &self.name);
    }
}

/// Counters for events that were dropped or rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Added nodes the translator could not represent.
    pub translation_misses: u64,
    /// Events naming a front node that is not mirrored.
    pub unmapped_lookups: u64,
    /// Adds for a front node that is already mirrored.
    pub duplicate_adds: u64,
    /// Connections skipped because an endpoint is not mirrored.
    pub dropped_connections: u64,
    /// Mutations refused by the engine or the identity map.
    pub engine_rejections: u64,
    /// Update passes run.
    pub updates: u64,
}

/// Keeps a dependency graph engine in sync with a front graph.
pub struct Synchronizer<E, T, B> {
    engine: E,
    translator: T,
    preview: B,
    identity: IdentityMap,
    config: SyncConfig,
    stats: SyncStats,
}

impl<E, T, B> Synchronizer<E, T, B>
where
    E: DependencyGraph,
    B: PreviewBuilder<E>,
{
    pub fn new(engine: E, translator: T, preview: B) -> Self {
        Self::with_config(engine, translator, preview, SyncConfig::default())
    }

    pub fn with_config(engine: E, translator: T, preview: B, config: SyncConfig) -> Self {
        Self {
            engine,
            translator,
            preview,
            identity: IdentityMap::new(),
            config,
            stats: SyncStats::default(),
        }
    }

    /// Mirror a newly added front node.
    ///
    /// Pass `auto_update = false` while loading many nodes at once and
    /// call [`update`](Self::update) when done.
    #[must_use = "the front node keeps its old name unless the rename is applied"]
    pub fn on_add_node<G>(&mut self, graph: &G, node: FrontNodeId, auto_update: bool) -> Option<Rename>
    where
        G: FrontGraph + ?Sized,
        T: Translator<G, E::Component>,
    {
        if self.identity.contains(node) {
            self.stats.duplicate_adds += 1;
            debug!(?node, "node is already mirrored, add ignored");
            return None;
        }

        let Some(component) = self.translator.translate_node(graph, node, &self.identity) else {
            self.stats.translation_misses += 1;
            debug!(?node, "node has no back-graph counterpart");
            return None;
        };

        let back = self.engine.add_component(component);
        if let Err(err) = self.identity.insert(node, back) {
            // The handle belongs to another front node; its component stays
            self.stats.engine_rejections += 1;
            warn!(?node, %err, "identity map rejected component");
            return None;
        }

        let rename = self.rename_if_diverged(graph, node, back);

        if let Some(component) = self.engine.component_mut(back) {
            self.translator
                .apply_properties(graph, node, component, &self.identity);
        }

        debug!(?node, component = ?back, "node mirrored");
        if auto_update {
            self.update();
        }
        rename
    }

    /// Drop the component mirroring a removed front node.
    pub fn on_remove_node(&mut self, node: FrontNodeId) {
        let Some(back) = self.identity.erase(node) else {
            self.stats.unmapped_lookups += 1;
            debug!(?node, "removed node was not mirrored");
            return;
        };

        self.engine.remove_component(back);
        debug!(?node, component = ?back, "node unmirrored");
        self.update();
    }

    pub fn on_clear_all_nodes(&mut self) {
        self.engine.clear_all_components();
        self.identity.clear();
        self.update();
    }

    /// Re-apply a node's properties onto its existing component.
    #[must_use = "the front node keeps its old name unless the rename is applied"]
    pub fn on_node_property_changed<G>(&mut self, graph: &G, node: FrontNodeId) -> Option<Rename>
    where
        G: FrontGraph + ?Sized,
        T: Translator<G, E::Component>,
    {
        let Some(back) = self.identity.find(node) else {
            self.stats.unmapped_lookups += 1;
            debug!(?node, "property change on unmirrored node");
            return None;
        };

        if let Some(component) = self.engine.component_mut(back) {
            self.translator
                .apply_properties(graph, node, component, &self.identity);
        }

        let rename = self.rename_if_diverged(graph, node, back);
        self.engine.mark_dirty(back);
        self.update();
        rename
    }

    pub fn on_connected(&mut self, conn: &FrontConnection) {
        let Some((from, to)) = self.resolve(conn) else {
            self.drop_connection(conn);
            return;
        };

        if let Err(err) = self.engine.connect(from, to) {
            self.stats.engine_rejections += 1;
            warn!(?conn, %err, "engine rejected connection");
        }
        self.update();
    }

    pub fn on_disconnecting(&mut self, conn: &FrontConnection) {
        let Some((from, to)) = self.resolve(conn) else {
            self.drop_connection(conn);
            return;
        };

        if let Err(err) = self.engine.disconnect(from, to) {
            self.stats.engine_rejections += 1;
            warn!(?conn, %err, "engine rejected disconnection");
        }
        self.update();
    }

    /// Replace the engine's connections with everything the front graph
    /// currently wires between mirrored nodes.
    pub fn on_rebuild_connection<G>(&mut self, graph: &G)
    where
        G: FrontGraph + ?Sized,
    {
        let mut links = Vec::new();
        let mut dropped = 0;

        for (front, _) in self.identity.iter() {
            for conn in graph.incoming(front) {
                match self.resolve(&conn) {
                    Some((from, to)) => links.push(Link::new(from, to)),
                    None => dropped += 1,
                }
            }
        }

        self.stats.dropped_connections += dropped;
        debug!(links = links.len(), dropped, "rebuilding connections");

        if let Err(err) = self.engine.rebuild_connections(&links) {
            self.stats.engine_rejections += 1;
            warn!(%err, "engine rejected connection rebuild");
        }
        self.update();
    }

    /// The component mirroring a front node, if any.
    pub fn query_back_node(&self, node: FrontNodeId) -> Option<ComponentId> {
        self.identity.find(node)
    }

    /// Recompute the engine, then rebuild the preview.
    pub fn update(&mut self) {
        self.engine.update();
        self.stats.updates += 1;

        if self.config.rebuild_preview {
            self.preview.build(&self.engine);
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn translator(&self) -> &T {
        &self.translator
    }

    pub fn preview(&self) -> &B {
        &self.preview
    }

    pub fn identity(&self) -> &IdentityMap {
        &self.identity
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn stats(&self) -> SyncStats {
        self.stats
    }

    fn resolve(&self, conn: &FrontConnection) -> Option<(PortAddr, PortAddr)> {
        let from = self.identity.find(conn.from.node)?;
        let to = self.identity.find(conn.to.node)?;
        Some((
            PortAddr::new(from, conn.from.pos_idx),
            PortAddr::new(to, conn.to.pos_idx),
        ))
    }

    fn drop_connection(&mut self, conn: &FrontConnection) {
        self.stats.dropped_connections += 1;
        debug!(?conn, "connection endpoint not mirrored");
        if self.config.update_on_unresolved_connection {
            self.update();
        }
    }

    fn rename_if_diverged<G>(&self, graph: &G, node: FrontNodeId, back: ComponentId) -> Option<Rename>
    where
        G: FrontGraph + ?Sized,
    {
        let shown = graph.display_name(node)?;
        let canonical = self.engine.component_name(back)?;
        (shown != canonical).then(|| Rename {
            node,
            name: canonical.to_string(),
        })
    }
}

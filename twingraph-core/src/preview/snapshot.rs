//! Snapshot Preview
//!
//! Builds a serializable picture of the engine after each update.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::PreviewBuilder;
use crate::engine::{Component, DagEngine};
use crate::error::PreviewError;
use crate::props::Properties;

/// Computation status of one component at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PreviewStatus {
    Clean,
    /// Still dirty. Only seen if the builder runs without a prior update.
    Pending,
    Failed { message: String },
}

/// One component in a preview artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewEntry {
    pub id: u64,
    pub name: String,
    pub status: PreviewStatus,
    /// Output values in port order. Empty unless the component computed.
    pub outputs: Vec<serde_json::Value>,
    pub props: Properties,
}

/// Everything a renderer needs to draw the current preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewArtifact {
    /// Increases by one with every build.
    pub revision: u64,
    pub components: Vec<PreviewEntry>,
    pub link_count: usize,
}

impl PreviewArtifact {
    pub fn entry(&self, name: &str) -> Option<&PreviewEntry> {
        self.components.iter().find(|entry| entry.name == name)
    }

    /// Entries whose computation failed.
    pub fn failures(&self) -> impl Iterator<Item = &PreviewEntry> {
        self.components
            .iter()
            .filter(|entry| matches!(entry.status, PreviewStatus::Failed { .. }))
    }

    /// Encode as MessagePack for an out-of-process renderer.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, PreviewError> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, PreviewError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Read side of a [`SnapshotPreview`]. Cheap to clone and safe to hand to
/// another thread.
#[derive(Debug, Clone, Default)]
pub struct PreviewHandle {
    slot: Arc<RwLock<Option<Arc<PreviewArtifact>>>>,
}

impl PreviewHandle {
    /// The most recently published artifact.
    pub fn latest(&self) -> Option<Arc<PreviewArtifact>> {
        self.slot.read().clone()
    }

    /// Revision of the latest artifact, `0` before the first build.
    pub fn revision(&self) -> u64 {
        self.slot
            .read()
            .as_ref()
            .map(|artifact| artifact.revision)
            .unwrap_or(0)
    }

    fn publish(&self, artifact: PreviewArtifact) {
        *self.slot.write() = Some(Arc::new(artifact));
    }
}

/// Preview builder that publishes [`PreviewArtifact`]s.
#[derive(Debug, Default)]
pub struct SnapshotPreview {
    handle: PreviewHandle,
    revision: u64,
}

impl SnapshotPreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle for readers of the published artifacts.
    pub fn handle(&self) -> PreviewHandle {
        self.handle.clone()
    }

    pub fn latest(&self) -> Option<Arc<PreviewArtifact>> {
        self.handle.latest()
    }
}

fn entry_for<P: Serialize>(component: &Component<P>) -> PreviewEntry {
    let status = if let Some(err) = component.error() {
        PreviewStatus::Failed {
            message: err.message.clone(),
        }
    } else if component.is_clean() {
        PreviewStatus::Clean
    } else {
        PreviewStatus::Pending
    };

    let outputs = component
        .outputs()
        .unwrap_or_default()
        .iter()
        .map(|value| {
            serde_json::to_value(value).unwrap_or_else(|err| {
                warn!(component = component.name(), %err, "output is not serializable");
                serde_json::Value::Null
            })
        })
        .collect();

    PreviewEntry {
        id: component.id().raw(),
        name: component.name().to_string(),
        status,
        outputs,
        props: component.props().clone(),
    }
}

impl<P: Serialize> PreviewBuilder<DagEngine<P>> for SnapshotPreview {
    fn build(&mut self, engine: &DagEngine<P>) {
        self.revision += 1;

        let artifact = PreviewArtifact {
            revision: self.revision,
            components: engine.components().map(entry_for).collect(),
            link_count: engine.links().len(),
        };

        debug!(
            revision = artifact.revision,
            components = artifact.components.len(),
            failures = artifact.failures().count(),
            "preview built"
        );
        self.handle.publish(artifact);
    }
}

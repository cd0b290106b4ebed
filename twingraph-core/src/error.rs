//! Error Types
//!
//! Errors stay local to the layer that produces them. Engine and identity
//! errors are reported to the synchronizer, which logs and counts them but
//! never hands them back to the editor that fired the event.

use thiserror::Error;

use crate::engine::ComponentId;
use crate::front::FrontNodeId;

/// Errors raised by the dependency graph engine when a mutation is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("component {0:?} is not part of the graph")]
    UnknownComponent(ComponentId),

    #[error("port {port} is out of range for component {component:?} ({available} available)")]
    PortOutOfRange {
        component: ComponentId,
        port: usize,
        available: usize,
    },

    #[error("connecting {from:?} -> {to:?} would create a cycle")]
    CycleDetected { from: ComponentId, to: ComponentId },
}

/// A failure while computing a single component.
///
/// The engine records it on the component instead of aborting the update.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ComputeError {
    pub message: String,
}

impl ComputeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised by the identity map.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("component {component:?} is already mapped from front node {owner:?}")]
    HandleInUse {
        component: ComponentId,
        owner: FrontNodeId,
    },
}

/// Errors raised while loading a [`SyncConfig`](crate::config::SyncConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid sync config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while encoding or decoding a preview artifact.
#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("failed to encode preview artifact: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("failed to decode preview artifact: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

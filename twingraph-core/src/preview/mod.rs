//! Preview Building
//!
//! After every update the synchronizer hands the engine to a
//! [`PreviewBuilder`]. [`SnapshotPreview`] is the builder shipped with this
//! crate: it captures each component's status and outputs into a
//! [`PreviewArtifact`] and publishes it through a shared slot, so a renderer
//! on another thread can pick up the latest artifact without touching the
//! engine.

mod snapshot;

pub use snapshot::{PreviewArtifact, PreviewEntry, PreviewHandle, PreviewStatus, SnapshotPreview};

/// Consumes the post-update engine state.
pub trait PreviewBuilder<E: ?Sized> {
    fn build(&mut self, engine: &E);
}

/// Headless hosts can use `()` as a builder that does nothing.
impl<E: ?Sized> PreviewBuilder<E> for () {
    fn build(&mut self, _engine: &E) {}
}

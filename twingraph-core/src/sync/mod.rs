//! Front/Back Synchronization
//!
//! This module keeps the back graph a faithful mirror of the front graph.
//!
//! # Pieces
//!
//! - [`IdentityMap`]: which component mirrors which front node
//! - [`Translator`]: how a front node becomes a component
//! - [`Synchronizer`]: the event handlers that tie both together and
//!   trigger recomputation
//!
//! # Flow
//!
//! ```text
//! front edit event
//!     -> Synchronizer (IdentityMap, Translator, engine mutation)
//!     -> engine update
//!     -> preview build
//! ```
//!
//! Everything runs on the caller's thread. A handler finishes before the
//! next one can start, so no intermediate state is ever visible.

mod identity;
mod synchronizer;
mod translator;

pub use identity::IdentityMap;
pub use synchronizer::{Rename, SyncStats, Synchronizer};
pub use translator::{Translator, TranslatorRegistry};

//! Identity Map
//!
//! Bidirectional association between front nodes and back components.
//! The forward map answers "which component mirrors this node"; the reverse
//! index exists to keep the mapping injective.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::engine::ComponentId;
use crate::error::IdentityError;
use crate::front::FrontNodeId;

/// Front node to back component mapping.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    forward: IndexMap<FrontNodeId, ComponentId>,
    reverse: HashMap<ComponentId, FrontNodeId>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `front` to `back`.
    ///
    /// Re-mapping a front node replaces its previous component. Mapping a
    /// component that another front node already owns is rejected.
    pub fn insert(
        &mut self,
        front: FrontNodeId,
        back: ComponentId,
    ) -> Result<Option<ComponentId>, IdentityError> {
        if let Some(&owner) = self.reverse.get(&back) {
            if owner != front {
                return Err(IdentityError::HandleInUse {
                    component: back,
                    owner,
                });
            }
        }

        let previous = self.forward.insert(front, back);
        if let Some(old) = previous {
            self.reverse.remove(&old);
        }
        self.reverse.insert(back, front);
        Ok(previous)
    }

    pub fn find(&self, front: FrontNodeId) -> Option<ComponentId> {
        self.forward.get(&front).copied()
    }

    /// Reverse lookup.
    pub fn owner(&self, back: ComponentId) -> Option<FrontNodeId> {
        self.reverse.get(&back).copied()
    }

    pub fn contains(&self, front: FrontNodeId) -> bool {
        self.forward.contains_key(&front)
    }

    /// Remove a front node's entry and return the component it mapped to.
    pub fn erase(&mut self, front: FrontNodeId) -> Option<ComponentId> {
        let back = self.forward.swap_remove(&front)?;
        self.reverse.remove(&back);
        Some(back)
    }

    pub fn clear(&mut self) {
        self.forward.clear();
        self.reverse.clear();
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// All `(front, back)` pairs. Order is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (FrontNodeId, ComponentId)> + '_ {
        self.forward.iter().map(|(front, back)| (*front, *back))
    }
}

//! Line items chosen for a partial checkout.

use std::collections::BTreeSet;

use eazika_core::LineItemId;

/// Membership set of line-item ids marked for the next checkout.
///
/// Independent of the cart collection; the owner evicts ids the cart no
/// longer holds (see [`crate::session::CartSession`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSetManager {
    ids: BTreeSet<LineItemId>,
}

impl SelectionSetManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` if absent, remove it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, id: LineItemId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Replace the selection wholesale. An empty input clears it.
    pub fn bulk_set(&mut self, ids: impl IntoIterator<Item = LineItemId>) {
        self.ids = ids.into_iter().collect();
    }

    #[must_use]
    pub fn contains(&self, id: LineItemId) -> bool {
        self.ids.contains(&id)
    }

    /// Selected ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<LineItemId> {
        self.ids.iter().copied().collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Drop one id. Returns whether it was selected.
    pub fn evict(&mut self, id: LineItemId) -> bool {
        self.ids.remove(&id)
    }

    /// Keep only ids for which `present` holds.
    pub fn retain_only(&mut self, present: impl Fn(LineItemId) -> bool) {
        self.ids.retain(|id| present(*id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

//! Optimistic cart mutations.
//!
//! Each mutation is a [`CartCommand`]: `apply` edits the local collection
//! before the backend confirms, `rollback` undoes it from the snapshot taken
//! just before `apply` when the backend call fails.
//!
//! `Clear` is the one named exception: a failed clear keeps the cart empty
//! and is only logged.

use eazika_core::{CartLineItem, LineItemId};

use crate::error::CartError;

/// What happens to local state when the backend rejects a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollbackPolicy {
    /// Restore the exact snapshot taken before `apply`.
    RestoreSnapshot,
    /// Keep the optimistic state and only log the failure.
    KeepOptimistic,
}

/// A local mutation that is mirrored to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartCommand {
    /// Drop one line item.
    Remove(LineItemId),
    /// Set the quantity of one line item. `quantity` is already at least 1.
    SetQuantity { id: LineItemId, quantity: u32 },
    /// Drop every line item.
    Clear,
}

impl CartCommand {
    /// Short name used in logs and breadcrumbs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Remove(_) => "remove_from_cart",
            Self::SetQuantity { .. } => "update_quantity",
            Self::Clear => "clear_cart",
        }
    }

    /// Rollback behaviour of this command.
    #[must_use]
    pub const fn rollback_policy(&self) -> RollbackPolicy {
        match self {
            Self::Remove(_) | Self::SetQuantity { .. } => RollbackPolicy::RestoreSnapshot,
            Self::Clear => RollbackPolicy::KeepOptimistic,
        }
    }

    /// Apply the optimistic edit.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] if the command targets an item that
    /// is not in `items`; `items` is left untouched in that case.
    pub fn apply(&self, items: &mut Vec<CartLineItem>) -> Result<(), CartError> {
        match *self {
            Self::Remove(id) => {
                let position = items
                    .iter()
                    .position(|item| item.id == id)
                    .ok_or(CartError::ItemNotFound(id))?;
                items.remove(position);
            }
            Self::SetQuantity { id, quantity } => {
                let item = items
                    .iter_mut()
                    .find(|item| item.id == id)
                    .ok_or(CartError::ItemNotFound(id))?;
                item.quantity = quantity;
            }
            Self::Clear => items.clear(),
        }
        Ok(())
    }

    /// Undo `apply` after the backend rejected the command.
    ///
    /// Restores the whole snapshot rather than patching the one item, so the
    /// collection is exactly what it was before `apply`.
    pub fn rollback(&self, items: &mut Vec<CartLineItem>, snapshot: Vec<CartLineItem>) {
        match self.rollback_policy() {
            RollbackPolicy::RestoreSnapshot => *items = snapshot,
            RollbackPolicy::KeepOptimistic => {}
        }
    }

    /// Fold the backend's confirmed record into the collection.
    ///
    /// Only quantity updates return a record; it replaces the local copy so
    /// server-side timestamps and any adjusted quantity win.
    pub fn confirm(&self, items: &mut [CartLineItem], confirmed: Option<CartLineItem>) {
        let (Self::SetQuantity { id, .. }, Some(record)) = (self, confirmed) else {
            return;
        };
        if record.id != *id || record.quantity == 0 {
            return;
        }
        if let Some(item) = items.iter_mut().find(|item| item.id == *id) {
            *item = record;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::view::tests::line_item;

    fn cart() -> Vec<CartLineItem> {
        vec![line_item(1, 10, 2), line_item(2, 20, 1), line_item(3, 30, 5)]
    }

    #[test]
    fn test_remove_apply_and_rollback_restores_order() {
        let snapshot = cart();
        let mut items = snapshot.clone();
        let command = CartCommand::Remove(LineItemId::new(2));

        command.apply(&mut items).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.id != LineItemId::new(2)));

        command.rollback(&mut items, snapshot.clone());
        assert_eq!(items, snapshot);
    }

    #[test]
    fn test_set_quantity_apply_and_rollback() {
        let snapshot = cart();
        let mut items = snapshot.clone();
        let command = CartCommand::SetQuantity {
            id: LineItemId::new(3),
            quantity: 9,
        };

        command.apply(&mut items).unwrap();
        assert_eq!(items[2].quantity, 9);

        command.rollback(&mut items, snapshot.clone());
        assert_eq!(items, snapshot);
    }

    #[test]
    fn test_unknown_item_leaves_collection_untouched() {
        let mut items = cart();
        let err = CartCommand::Remove(LineItemId::new(99))
            .apply(&mut items)
            .unwrap_err();
        assert!(matches!(err, CartError::ItemNotFound(id) if id == LineItemId::new(99)));
        assert_eq!(items, cart());
    }

    #[test]
    fn test_clear_is_not_rolled_back() {
        let snapshot = cart();
        let mut items = snapshot.clone();
        CartCommand::Clear.apply(&mut items).unwrap();
        CartCommand::Clear.rollback(&mut items, snapshot);
        assert!(items.is_empty());
        assert_eq!(
            CartCommand::Clear.rollback_policy(),
            RollbackPolicy::KeepOptimistic
        );
    }

    #[test]
    fn test_confirm_replaces_updated_record() {
        let mut items = cart();
        let mut confirmed = line_item(1, 10, 4);
        confirmed.updated_at = confirmed.updated_at + chrono::Duration::minutes(1);

        CartCommand::SetQuantity {
            id: LineItemId::new(1),
            quantity: 4,
        }
        .confirm(&mut items, Some(confirmed.clone()));
        assert_eq!(items[0], confirmed);
    }

    #[test]
    fn test_confirm_ignores_mismatched_record() {
        let mut items = cart();
        CartCommand::SetQuantity {
            id: LineItemId::new(1),
            quantity: 4,
        }
        .confirm(&mut items, Some(line_item(2, 20, 8)));
        assert_eq!(items, cart());
    }
}

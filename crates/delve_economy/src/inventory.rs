//! # Inventory System
//!
//! Pre-allocated inventory slots for mined materials and crafted items.
//! All slots are allocated at creation time; add/consume never allocate.
//!
//! Snapshots survive stage regeneration: the director snapshots before a
//! stage is torn down and restores into the fresh session.

use delve_procedural::MaterialKind;

use crate::error::{EconomyError, EconomyResult};

/// Maximum inventory slots.
pub const MAX_INVENTORY_SLOTS: usize = 32;

/// Stack limit for raw materials.
pub const MATERIAL_STACK: u32 = 64;

/// Returns the stack limit for a kind. Crafted items do not stack.
#[inline]
#[must_use]
pub const fn max_stack(kind: MaterialKind) -> u32 {
    match kind {
        MaterialKind::IronSword | MaterialKind::DiamondSword | MaterialKind::FrostCharm => 1,
        _ => MATERIAL_STACK,
    }
}

/// A stack of items in an inventory slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ItemStack {
    /// The item kind, or `None` for an empty slot.
    pub kind: Option<MaterialKind>,
    /// Number of items in this stack.
    pub count: u32,
}

impl ItemStack {
    /// Creates an empty item stack.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self { kind: None, count: 0 }
    }

    /// Creates a new item stack.
    #[inline]
    #[must_use]
    pub const fn new(kind: MaterialKind, count: u32) -> Self {
        Self {
            kind: Some(kind),
            count,
        }
    }

    /// Returns true if this slot is empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0 || self.kind.is_none()
    }

    #[inline]
    fn holds(&self, kind: MaterialKind) -> bool {
        self.kind == Some(kind) && self.count > 0
    }

    #[inline]
    fn clear(&mut self) {
        *self = Self::empty();
    }
}

/// A pre-allocated inventory.
#[derive(Clone, Debug)]
pub struct Inventory {
    slots: [ItemStack; MAX_INVENTORY_SLOTS],
}

impl Inventory {
    /// Creates a new empty inventory with pre-allocated slots.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: [ItemStack::empty(); MAX_INVENTORY_SLOTS],
        }
    }

    /// Returns the number of used slots.
    #[must_use]
    pub fn used_slots(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }

    /// Returns true if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(ItemStack::is_empty)
    }

    /// Counts the total of one kind across all slots.
    #[must_use]
    pub fn count(&self, kind: MaterialKind) -> u32 {
        self.slots
            .iter()
            .filter(|s| s.holds(kind))
            .map(|s| s.count)
            .sum()
    }

    /// How many more of `kind` would fit.
    #[must_use]
    pub fn free_capacity(&self, kind: MaterialKind) -> u32 {
        let limit = max_stack(kind);
        self.slots
            .iter()
            .map(|s| {
                if s.is_empty() {
                    limit
                } else if s.holds(kind) {
                    limit.saturating_sub(s.count)
                } else {
                    0
                }
            })
            .fold(0u32, u32::saturating_add)
    }

    /// Adds items, topping up existing stacks before opening new slots.
    ///
    /// All-or-nothing: on failure the inventory is untouched.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InventoryFull` if the items do not fit.
    pub fn add(&mut self, kind: MaterialKind, count: u32) -> EconomyResult<()> {
        if count == 0 {
            return Ok(());
        }
        if self.free_capacity(kind) < count {
            return Err(EconomyError::InventoryFull {
                item: kind,
                amount: count,
            });
        }

        let limit = max_stack(kind);
        let mut remaining = count;

        for slot in self.slots.iter_mut().filter(|s| s.holds(kind)) {
            if remaining == 0 {
                break;
            }
            let can_add = limit.saturating_sub(slot.count).min(remaining);
            slot.count += can_add;
            remaining -= can_add;
        }

        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            if slot.is_empty() {
                let add_count = remaining.min(limit);
                *slot = ItemStack::new(kind, add_count);
                remaining -= add_count;
            }
        }

        Ok(())
    }

    /// Removes items.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::InsufficientMaterials` if not enough are held.
    pub fn remove(&mut self, kind: MaterialKind, count: u32) -> EconomyResult<()> {
        let available = self.count(kind);
        if available < count {
            return Err(EconomyError::InsufficientMaterials {
                item: kind,
                required: count,
                available,
            });
        }

        let mut remaining = count;
        for slot in &mut self.slots {
            if remaining == 0 {
                break;
            }
            if slot.holds(kind) {
                let remove_count = slot.count.min(remaining);
                slot.count -= remove_count;
                remaining -= remove_count;
                if slot.count == 0 {
                    slot.clear();
                }
            }
        }

        Ok(())
    }

    /// Consumes items if enough are held.
    ///
    /// Returns `false` and changes nothing when short.
    pub fn consume(&mut self, kind: MaterialKind, count: u32) -> bool {
        self.remove(kind, count).is_ok()
    }

    /// Lists every held kind with its total, in kind order.
    #[must_use]
    pub fn totals(&self) -> Vec<(MaterialKind, u32)> {
        let mut totals: Vec<(MaterialKind, u32)> = Vec::new();
        for slot in self.slots.iter().filter(|s| !s.is_empty()) {
            if let Some(kind) = slot.kind {
                match totals.iter_mut().find(|(k, _)| *k == kind) {
                    Some((_, total)) => *total += slot.count,
                    None => totals.push((kind, slot.count)),
                }
            }
        }
        totals.sort_by_key(|(kind, _)| *kind);
        totals
    }

    /// Creates a snapshot of the inventory for rollback or carry-over.
    #[must_use]
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot { slots: self.slots }
    }

    /// Restores inventory from a snapshot.
    pub fn restore(&mut self, snapshot: &InventorySnapshot) {
        self.slots = snapshot.slots;
    }
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of inventory state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InventorySnapshot {
    slots: [ItemStack; MAX_INVENTORY_SLOTS],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_items() {
        let mut inv = Inventory::new();
        inv.add(MaterialKind::Iron, 10).unwrap();
        assert_eq!(inv.count(MaterialKind::Iron), 10);
        assert_eq!(inv.used_slots(), 1);
    }

    #[test]
    fn test_add_stacking() {
        let mut inv = Inventory::new();
        inv.add(MaterialKind::Dirt, 64).unwrap();
        inv.add(MaterialKind::Dirt, 10).unwrap();
        assert_eq!(inv.count(MaterialKind::Dirt), 74);
        assert_eq!(inv.used_slots(), 2);
    }

    #[test]
    fn test_crafted_items_do_not_stack() {
        let mut inv = Inventory::new();
        inv.add(MaterialKind::IronSword, 3).unwrap();
        assert_eq!(inv.used_slots(), 3);
    }

    #[test]
    fn test_add_is_all_or_nothing() {
        let mut inv = Inventory::new();
        inv.add(MaterialKind::IronSword, MAX_INVENTORY_SLOTS as u32 - 1)
            .unwrap();

        let result = inv.add(MaterialKind::Stone, MATERIAL_STACK + 1);
        assert!(matches!(result, Err(EconomyError::InventoryFull { .. })));
        assert_eq!(inv.count(MaterialKind::Stone), 0, "failed add must not partially apply");
    }

    #[test]
    fn test_consume() {
        let mut inv = Inventory::new();
        inv.add(MaterialKind::Iron, 3).unwrap();

        assert!(inv.consume(MaterialKind::Iron, 2));
        assert_eq!(inv.count(MaterialKind::Iron), 1);
        assert!(!inv.consume(MaterialKind::Iron, 2), "short consume must fail");
        assert_eq!(inv.count(MaterialKind::Iron), 1, "failed consume changes nothing");
    }

    #[test]
    fn test_remove_insufficient() {
        let mut inv = Inventory::new();
        inv.add(MaterialKind::Gold, 10).unwrap();
        let result = inv.remove(MaterialKind::Gold, 20);
        assert!(matches!(result, Err(EconomyError::InsufficientMaterials { .. })));
    }

    #[test]
    fn test_snapshot_restore() {
        let mut inv = Inventory::new();
        inv.add(MaterialKind::Iron, 50).unwrap();

        let snapshot = inv.snapshot();

        inv.add(MaterialKind::Diamond, 30).unwrap();
        assert_eq!(inv.count(MaterialKind::Diamond), 30);

        inv.restore(&snapshot);
        assert_eq!(inv.count(MaterialKind::Diamond), 0);
        assert_eq!(inv.count(MaterialKind::Iron), 50);
    }

    #[test]
    fn test_totals_are_sorted() {
        let mut inv = Inventory::new();
        inv.add(MaterialKind::Diamond, 2).unwrap();
        inv.add(MaterialKind::Dirt, 70).unwrap();
        assert_eq!(
            inv.totals(),
            vec![(MaterialKind::Dirt, 70), (MaterialKind::Diamond, 2)]
        );
    }
}

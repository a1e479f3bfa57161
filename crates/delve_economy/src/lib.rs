//! # DELVE Economy System
//!
//! Inventory and crafting logic for the DELVE game.
//!
//! ## Design Principles
//!
//! 1. **Pre-allocated inventory** - fixed slots, no allocation on add/consume
//! 2. **Transactional crafting** - all-or-nothing item transformations
//! 3. **Receipts** - completed crafts are reported so stages can react
//! 4. **External configuration** - recipes come from TOML
//!
//! ## Example
//!
//! ```rust,ignore
//! use delve_economy::{CraftingGraph, Inventory, IRON_SWORD_RECIPE};
//!
//! let graph = CraftingGraph::standard();
//! let mut inventory = Inventory::new();
//! inventory.add(MaterialKind::Iron, 2)?;
//! let receipt = graph.craft(&mut inventory, IRON_SWORD_RECIPE)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod crafting;
pub mod error;
pub mod inventory;

pub use crafting::{
    CraftReceipt, CraftingGraph, Recipe, RecipeId, RecipeItem, DIAMOND_SWORD_RECIPE,
    FROST_CHARM_RECIPE, IRON_SWORD_RECIPE,
};
pub use error::{EconomyError, EconomyResult};
pub use inventory::{max_stack, Inventory, InventorySnapshot, ItemStack, MAX_INVENTORY_SLOTS};

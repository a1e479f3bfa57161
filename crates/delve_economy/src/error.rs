//! # Economy Error Types
//!
//! All errors that can occur in the inventory and crafting systems.

use delve_procedural::MaterialKind;
use thiserror::Error;

/// Errors that can occur in the economy system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    /// Attempted to craft with insufficient materials.
    #[error("insufficient materials: need {required} of {item:?}, have {available}")]
    InsufficientMaterials {
        /// The item that was missing.
        item: MaterialKind,
        /// The amount required.
        required: u32,
        /// The amount available.
        available: u32,
    },

    /// Recipe not found in the crafting graph.
    #[error("recipe not found: {0}")]
    RecipeNotFound(u32),

    /// Detected a cycle in the crafting graph (infinite resource generation).
    #[error("cycle detected in crafting graph at recipe {0}")]
    CycleDetected(u32),

    /// Inventory is full, cannot add more items.
    #[error("inventory full: cannot fit {amount} of {item:?}")]
    InventoryFull {
        /// Item that did not fit.
        item: MaterialKind,
        /// Amount tried to add.
        amount: u32,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for economy operations.
pub type EconomyResult<T> = Result<T, EconomyError>;

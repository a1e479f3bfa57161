//! # Procedural Error Types
//!
//! All errors that can occur while building a stage.

use thiserror::Error;

use crate::biome::MaterialKind;
use crate::world::Coordinate;

/// Errors that can occur during world generation and mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProceduralError {
    /// A biome references a material that has no block template.
    #[error("configuration error: biome '{biome}' references {material:?} which has no block template")]
    Configuration {
        /// Biome being generated.
        biome: String,
        /// The material that could not be resolved.
        material: MaterialKind,
    },

    /// World dimensions are unusable.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// A second block was placed at an already-claimed coordinate.
    #[error("coordinate {0:?} is already occupied")]
    DoubleOccupancy(Coordinate),

    /// A coordinate lies outside the generated volume.
    #[error("coordinate {0:?} is outside the world bounds")]
    OutOfBounds(Coordinate),
}

/// Result type for procedural operations.
pub type ProceduralResult<T> = Result<T, ProceduralError>;

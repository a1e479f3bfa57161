//! # DELVE Procedural Generation
//!
//! Deterministic stage generation for reproducible voxel worlds.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and offsets always produce the same stage
//! 2. **Fully occupied**: Every cell up to the column top holds terrain or fluid
//! 3. **Fail early**: Configuration errors abort before a single block is placed
//! 4. **Baked once**: Navigation is built exactly once per finished stage
//!
//! ## Core Components
//!
//! - `NoiseField`: seeded 2D/3D density sampling with frozen offsets
//! - `BiomeDescriptor`: surface, fluid and ore ladder for one stage
//! - `MaterialPalette`: block templates per material
//! - `WorldBuilder`: terrain pass, fluid pass, spawn point collection
//! - `VoxelWorld`: dense block storage with mining
//!
//! ## Example
//!
//! ```rust,ignore
//! use delve_procedural::{BiomeDescriptor, MaterialPalette, NoiseField, WorldBuilder, WorldConfig, WorldSeed};
//!
//! let config = WorldConfig::default();
//! let field = NoiseField::new(WorldSeed::new(42), config.terrain_scale, config.ore_scale);
//! let builder = WorldBuilder::new(config, BiomeDescriptor::meadow(), MaterialPalette::standard(), field);
//! let stage = builder.build(&mut navigator)?;
//! assert!(!stage.spawn_points.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]

pub mod biome;
pub mod error;
pub mod generator;
pub mod noise;
pub mod world;

pub use biome::{BiomeDescriptor, BlockTemplate, MaterialEntry, MaterialKind, MaterialPalette, OreRule};
pub use error::{ProceduralError, ProceduralResult};
pub use generator::{GeneratedWorld, NavigationBaker, WorldBuilder, WorldConfig};
pub use noise::{NoiseField, NoiseOffsets, SimplexNoise, WorldSeed, MIN_NOISE_SCALE};
pub use world::{
    Block, BlockDrop, Coordinate, MineOutcome, OccupancyMap, SpawnPointSet, VoxelWorld, WorldBounds,
};

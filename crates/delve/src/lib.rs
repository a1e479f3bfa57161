//! # DELVE
//!
//! Seeded voxel stages populated by hostile AI, run as a headless
//! tick-driven simulation.
//!
//! ## Layers
//!
//! - `navigation`: walkable-surface queries baked once per stage
//! - `spawn`: spawn point claiming with edge-safety correction
//! - `ai`: Idle/Trace/Attack/Flee machine, attack strategies, boss composition
//! - `director`: live counts, progression rules, stage regeneration
//! - `session`: the explicit world handle and background generation
//! - `simulation`: the tick loop tying it together
//!
//! ## Example
//!
//! ```rust,ignore
//! use delve::{GameConfig, Simulation};
//!
//! let mut sim = Simulation::new(GameConfig::default())?;
//! sim.wait_until_ready()?;
//! for _ in 0..600 {
//!     sim.tick(1.0 / 60.0)?;
//! }
//! println!("{} hostiles alive", sim.live_hostiles());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]

pub mod ai;
pub mod config;
pub mod director;
pub mod error;
pub mod events;
pub mod math;
pub mod navigation;
pub mod player;
pub mod session;
pub mod simulation;
pub mod spawn;
pub mod status;

pub use ai::{AiState, ArchetypeTable, DamageOutcome, EntityId, HostileEntity, HostileKind};
pub use config::GameConfig;
pub use director::{KillFilter, MapDirector, MapSession, ProgressionRule, StageConfig, StageOutcome};
pub use error::{ConfigError, DelveError, DelveResult, SpawnError};
pub use events::{EventBus, EventReceiver, EventSender, GameEvent};
pub use math::Vec3;
pub use navigation::{NavQuery, SurfaceNavigator};
pub use player::{Player, PlayerConfig};
pub use session::{GenerationJob, WorldSession};
pub use simulation::{HealthReadout, Simulation, Status, PLAYER_RADIUS};
pub use spawn::{ClaimMode, SpawnCoordinator, SpawnSettings};
pub use status::{StatusEffect, StatusEffects, StatusKind};

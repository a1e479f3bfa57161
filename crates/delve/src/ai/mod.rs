//! # Hostile AI
//!
//! Enum-dispatch state machine for hostiles, with attack strategies, death
//! hooks and summoning composed per kind.
//!
//! - `state`: states and the pure transition function
//! - `archetype`: stat blocks and per-kind composition config
//! - `strategy`: single strike and multi-head volley
//! - `summoner`: periodic minion summoning
//! - `entity`: the hostile itself

pub mod archetype;
pub mod entity;
pub mod state;
pub mod strategy;
pub mod summoner;

pub use archetype::{
    Archetype, ArchetypeTable, BossConfig, DeathHook, FleeDamagePolicy, HeadConfig, HostileKind,
    SummonerConfig,
};
pub use entity::{
    AiCommand, ArenaBounds, DamageOutcome, EntityId, HostileEntity, OUT_OF_BOUNDS_MARGIN,
};
pub use state::{next_state, AiState, Observation, Thresholds};
pub use strategy::{AttackStrategy, MultiHeadVolley, SingleStrike, Strike};
pub use summoner::MinionSummoner;

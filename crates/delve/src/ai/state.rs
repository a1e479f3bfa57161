//! # AI State Machine
//!
//! Pure transition function for hostile entities.
//!
//! ## Rules (checked in order, once per tick)
//!
//! 1. Health at or below `max * flee_threshold_ratio` and not fleeing → Flee
//!    (skipped while a retaliation window is open)
//! 2. Idle → Trace when distance < detection range
//! 3. Trace → Attack when distance < attack range
//! 4. Trace → Idle when distance > detection range
//! 5. Attack → Trace when distance > attack range
//! 6. Flee → Idle when distance ≥ flee stop distance
//!
//! Only the rule that belongs to the current state can fire, so at most one
//! of rules 2-6 applies per tick. Trace is left at exactly the distance it is
//! entered at: there is no hysteresis band.

use serde::{Deserialize, Serialize};

/// Behaviour state of a hostile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiState {
    /// Waiting for a target to come close.
    #[default]
    Idle,
    /// Moving toward the target.
    Trace,
    /// Striking the target.
    Attack,
    /// Running away at low health.
    Flee,
    /// Dead, waiting to be removed. Terminal.
    Dying,
}

impl AiState {
    /// Returns the lowercase state name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Trace => "trace",
            Self::Attack => "attack",
            Self::Flee => "flee",
            Self::Dying => "dying",
        }
    }

    /// Returns true for every state that still takes part in combat.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Dying)
    }
}

/// Distance and health thresholds driving transitions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    /// Idle → Trace below this distance.
    pub detection_range: f32,
    /// Trace → Attack below this distance.
    pub attack_range: f32,
    /// Flee → Idle at or beyond this distance.
    pub flee_stop_distance: f32,
    /// Fraction of max health at which the entity flees.
    pub flee_threshold_ratio: f32,
}

/// Inputs for one transition step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Observation {
    /// Distance to the target, `None` when there is no target.
    pub distance: Option<f32>,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
    /// True while a hit received during Flee suppresses the flee rule.
    pub retaliating: bool,
}

/// Computes the state for this tick.
#[must_use]
pub fn next_state(current: AiState, obs: Observation, t: &Thresholds) -> AiState {
    if current == AiState::Dying {
        return AiState::Dying;
    }

    let low_health = obs.health as f32 <= obs.max_health as f32 * t.flee_threshold_ratio;
    if low_health && current != AiState::Flee && !obs.retaliating {
        return AiState::Flee;
    }

    // Lost target: fail safe to Idle, reacquire on a later detection check
    let Some(distance) = obs.distance else {
        return AiState::Idle;
    };

    match current {
        AiState::Idle if distance < t.detection_range => AiState::Trace,
        AiState::Trace if distance < t.attack_range => AiState::Attack,
        AiState::Trace if distance > t.detection_range => AiState::Idle,
        AiState::Attack if distance > t.attack_range => AiState::Trace,
        AiState::Flee if distance >= t.flee_stop_distance => AiState::Idle,
        other => other,
    }
}

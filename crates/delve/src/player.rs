//! # Player
//!
//! The target every hostile tracks. Movement input comes from outside
//! (the runner or a test); this type only enforces speed and stun rules
//! and owns health and status effects.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;
use crate::navigation::NavQuery;
use crate::status::{StatusEffect, StatusEffects};

/// Player tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Starting and maximum health.
    pub max_health: u32,
    /// Walking speed (blocks per second).
    pub base_speed: f32,
    /// Multiplier while sprinting.
    pub sprint_multiplier: f32,
    /// Damage dealt per melee swing.
    pub attack_damage: u32,
    /// Reach of a melee swing.
    pub attack_reach: f32,
    /// Damage dealt to blocks per mining hit.
    pub mining_damage: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            base_speed: 5.0,
            sprint_multiplier: 1.6,
            attack_damage: 5,
            attack_reach: 3.0,
            mining_damage: 1,
        }
    }
}

/// The tracked target.
#[derive(Clone, Debug)]
pub struct Player {
    /// Feet position.
    pub position: Vec3,
    health: u32,
    config: PlayerConfig,
    effects: StatusEffects,
}

impl Player {
    /// Spawns a player at full health.
    #[must_use]
    pub fn new(position: Vec3, config: PlayerConfig) -> Self {
        Self {
            position,
            health: config.max_health,
            config,
            effects: StatusEffects::new(),
        }
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.config.max_health
    }

    /// Tuning this player was created with.
    #[must_use]
    pub const fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Returns true while health remains.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Active status effects.
    #[must_use]
    pub const fn effects(&self) -> &StatusEffects {
        &self.effects
    }

    /// Subtracts health. Returns what is left.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.health = self.health.saturating_sub(amount);
        self.health
    }

    /// Applies or refreshes a status effect.
    pub fn apply_effect(&mut self, effect: StatusEffect) -> bool {
        self.effects.apply(effect)
    }

    /// Current movement speed. The base speed is never modified.
    #[must_use]
    pub fn speed(&self, sprinting: bool) -> f32 {
        let sprint = if sprinting && self.effects.can_sprint() {
            self.config.sprint_multiplier
        } else {
            1.0
        };
        self.config.base_speed * sprint * self.effects.speed_multiplier()
    }

    /// Moves along a horizontal direction, staying on walkable ground.
    ///
    /// Returns false if the move was refused (stunned or blocked).
    pub fn walk<N: NavQuery + ?Sized>(&mut self, direction: Vec3, sprinting: bool, dt: f32, nav: &N) -> bool {
        let step = self.speed(sprinting) * dt.max(0.0);
        if step <= 0.0 {
            return false;
        }
        let wanted = self.position + direction.flat().normalized_or_zero() * step;
        let Some(next) = nav.ground_step(self.position, wanted) else {
            return false;
        };
        self.position = next;
        true
    }

    /// Advances status effects, applying poison damage.
    pub fn tick(&mut self, dt: f32) {
        let poison = self.effects.tick(dt);
        if poison > 0 {
            self.take_damage(poison);
        }
    }
}

//! # Status Effects
//!
//! Slow, Poison and Stun as tick-accumulated countdowns.
//!
//! ## Refresh Semantics
//!
//! Re-applying an effect of the same kind replaces its remaining duration
//! and magnitude. Effects never modify the holder's base stats, so expiry
//! always restores the original baseline and nothing compounds.
//!
//! While stunned, only another Stun can be applied.

use serde::{Deserialize, Serialize};

/// Seconds between poison damage ticks.
pub const POISON_INTERVAL: f32 = 1.0;

/// Slack absorbing float drift when countdowns are fed many small steps.
const TIMER_EPSILON: f32 = 1.0e-4;

/// A debuff to apply.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusEffect {
    /// Movement speed multiplied by `multiplier`; sprinting disabled.
    Slow {
        /// Speed multiplier in `(0, 1]`.
        multiplier: f32,
        /// Seconds.
        duration: f32,
    },
    /// Damage every [`POISON_INTERVAL`].
    Poison {
        /// Damage per interval.
        damage_per_tick: u32,
        /// Seconds.
        duration: f32,
    },
    /// No movement at all.
    Stun {
        /// Seconds.
        duration: f32,
    },
}

impl StatusEffect {
    /// Kind of this effect.
    #[must_use]
    pub const fn kind(&self) -> StatusKind {
        match self {
            Self::Slow { .. } => StatusKind::Slow,
            Self::Poison { .. } => StatusKind::Poison,
            Self::Stun { .. } => StatusKind::Stun,
        }
    }
}

/// Effect kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// Slow.
    Slow,
    /// Poison.
    Poison,
    /// Stun.
    Stun,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActiveSlow {
    multiplier: f32,
    remaining: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct ActivePoison {
    damage_per_tick: u32,
    remaining: f32,
    until_tick: f32,
}

/// Effects currently affecting one holder.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusEffects {
    slow: Option<ActiveSlow>,
    poison: Option<ActivePoison>,
    stun: Option<f32>,
}

impl StatusEffects {
    /// No active effects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies or refreshes an effect.
    ///
    /// Returns `false` if a stun blocked it.
    pub fn apply(&mut self, effect: StatusEffect) -> bool {
        if self.is_stunned() && effect.kind() != StatusKind::Stun {
            tracing::debug!(?effect, "effect blocked by stun");
            return false;
        }

        match effect {
            StatusEffect::Slow { multiplier, duration } => {
                self.slow = Some(ActiveSlow {
                    multiplier: multiplier.clamp(0.0, 1.0),
                    remaining: duration.max(0.0),
                });
            }
            StatusEffect::Poison {
                damage_per_tick,
                duration,
            } => {
                self.poison = Some(ActivePoison {
                    damage_per_tick,
                    remaining: duration.max(0.0),
                    until_tick: POISON_INTERVAL,
                });
            }
            StatusEffect::Stun { duration } => {
                self.stun = Some(duration.max(0.0));
            }
        }
        true
    }

    /// Advances every countdown by `dt` seconds.
    ///
    /// Returns the poison damage dealt during this step.
    pub fn tick(&mut self, dt: f32) -> u32 {
        let dt = dt.max(0.0);
        let mut damage = 0;

        if let Some(slow) = self.slow.as_mut() {
            slow.remaining -= dt;
            if slow.remaining <= TIMER_EPSILON {
                self.slow = None;
            }
        }

        if let Some(poison) = self.poison.as_mut() {
            let active = dt.min(poison.remaining.max(0.0));
            poison.remaining -= dt;
            poison.until_tick -= active;
            while poison.until_tick <= TIMER_EPSILON {
                damage += poison.damage_per_tick;
                poison.until_tick += POISON_INTERVAL;
            }
            if poison.remaining <= TIMER_EPSILON {
                self.poison = None;
            }
        }

        if let Some(stun) = self.stun.as_mut() {
            *stun -= dt;
            if *stun <= TIMER_EPSILON {
                self.stun = None;
            }
        }

        damage
    }

    /// Returns true while the given kind is active.
    #[must_use]
    pub fn has(&self, kind: StatusKind) -> bool {
        match kind {
            StatusKind::Slow => self.slow.is_some(),
            StatusKind::Poison => self.poison.is_some(),
            StatusKind::Stun => self.stun.is_some(),
        }
    }

    /// Returns true while stunned.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.stun.is_some()
    }

    /// Multiplier applied to the base speed.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        if self.is_stunned() {
            0.0
        } else {
            self.slow.map_or(1.0, |s| s.multiplier)
        }
    }

    /// Sprinting is disabled while slowed or stunned.
    #[must_use]
    pub fn can_sprint(&self) -> bool {
        self.slow.is_none() && self.stun.is_none()
    }

    /// Remaining seconds of an active effect.
    #[must_use]
    pub fn remaining(&self, kind: StatusKind) -> Option<f32> {
        match kind {
            StatusKind::Slow => self.slow.map(|s| s.remaining),
            StatusKind::Poison => self.poison.map(|p| p.remaining),
            StatusKind::Stun => self.stun,
        }
    }
}

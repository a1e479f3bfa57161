//! Periodic minion summoning, independent of the owner's AI state.

use crate::ai::archetype::{HostileKind, SummonerConfig};

/// Counts up while a target exists and fires once per interval.
#[derive(Clone, Debug, PartialEq)]
pub struct MinionSummoner {
    config: SummonerConfig,
    elapsed: f32,
}

impl MinionSummoner {
    /// Creates a summoner with an empty timer.
    #[must_use]
    pub const fn new(config: SummonerConfig) -> Self {
        Self { config, elapsed: 0.0 }
    }

    /// Spread around the owner.
    #[must_use]
    pub const fn range(&self) -> f32 {
        self.config.range
    }

    /// Kind summoned.
    #[must_use]
    pub const fn minion(&self) -> HostileKind {
        self.config.minion
    }

    /// Advances the timer. Returns true when a minion is due.
    ///
    /// The timer is frozen while there is no target.
    pub fn tick(&mut self, dt: f32, has_target: bool) -> bool {
        if !has_target || self.config.interval <= 0.0 {
            return false;
        }
        self.elapsed += dt.max(0.0);
        if self.elapsed >= self.config.interval {
            self.elapsed -= self.config.interval;
            return true;
        }
        false
    }
}

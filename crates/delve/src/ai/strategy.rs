//! # Attack Strategies
//!
//! Pluggable strike logic for the Attack state.
//!
//! Cooldowns are elapsed-time accumulators advanced every tick, whatever the
//! state, and only spent while attacking. A strategy that starts charged
//! strikes on the first Attack tick.

use crate::ai::archetype::HeadConfig;
use crate::status::StatusEffect;

/// A hit to deliver to the target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Strike {
    /// Damage dealt.
    pub damage: u32,
    /// Effect applied on hit.
    pub effect: Option<StatusEffect>,
}

/// One cooldown-gated attack.
#[derive(Clone, Debug, PartialEq)]
pub struct SingleStrike {
    strike: Strike,
    cooldown: f32,
    elapsed: f32,
}

impl SingleStrike {
    /// Creates a strike that is ready immediately.
    #[must_use]
    pub fn new(damage: u32, cooldown: f32, effect: Option<StatusEffect>) -> Self {
        let cooldown = cooldown.max(0.0);
        Self {
            strike: Strike { damage, effect },
            cooldown,
            elapsed: cooldown,
        }
    }

    /// Seconds until the next strike is allowed.
    #[must_use]
    pub fn time_until_ready(&self) -> f32 {
        (self.cooldown - self.elapsed).max(0.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Head {
    config: HeadConfig,
    elapsed: f32,
}

/// Several independent heads; any subset may fire in the same tick.
#[derive(Clone, Debug, PartialEq)]
pub struct MultiHeadVolley {
    heads: Vec<Head>,
}

impl MultiHeadVolley {
    /// Creates a volley, each head pre-charged by its `initial_charge`.
    #[must_use]
    pub fn new(heads: &[HeadConfig]) -> Self {
        Self {
            heads: heads
                .iter()
                .map(|config| Head {
                    elapsed: config.cooldown * config.initial_charge.clamp(0.0, 1.0),
                    config: config.clone(),
                })
                .collect(),
        }
    }

    /// Number of heads.
    #[must_use]
    pub fn head_count(&self) -> usize {
        self.heads.len()
    }
}

/// Attack logic attached to a hostile.
#[derive(Clone, Debug, PartialEq)]
pub enum AttackStrategy {
    /// One attack with one cooldown.
    Single(SingleStrike),
    /// Boss volley.
    Volley(MultiHeadVolley),
}

impl AttackStrategy {
    /// Advances every cooldown accumulator.
    pub fn advance(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        match self {
            Self::Single(single) => single.elapsed += dt,
            Self::Volley(volley) => {
                for head in &mut volley.heads {
                    head.elapsed += dt;
                }
            }
        }
    }

    /// Fires every ready attack, resetting its cooldown.
    pub fn fire(&mut self, out: &mut Vec<Strike>) {
        match self {
            Self::Single(single) => {
                if single.elapsed >= single.cooldown {
                    single.elapsed = 0.0;
                    out.push(single.strike);
                }
            }
            Self::Volley(volley) => {
                for head in &mut volley.heads {
                    if head.elapsed >= head.config.cooldown {
                        head.elapsed = 0.0;
                        tracing::debug!(head = %head.config.name, "volley");
                        out.push(Strike {
                            damage: head.config.damage,
                            effect: head.config.effect,
                        });
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::archetype::BossConfig;
    use crate::status::StatusKind::{Poison, Slow, Stun};

    #[test]
    fn test_first_strike_is_immediate() {
        let mut strategy = AttackStrategy::Single(SingleStrike::new(5, 1.5, None));
        let mut out = Vec::new();
        strategy.fire(&mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_cooldown_blocks_second_strike() {
        let mut strategy = AttackStrategy::Single(SingleStrike::new(5, 1.5, None));
        let mut out = Vec::new();

        strategy.fire(&mut out);
        strategy.advance(1.0);
        strategy.fire(&mut out);
        assert_eq!(out.len(), 1, "second strike inside the cooldown");

        strategy.advance(0.5);
        strategy.fire(&mut out);
        assert_eq!(out.len(), 2, "cooldown elapsed");
    }

    #[test]
    fn test_heads_fire_on_their_own_schedules() {
        let mut strategy = AttackStrategy::Volley(MultiHeadVolley::new(&BossConfig::default().heads));
        let mut fired_at = Vec::new();

        // 13 seconds at 0.5 s steps
        for step in 0..=26 {
            if step > 0 {
                strategy.advance(0.5);
            }
            let mut out = Vec::new();
            strategy.fire(&mut out);
            for strike in out {
                fired_at.push((step, strike.damage, strike.effect.map(|e| e.kind())));
            }
        }

        let schedule: Vec<_> = fired_at.iter().map(|&(step, _, kind)| (step, kind)).collect();
        assert_eq!(
            schedule,
            vec![
                (0, Some(Slow)),
                (8, Some(Poison)),
                (10, Some(Slow)),
                (20, Some(Slow)),
                (24, Some(Poison)),
                (24, Some(Stun)),
            ],
            "ice ready at once, poison half charged, stun starts empty"
        );
    }
}

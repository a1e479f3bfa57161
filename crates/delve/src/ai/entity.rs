//! # Hostile Entity
//!
//! Shared state-machine core plus composed parts: an attack strategy, a death
//! hook and an optional minion summoner. A boss is a hostile with a volley
//! strategy, a summoner and a delayed death hook; nothing in the core knows
//! about bosses.
//!
//! ## Tick Order
//!
//! 1. Dying entities do nothing
//! 2. Bounds check (out of bounds → [`AiCommand::OutOfBounds`], stop)
//! 3. Cooldowns, retaliation window and summoner advance
//! 4. One state transition
//! 5. Behaviour for the resulting state

use std::fmt;

use serde::{Deserialize, Serialize};

use delve_procedural::WorldConfig;

use crate::ai::archetype::{Archetype, ArchetypeTable, DeathHook, FleeDamagePolicy, HostileKind};
use crate::ai::state::{next_state, AiState, Observation};
use crate::ai::strategy::{AttackStrategy, MultiHeadVolley, SingleStrike, Strike};
use crate::ai::summoner::MinionSummoner;
use crate::math::Vec3;
use crate::navigation::NavQuery;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Slack around the stage before an entity counts as out of bounds.
pub const OUT_OF_BOUNDS_MARGIN: f32 = 4.0;

// ============================================================================
// IDENTITY AND BOUNDS
// ============================================================================

/// Unique hostile identifier within a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Region an entity must stay inside.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArenaBounds {
    min: Vec3,
    max: Vec3,
}

impl ArenaBounds {
    /// The stage extent widened by [`OUT_OF_BOUNDS_MARGIN`] on every side.
    #[must_use]
    pub fn from_config(config: &WorldConfig) -> Self {
        let m = OUT_OF_BOUNDS_MARGIN;
        Self {
            min: Vec3::new(-m, -(config.bedrock_depth as f32) - m, -m),
            max: Vec3::new(
                config.width as f32 + m,
                config.max_height as f32 + m,
                config.depth as f32 + m,
            ),
        }
    }

    /// Returns true if `p` is inside.
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.z >= self.min.z
            && p.x <= self.max.x
            && p.y <= self.max.y
            && p.z <= self.max.z
    }
}

// ============================================================================
// OUTPUTS
// ============================================================================

/// Requests a hostile hands back to the simulation after a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AiCommand {
    /// Deliver a hit to the target.
    Strike(Strike),
    /// Spawn a minion near `near`.
    Summon {
        /// Kind to spawn.
        kind: HostileKind,
        /// Centre of the spawn area.
        near: Vec3,
        /// Horizontal spread.
        range: f32,
    },
    /// The entity left the arena and must be replaced.
    OutOfBounds,
    /// The entity changed state this tick.
    StateChanged {
        /// Previous state.
        from: AiState,
        /// New state.
        to: AiState,
    },
}

/// Result of [`HostileEntity::take_damage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Already dying; the hit did nothing.
    Ignored,
    /// Still alive.
    Survived {
        /// Health left.
        remaining: u32,
    },
    /// Health reached zero on this hit.
    Killed,
}

// ============================================================================
// ENTITY
// ============================================================================

/// A hostile driven by the Idle/Trace/Attack/Flee machine.
#[derive(Clone, Debug)]
pub struct HostileEntity {
    id: EntityId,
    kind: HostileKind,
    state: AiState,
    position: Vec3,
    yaw: f32,
    health: u32,
    stats: Archetype,
    strategy: AttackStrategy,
    summoner: Option<MinionSummoner>,
    retaliation: f32,
}

impl HostileEntity {
    /// Assembles an entity from explicit parts.
    #[must_use]
    pub fn with_parts(
        id: EntityId,
        kind: HostileKind,
        position: Vec3,
        stats: Archetype,
        strategy: AttackStrategy,
        summoner: Option<MinionSummoner>,
    ) -> Self {
        Self {
            id,
            kind,
            state: AiState::Idle,
            position,
            yaw: 0.0,
            health: stats.max_health,
            stats,
            strategy,
            summoner,
            retaliation: 0.0,
        }
    }

    /// Builds a hostile of `kind` from the archetype table.
    #[must_use]
    pub fn spawn(id: EntityId, kind: HostileKind, position: Vec3, table: &ArchetypeTable) -> Self {
        let stats = table.get(kind).clone();
        let (strategy, summoner) = if kind.is_boss() {
            (
                AttackStrategy::Volley(MultiHeadVolley::new(&table.boss_attacks.heads)),
                Some(MinionSummoner::new(table.boss_attacks.summoner)),
            )
        } else {
            (
                AttackStrategy::Single(SingleStrike::new(stats.damage, stats.attack_cooldown, stats.on_hit)),
                None,
            )
        };
        Self::with_parts(id, kind, position, stats, strategy, summoner)
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Kind.
    #[must_use]
    pub const fn kind(&self) -> HostileKind {
        self.kind
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> AiState {
        self.state
    }

    /// Feet position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Places the entity without any navigation checks.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Facing in degrees (0 = +Z, 90 = +X).
    #[must_use]
    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.stats.max_health
    }

    /// Stat block.
    #[must_use]
    pub const fn stats(&self) -> &Archetype {
        &self.stats
    }

    /// Removal behaviour on death.
    #[must_use]
    pub const fn death_hook(&self) -> DeathHook {
        self.stats.death_hook
    }

    /// Attack logic.
    #[must_use]
    pub const fn strategy(&self) -> &AttackStrategy {
        &self.strategy
    }

    /// Returns true until the entity starts dying.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.state.is_active()
    }

    /// Advances the entity by `dt` seconds against an optional target.
    pub fn tick<N: NavQuery + ?Sized>(
        &mut self,
        dt: f32,
        target: Option<Vec3>,
        nav: &N,
        arena: &ArenaBounds,
        out: &mut Vec<AiCommand>,
    ) {
        if !self.state.is_active() {
            return;
        }

        if !arena.contains(self.position) {
            tracing::warn!(id = %self.id, kind = self.kind.name(), position = ?self.position, "hostile out of bounds");
            out.push(AiCommand::OutOfBounds);
            return;
        }

        let dt = dt.max(0.0);
        self.strategy.advance(dt);
        self.retaliation = (self.retaliation - dt).max(0.0);

        if let Some(summoner) = self.summoner.as_mut() {
            if summoner.tick(dt, target.is_some()) {
                out.push(AiCommand::Summon {
                    kind: summoner.minion(),
                    near: self.position,
                    range: summoner.range(),
                });
            }
        }

        let observation = Observation {
            distance: target.map(|t| self.position.distance(t)),
            health: self.health,
            max_health: self.stats.max_health,
            retaliating: self.retaliation > 0.0,
        };
        let next = next_state(self.state, observation, &self.stats.thresholds());
        if next != self.state {
            tracing::debug!(id = %self.id, from = self.state.name(), to = next.name(), "ai transition");
            out.push(AiCommand::StateChanged {
                from: self.state,
                to: next,
            });
            self.state = next;
        }

        let Some(target) = target else {
            return;
        };
        match self.state {
            AiState::Trace => {
                let toward = target - self.position;
                self.face(toward);
                self.step(toward, self.stats.move_speed, dt, nav);
            }
            AiState::Attack => {
                self.face(target - self.position);
                let mut strikes = Vec::new();
                self.strategy.fire(&mut strikes);
                out.extend(strikes.into_iter().map(AiCommand::Strike));
            }
            AiState::Flee => {
                let away = self.position - target;
                self.face(away);
                let speed = self.stats.move_speed * self.stats.flee_speed_multiplier;
                self.step(away, speed, dt, nav);
            }
            AiState::Idle | AiState::Dying => {}
        }
    }

    /// Applies damage.
    ///
    /// A hit while Idle provokes Trace. A hit while fleeing follows the
    /// archetype's [`FleeDamagePolicy`].
    pub fn take_damage(&mut self, amount: u32) -> DamageOutcome {
        if !self.state.is_active() {
            return DamageOutcome::Ignored;
        }

        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            tracing::info!(id = %self.id, kind = self.kind.name(), "hostile died");
            self.state = AiState::Dying;
            return DamageOutcome::Killed;
        }

        match (self.state, self.stats.flee_damage_policy) {
            (AiState::Idle, _) => self.state = AiState::Trace,
            (AiState::Flee, FleeDamagePolicy::Retaliate) => {
                self.state = AiState::Trace;
                self.retaliation = self.stats.retaliation_window;
            }
            _ => {}
        }

        DamageOutcome::Survived {
            remaining: self.health,
        }
    }

    fn face(&mut self, direction: Vec3) {
        let flat = direction.flat();
        if flat.length_squared() > f32::EPSILON {
            self.yaw = flat.yaw_degrees();
        }
    }

    /// Moves horizontally over walkable ground, sliding along walls and
    /// rises too steep to climb. Feet always end on the surface.
    fn step<N: NavQuery + ?Sized>(&mut self, direction: Vec3, speed: f32, dt: f32, nav: &N) {
        let distance = speed * dt;
        let direction = direction.flat().normalized_or_zero();
        if distance <= 0.0 || direction == Vec3::ZERO {
            return;
        }

        let from = self.position;
        let wanted = from + direction * distance;
        let next = nav.ground_step(from, wanted).or_else(|| {
            nav.sample_navigable(wanted, distance)
                .and_then(|slid| nav.ground_step(from, slid))
        });
        if let Some(next) = next {
            self.position = next;
        }
    }
}

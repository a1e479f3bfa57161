//! # Hostile Archetypes
//!
//! Stat blocks for each hostile kind. Defaults reproduce the tuning the game
//! shipped with; every value can be overridden from the game config.

use serde::{Deserialize, Serialize};

use crate::ai::state::Thresholds;
use crate::status::StatusEffect;

// ============================================================================
// KINDS
// ============================================================================

/// Kinds of hostile entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostileKind {
    /// Close-range brawler.
    Melee,
    /// Keeps its distance and slows on hit.
    Ranged,
    /// Stationary multi-head boss that summons minions.
    Boss,
}

impl HostileKind {
    /// Returns the lowercase kind name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Melee => "melee",
            Self::Ranged => "ranged",
            Self::Boss => "boss",
        }
    }

    /// Returns true for boss kinds.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(self, Self::Boss)
    }
}

/// What a hit received while fleeing does.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FleeDamagePolicy {
    /// Keep running.
    #[default]
    KeepFleeing,
    /// Turn on the attacker for `retaliation_window` seconds.
    Retaliate,
}

/// What happens after health reaches zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathHook {
    /// Removed on the tick it dies.
    #[default]
    Immediate,
    /// Stays in `Dying` until the death visual reports completion.
    AwaitVisualCompletion,
}

// ============================================================================
// STAT BLOCKS
// ============================================================================

/// Stats shared by every hostile kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    /// Starting and maximum health.
    pub max_health: u32,
    /// Damage per strike (single-strike attackers).
    pub damage: u32,
    /// Idle → Trace below this distance.
    pub detection_range: f32,
    /// Trace → Attack below this distance.
    pub attack_range: f32,
    /// Flee → Idle at or beyond this distance.
    pub flee_stop_distance: f32,
    /// Blocks per second.
    pub move_speed: f32,
    /// Seconds between strikes.
    pub attack_cooldown: f32,
    /// Speed multiplier while fleeing.
    pub flee_speed_multiplier: f32,
    /// Fraction of max health at which the entity flees.
    pub flee_threshold_ratio: f32,
    /// Physical radius, used for spawn edge margins.
    pub radius: f32,
    /// Effect applied to the target on every strike.
    pub on_hit: Option<StatusEffect>,
    /// Reaction to damage while fleeing.
    pub flee_damage_policy: FleeDamagePolicy,
    /// Seconds a retaliation suppresses the flee rule.
    pub retaliation_window: f32,
    /// Removal behaviour on death.
    pub death_hook: DeathHook,
}

impl Archetype {
    /// Close-range brawler.
    #[must_use]
    pub fn melee() -> Self {
        Self {
            max_health: 20,
            damage: 5,
            detection_range: 10.0,
            attack_range: 2.0,
            flee_stop_distance: 20.0,
            move_speed: 3.5,
            attack_cooldown: 1.5,
            flee_speed_multiplier: 1.5,
            flee_threshold_ratio: 0.2,
            radius: 0.5,
            on_hit: None,
            flee_damage_policy: FleeDamagePolicy::KeepFleeing,
            retaliation_window: 3.0,
            death_hook: DeathHook::Immediate,
        }
    }

    /// Fragile shooter whose hits slow.
    #[must_use]
    pub fn ranged() -> Self {
        Self {
            max_health: 5,
            damage: 3,
            detection_range: 15.0,
            attack_range: 6.0,
            move_speed: 2.0,
            on_hit: Some(StatusEffect::Slow {
                multiplier: 0.5,
                duration: 2.0,
            }),
            ..Self::melee()
        }
    }

    /// Stationary boss. Never flees; its strikes come from [`BossConfig::heads`].
    #[must_use]
    pub fn boss() -> Self {
        Self {
            max_health: 100,
            damage: 10,
            detection_range: 20.0,
            attack_range: 12.0,
            move_speed: 0.0,
            flee_threshold_ratio: 0.0,
            radius: 1.5,
            death_hook: DeathHook::AwaitVisualCompletion,
            ..Self::melee()
        }
    }

    /// Transition thresholds.
    #[must_use]
    pub const fn thresholds(&self) -> Thresholds {
        Thresholds {
            detection_range: self.detection_range,
            attack_range: self.attack_range,
            flee_stop_distance: self.flee_stop_distance,
            flee_threshold_ratio: self.flee_threshold_ratio,
        }
    }
}

/// One boss head: an independent attack with its own cooldown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadConfig {
    /// Name used in logs.
    pub name: String,
    /// Damage per volley.
    pub damage: u32,
    /// Seconds between volleys.
    pub cooldown: f32,
    /// Fraction of the cooldown already elapsed at spawn (1.0 = fires at once).
    #[serde(default)]
    pub initial_charge: f32,
    /// Effect carried by the volley.
    #[serde(default)]
    pub effect: Option<StatusEffect>,
}

/// Minion summoning cadence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummonerConfig {
    /// Seconds between summons.
    pub interval: f32,
    /// Horizontal spread around the boss.
    pub range: f32,
    /// Kind summoned.
    pub minion: HostileKind,
}

impl Default for SummonerConfig {
    fn default() -> Self {
        Self {
            interval: 15.0,
            range: 10.0,
            minion: HostileKind::Melee,
        }
    }
}

/// Boss composition on top of its stat block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossConfig {
    /// Attack heads, evaluated independently.
    pub heads: Vec<HeadConfig>,
    /// Minion summoning.
    pub summoner: SummonerConfig,
}

impl Default for BossConfig {
    fn default() -> Self {
        Self {
            heads: vec![
                HeadConfig {
                    name: "ice".into(),
                    damage: 10,
                    cooldown: 5.0,
                    initial_charge: 1.0,
                    effect: Some(StatusEffect::Slow {
                        multiplier: 0.5,
                        duration: 3.0,
                    }),
                },
                HeadConfig {
                    name: "poison".into(),
                    damage: 5,
                    cooldown: 8.0,
                    initial_charge: 0.5,
                    effect: Some(StatusEffect::Poison {
                        damage_per_tick: 2,
                        duration: 5.0,
                    }),
                },
                HeadConfig {
                    name: "stun".into(),
                    damage: 5,
                    cooldown: 12.0,
                    initial_charge: 0.0,
                    effect: Some(StatusEffect::Stun { duration: 1.5 }),
                },
            ],
            summoner: SummonerConfig::default(),
        }
    }
}

/// Stat blocks for every kind.
///
/// Config sections are partial: unset keys keep the defaults of that kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ArchetypeTableConfig")]
pub struct ArchetypeTable {
    /// Melee stats.
    pub melee: Archetype,
    /// Ranged stats.
    pub ranged: Archetype,
    /// Boss stats.
    pub boss: Archetype,
    /// Boss heads and summoner.
    pub boss_attacks: BossConfig,
}

impl Default for ArchetypeTable {
    fn default() -> Self {
        Self {
            melee: Archetype::melee(),
            ranged: Archetype::ranged(),
            boss: Archetype::boss(),
            boss_attacks: BossConfig::default(),
        }
    }
}

/// Partial stat block as written in a config file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct ArchetypePatch {
    max_health: Option<u32>,
    damage: Option<u32>,
    detection_range: Option<f32>,
    attack_range: Option<f32>,
    flee_stop_distance: Option<f32>,
    move_speed: Option<f32>,
    attack_cooldown: Option<f32>,
    flee_speed_multiplier: Option<f32>,
    flee_threshold_ratio: Option<f32>,
    radius: Option<f32>,
    on_hit: Option<StatusEffect>,
    flee_damage_policy: Option<FleeDamagePolicy>,
    retaliation_window: Option<f32>,
    death_hook: Option<DeathHook>,
}

impl ArchetypePatch {
    fn apply(self, mut base: Archetype) -> Archetype {
        macro_rules! patch {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field {
                    base.$field = value;
                })*
            };
        }
        patch!(
            max_health,
            damage,
            detection_range,
            attack_range,
            flee_stop_distance,
            move_speed,
            attack_cooldown,
            flee_speed_multiplier,
            flee_threshold_ratio,
            radius,
            flee_damage_policy,
            retaliation_window,
            death_hook,
        );
        if self.on_hit.is_some() {
            base.on_hit = self.on_hit;
        }
        base
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
struct ArchetypeTableConfig {
    melee: ArchetypePatch,
    ranged: ArchetypePatch,
    boss: ArchetypePatch,
    boss_attacks: BossConfig,
}

impl From<ArchetypeTableConfig> for ArchetypeTable {
    fn from(config: ArchetypeTableConfig) -> Self {
        Self {
            melee: config.melee.apply(Archetype::melee()),
            ranged: config.ranged.apply(Archetype::ranged()),
            boss: config.boss.apply(Archetype::boss()),
            boss_attacks: config.boss_attacks,
        }
    }
}

impl ArchetypeTable {
    /// Stats for a kind.
    #[must_use]
    pub const fn get(&self, kind: HostileKind) -> &Archetype {
        match kind {
            HostileKind::Melee => &self.melee,
            HostileKind::Ranged => &self.ranged,
            HostileKind::Boss => &self.boss,
        }
    }

    /// Checks every stat block for values the state machine cannot use.
    ///
    /// Every distance, speed, timer and ratio must be finite and
    /// non-negative.
    ///
    /// # Errors
    ///
    /// Returns a description of the first bad value.
    pub fn validate(&self) -> Result<(), String> {
        for kind in [HostileKind::Melee, HostileKind::Ranged, HostileKind::Boss] {
            let a = self.get(kind);
            let name = kind.name();
            if a.max_health == 0 {
                return Err(format!("{name}: max_health must be positive"));
            }
            non_negative(name, "detection_range", a.detection_range)?;
            non_negative(name, "attack_range", a.attack_range)?;
            non_negative(name, "flee_stop_distance", a.flee_stop_distance)?;
            non_negative(name, "move_speed", a.move_speed)?;
            non_negative(name, "attack_cooldown", a.attack_cooldown)?;
            non_negative(name, "flee_speed_multiplier", a.flee_speed_multiplier)?;
            non_negative(name, "radius", a.radius)?;
            non_negative(name, "retaliation_window", a.retaliation_window)?;
            if a.attack_range > a.detection_range {
                return Err(format!("{name}: attack_range exceeds detection_range"));
            }
            if !(0.0..1.0).contains(&a.flee_threshold_ratio) {
                return Err(format!("{name}: flee_threshold_ratio must be in [0, 1)"));
            }
            if let Some(effect) = a.on_hit {
                check_effect(name, effect)?;
            }
        }

        for head in &self.boss_attacks.heads {
            non_negative(&head.name, "cooldown", head.cooldown)?;
            if head.cooldown <= 0.0 {
                return Err(format!("boss head {} needs a positive cooldown", head.name));
            }
            if !(0.0..=1.0).contains(&head.initial_charge) {
                return Err(format!("boss head {}: initial_charge must be in [0, 1]", head.name));
            }
            if let Some(effect) = head.effect {
                check_effect(&head.name, effect)?;
            }
        }

        let summoner = self.boss_attacks.summoner;
        non_negative("summoner", "interval", summoner.interval)?;
        non_negative("summoner", "range", summoner.range)?;
        if summoner.interval <= 0.0 {
            return Err("summoner interval must be positive".into());
        }
        Ok(())
    }
}

fn non_negative(owner: &str, field: &str, value: f32) -> Result<(), String> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(format!("{owner}: {field} must be finite and non-negative, got {value}"))
    }
}

fn check_effect(owner: &str, effect: StatusEffect) -> Result<(), String> {
    match effect {
        StatusEffect::Slow { multiplier, duration } => {
            non_negative(owner, "slow multiplier", multiplier)?;
            non_negative(owner, "slow duration", duration)
        }
        StatusEffect::Poison { duration, .. } => non_negative(owner, "poison duration", duration),
        StatusEffect::Stun { duration } => non_negative(owner, "stun duration", duration),
    }
}

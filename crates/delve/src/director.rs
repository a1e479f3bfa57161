//! # Map Director
//!
//! Tracks the live hostile count of the active stage and decides when the
//! stage is cleared.
//!
//! ## Progression Rules
//!
//! - **Clear all**: the stage clears when the objective count (live hostiles
//!   matching the stage's kill filter) drops to zero, provided at least one
//!   objective hostile was ever registered.
//! - **Craft item**: the stage clears when a craft receipt contains the
//!   stage's trigger item.
//!
//! Either way the stage reports cleared exactly once. Out-of-bounds removals
//! lower the counts but never clear a stage.
//!
//! ## Transitions
//!
//! The inventory is snapshotted when the stage is torn down and restored once
//! the next stage is ready. The final stage yields [`StageOutcome::Victory`].

use serde::{Deserialize, Serialize};

use delve_economy::{CraftReceipt, Inventory, InventorySnapshot};
use delve_procedural::{BiomeDescriptor, MaterialKind, WorldSeed};

use crate::ai::HostileKind;

/// Which deaths count toward a clear-all objective.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillFilter {
    /// Every hostile.
    #[default]
    Any,
    /// Only bosses; minions do not block progression.
    BossesOnly,
}

impl KillFilter {
    /// Returns true if `kind` counts toward the objective.
    #[must_use]
    pub const fn matches(self, kind: HostileKind) -> bool {
        match self {
            Self::Any => true,
            Self::BossesOnly => kind.is_boss(),
        }
    }
}

/// How a stage is cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProgressionRule {
    /// Kill every objective hostile.
    ClearAll {
        /// Which hostiles count.
        #[serde(default)]
        filter: KillFilter,
    },
    /// Craft the trigger item.
    CraftItem {
        /// Item whose craft clears the stage.
        item: MaterialKind,
    },
}

/// One stage of the campaign.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StageConfig {
    /// Terrain for the stage.
    pub biome: BiomeDescriptor,
    /// Clear condition.
    pub rule: ProgressionRule,
    /// Hostiles spawned when the stage becomes ready.
    #[serde(default)]
    pub roster: Vec<HostileKind>,
}

impl StageConfig {
    /// The three-stage campaign the game ships with.
    #[must_use]
    pub fn campaign() -> Vec<Self> {
        vec![
            Self {
                biome: BiomeDescriptor::meadow(),
                rule: ProgressionRule::ClearAll {
                    filter: KillFilter::Any,
                },
                roster: vec![HostileKind::Melee, HostileKind::Melee, HostileKind::Ranged],
            },
            Self {
                biome: BiomeDescriptor::ashlands(),
                rule: ProgressionRule::CraftItem {
                    item: MaterialKind::FrostCharm,
                },
                roster: vec![HostileKind::Melee, HostileKind::Ranged, HostileKind::Ranged],
            },
            Self {
                biome: BiomeDescriptor::frost_lair(),
                rule: ProgressionRule::ClearAll {
                    filter: KillFilter::BossesOnly,
                },
                roster: vec![HostileKind::Boss, HostileKind::Melee],
            },
        ]
    }
}

/// What a cleared stage leads to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    /// Load the stage at this index.
    Advance {
        /// Next stage index.
        next: usize,
    },
    /// The final stage was cleared.
    Victory,
}

/// Live counters for the active stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapSession {
    /// Active stage index.
    pub stage: usize,
    /// Active biome name.
    pub biome: String,
    /// Hostiles alive (not dying, not removed).
    pub live: u32,
    /// Live hostiles matching the kill filter.
    pub objective: u32,
    /// Clear condition.
    pub rule: ProgressionRule,
    objective_seen: bool,
    cleared: bool,
}

impl MapSession {
    fn new(stage: usize, config: &StageConfig) -> Self {
        Self {
            stage,
            biome: config.biome.name.clone(),
            live: 0,
            objective: 0,
            rule: config.rule,
            objective_seen: false,
            cleared: false,
        }
    }

    /// Returns true once the stage has reported cleared.
    #[must_use]
    pub const fn is_cleared(&self) -> bool {
        self.cleared
    }

    fn filter(&self) -> Option<KillFilter> {
        match self.rule {
            ProgressionRule::ClearAll { filter } => Some(filter),
            ProgressionRule::CraftItem { .. } => None,
        }
    }

    fn counts(&self, kind: HostileKind) -> bool {
        self.filter().map_or(false, |f| f.matches(kind))
    }
}

/// Orchestrates stage order and progression.
#[derive(Clone, Debug)]
pub struct MapDirector {
    stages: Vec<StageConfig>,
    seed: WorldSeed,
    session: MapSession,
    carried: Option<InventorySnapshot>,
    finished: bool,
}

impl MapDirector {
    /// Starts at stage 0. Returns `None` for an empty campaign.
    #[must_use]
    pub fn new(stages: Vec<StageConfig>, seed: WorldSeed) -> Option<Self> {
        let session = MapSession::new(0, stages.first()?);
        Some(Self {
            stages,
            seed,
            session,
            carried: None,
            finished: false,
        })
    }

    /// Active counters.
    #[must_use]
    pub const fn session(&self) -> &MapSession {
        &self.session
    }

    /// Active stage config.
    #[must_use]
    pub fn current_stage(&self) -> &StageConfig {
        &self.stages[self.session.stage]
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Returns true after victory.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Generation seed for a stage. Stage 0 uses the session seed itself.
    #[must_use]
    pub const fn stage_seed(&self, stage: usize) -> WorldSeed {
        if stage == 0 {
            self.seed
        } else {
            self.seed.derive(stage as u64)
        }
    }

    /// Counts a newly spawned hostile.
    pub fn register_spawn(&mut self, kind: HostileKind) {
        self.session.live += 1;
        if self.session.counts(kind) {
            self.session.objective += 1;
            self.session.objective_seen = true;
        }
    }

    /// Handles a death. Returns the outcome if this death cleared the stage.
    pub fn on_death(&mut self, kind: HostileKind) -> Option<StageOutcome> {
        self.release(kind);
        if self.session.counts(kind) && self.session.objective_seen && self.session.objective == 0 {
            return self.clear();
        }
        None
    }

    /// Handles an out-of-bounds removal. Never clears the stage.
    pub fn on_out_of_bounds(&mut self, kind: HostileKind) {
        self.release(kind);
    }

    /// Handles a completed craft.
    pub fn on_craft(&mut self, receipt: &CraftReceipt) -> Option<StageOutcome> {
        match self.session.rule {
            ProgressionRule::CraftItem { item } if receipt.produced(item) => self.clear(),
            _ => None,
        }
    }

    /// Snapshots the inventory ahead of regeneration.
    pub fn begin_transition(&mut self, inventory: &Inventory) {
        self.carried = Some(inventory.snapshot());
    }

    /// Moves to `next`, resets counters and restores the carried inventory.
    pub fn finish_transition(&mut self, next: usize, inventory: &mut Inventory) {
        let next = next.min(self.stages.len() - 1);
        self.session = MapSession::new(next, &self.stages[next]);
        if let Some(snapshot) = self.carried.take() {
            inventory.restore(&snapshot);
        }
        tracing::info!(stage = next, biome = %self.session.biome, "stage entered");
    }

    fn release(&mut self, kind: HostileKind) {
        self.session.live = self.session.live.saturating_sub(1);
        if self.session.counts(kind) {
            self.session.objective = self.session.objective.saturating_sub(1);
        }
    }

    fn clear(&mut self) -> Option<StageOutcome> {
        if self.session.cleared || self.finished {
            return None;
        }
        self.session.cleared = true;

        let next = self.session.stage + 1;
        let outcome = if next < self.stages.len() {
            StageOutcome::Advance { next }
        } else {
            self.finished = true;
            StageOutcome::Victory
        };
        tracing::info!(stage = self.session.stage, biome = %self.session.biome, ?outcome, "stage cleared");
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_economy::{CraftingGraph, FROST_CHARM_RECIPE, IRON_SWORD_RECIPE};

    fn director() -> MapDirector {
        MapDirector::new(StageConfig::campaign(), WorldSeed::new(42)).unwrap()
    }

    #[test]
    fn test_clear_all_fires_exactly_once() {
        let mut director = director();
        director.register_spawn(HostileKind::Melee);
        director.register_spawn(HostileKind::Ranged);

        assert_eq!(director.on_death(HostileKind::Melee), None);
        assert_eq!(director.on_death(HostileKind::Ranged), Some(StageOutcome::Advance { next: 1 }));
        assert_eq!(director.session().live, 0);

        director.register_spawn(HostileKind::Melee);
        assert_eq!(director.on_death(HostileKind::Melee), None, "already cleared");
    }

    #[test]
    fn test_empty_stage_does_not_clear() {
        let mut director = director();
        assert_eq!(director.on_death(HostileKind::Melee), None);
        assert!(!director.session().is_cleared());
    }

    #[test]
    fn test_out_of_bounds_never_clears() {
        let mut director = director();
        director.register_spawn(HostileKind::Melee);
        director.on_out_of_bounds(HostileKind::Melee);
        assert_eq!(director.session().live, 0);
        assert!(!director.session().is_cleared());

        director.register_spawn(HostileKind::Melee);
        assert_eq!(director.on_death(HostileKind::Melee), Some(StageOutcome::Advance { next: 1 }));
    }

    #[test]
    fn test_craft_rule() {
        let mut director = director();
        let mut inventory = Inventory::new();
        director.begin_transition(&inventory);
        director.finish_transition(1, &mut inventory);

        let graph = CraftingGraph::standard();
        inventory.add(MaterialKind::Iron, 2).unwrap();
        let sword = graph.craft(&mut inventory, IRON_SWORD_RECIPE).unwrap();
        assert_eq!(director.on_craft(&sword), None);

        inventory.add(MaterialKind::Obsidian, 2).unwrap();
        inventory.add(MaterialKind::Gold, 1).unwrap();
        let charm = graph.craft(&mut inventory, FROST_CHARM_RECIPE).unwrap();
        assert_eq!(director.on_craft(&charm), Some(StageOutcome::Advance { next: 2 }));
        assert_eq!(director.on_craft(&charm), None);
    }

    #[test]
    fn test_bosses_only_ignores_minions() {
        let mut director = director();
        let mut inventory = Inventory::new();
        director.finish_transition(2, &mut inventory);

        director.register_spawn(HostileKind::Boss);
        director.register_spawn(HostileKind::Melee);
        director.register_spawn(HostileKind::Melee);
        assert_eq!(director.session().objective, 1);

        assert_eq!(director.on_death(HostileKind::Melee), None);
        assert_eq!(director.on_death(HostileKind::Boss), Some(StageOutcome::Victory));
        assert!(director.is_finished());
        assert_eq!(director.session().live, 1, "minion still alive");
    }

    #[test]
    fn test_transition_carries_inventory() {
        let mut director = director();
        let mut inventory = Inventory::new();
        inventory.add(MaterialKind::Diamond, 3).unwrap();

        director.begin_transition(&inventory);
        let mut fresh = Inventory::new();
        director.finish_transition(1, &mut fresh);

        assert_eq!(fresh.count(MaterialKind::Diamond), 3);
        assert_eq!(director.session().stage, 1);
        assert_eq!(director.session().biome, "ashlands");
    }

    #[test]
    fn test_stage_seeds() {
        let director = director();
        assert_eq!(director.stage_seed(0), WorldSeed::new(42));
        assert_ne!(director.stage_seed(1), director.stage_seed(2));
    }
}

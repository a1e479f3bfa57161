//! # Game Configuration
//!
//! Everything tunable, loaded once from TOML. Every section has a default,
//! so an empty file is the built-in campaign.
//!
//! ```toml
//! seed = 7
//!
//! [world]
//! width = 32
//! depth = 32
//!
//! [[stages]]
//! rule = { kind = "clear_all", filter = "any" }
//! roster = ["melee", "ranged"]
//! [stages.biome]
//! name = "meadow"
//! surface = "grass"
//! fluid = "water"
//! default_material = "dirt"
//! ores = [{ threshold = 0.7, material = "iron" }]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use delve_economy::{CraftingGraph, EconomyResult, Recipe};
use delve_procedural::{MaterialEntry, MaterialPalette, WorldConfig, WorldSeed};

use crate::ai::ArchetypeTable;
use crate::director::StageConfig;
use crate::error::ConfigError;
use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::player::PlayerConfig;
use crate::spawn::SpawnSettings;

/// Top-level game configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Session seed.
    pub seed: u64,
    /// Stage dimensions.
    pub world: WorldConfig,
    /// Player tuning.
    pub player: PlayerConfig,
    /// Spawn retries.
    pub spawn: SpawnSettings,
    /// Block templates. Empty selects the standard palette.
    pub materials: Vec<MaterialEntry>,
    /// Campaign, in order.
    pub stages: Vec<StageConfig>,
    /// Hostile stat blocks.
    pub archetypes: ArchetypeTable,
    /// Recipes. Empty selects the standard graph.
    pub recipes: Vec<Recipe>,
    /// Event channel capacity.
    pub event_capacity: usize,
    /// Generate stages on a worker thread. Off runs generation inline on
    /// the next tick, which makes tick-for-tick replays exact.
    pub background_generation: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: WorldSeed::default().value(),
            world: WorldConfig::default(),
            player: PlayerConfig::default(),
            spawn: SpawnSettings::default(),
            materials: Vec::new(),
            stages: StageConfig::campaign(),
            archetypes: ArchetypeTable::default(),
            recipes: Vec::new(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            background_generation: true,
        }
    }
}

impl GameConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML and
    /// `ConfigError::Invalid` for unusable values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`GameConfig::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "loading config");
        Self::from_toml_str(&source)
    }

    /// Checks everything that can be checked before a stage is generated.
    ///
    /// Biome materials are checked at generation time against the palette.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.world
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.stages.is_empty() {
            return Err(ConfigError::Invalid("at least one stage is required".into()));
        }
        self.archetypes.validate().map_err(ConfigError::Invalid)?;
        if self.player.max_health == 0 {
            return Err(ConfigError::Invalid("player max_health must be positive".into()));
        }
        let player = self.player;
        for (field, value) in [
            ("base_speed", player.base_speed),
            ("sprint_multiplier", player.sprint_multiplier),
            ("attack_reach", player.attack_reach),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "player {field} must be finite and non-negative"
                )));
            }
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid("event_capacity must be positive".into()));
        }
        for recipe in &self.recipes {
            recipe
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }

    /// Session seed.
    #[must_use]
    pub const fn world_seed(&self) -> WorldSeed {
        WorldSeed::new(self.seed)
    }

    /// Block templates for generation.
    #[must_use]
    pub fn palette(&self) -> MaterialPalette {
        if self.materials.is_empty() {
            MaterialPalette::standard()
        } else {
            MaterialPalette::from_entries(&self.materials)
        }
    }

    /// Recipe graph.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::CycleDetected` if the recipes form a cycle.
    pub fn crafting(&self) -> EconomyResult<CraftingGraph> {
        if self.recipes.is_empty() {
            Ok(CraftingGraph::standard())
        } else {
            CraftingGraph::from_recipes(self.recipes.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::HostileKind;
    use crate::director::{KillFilter, ProgressionRule};
    use delve_procedural::MaterialKind;

    #[test]
    fn test_empty_document_is_default_campaign() {
        let config = GameConfig::from_toml_str("").unwrap();
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.stages.len(), 3);
    }

    #[test]
    fn test_parses_stage_overrides() {
        let config = GameConfig::from_toml_str(
            r#"
            seed = 7

            [world]
            width = 32
            depth = 24

            [[stages]]
            rule = { kind = "clear_all", filter = "bosses_only" }
            roster = ["boss", "melee"]
            [stages.biome]
            name = "crypt"
            surface = "stone"
            fluid = "lava"
            default_material = "stone"
            ores = [{ threshold = 0.7, material = "gold" }]

            [[stages]]
            rule = { kind = "craft_item", item = "frost_charm" }
            [stages.biome]
            name = "vault"
            surface = "snow"
            fluid = "water"
            default_material = "ice"
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.world.width, 32);
        assert_eq!(config.world.max_height, WorldConfig::default().max_height, "unset keys keep defaults");
        assert_eq!(config.stages.len(), 2);
        assert_eq!(
            config.stages[0].rule,
            ProgressionRule::ClearAll {
                filter: KillFilter::BossesOnly
            }
        );
        assert_eq!(config.stages[0].roster, vec![HostileKind::Boss, HostileKind::Melee]);
        assert_eq!(
            config.stages[1].rule,
            ProgressionRule::CraftItem {
                item: MaterialKind::FrostCharm
            }
        );
        assert!(config.stages[1].roster.is_empty());
    }

    #[test]
    fn test_archetype_override() {
        let config = GameConfig::from_toml_str(
            r#"
            [archetypes.melee]
            max_health = 40
            flee_damage_policy = "retaliate"
            "#,
        )
        .unwrap();
        assert_eq!(config.archetypes.melee.max_health, 40);
        assert!((config.archetypes.melee.move_speed - 3.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_rejects_bad_values() {
        let result = GameConfig::from_toml_str("[world]\nwidth = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = GameConfig::from_toml_str("stages = []\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = GameConfig::from_toml_str("seed = \"nope\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_rejects_negative_summoner_range() {
        let result = GameConfig::from_toml_str(
            r#"
            [archetypes.boss_attacks.summoner]
            range = -1.0
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = GameConfig::from_toml_str("[archetypes.boss]
detection_range = nan
");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = GameConfig::from_toml_str("[player]
base_speed = inf
");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_recipes_from_config() {
        let config = GameConfig::from_toml_str(
            r#"
            [[recipes]]
            id = 7
            name = "ice_blade"
            inputs = [{ item = "ice", quantity = 3 }]
            outputs = [{ item = "iron_sword", quantity = 1 }]
            "#,
        )
        .unwrap();
        let graph = config.crafting().unwrap();
        assert_eq!(graph.recipe_count(), 1);
        assert_eq!(graph.recipe_for(MaterialKind::IronSword).map(|r| r.id), Some(7));

        let broken = GameConfig::from_toml_str("[[recipes]]\nid = \"x\"\n");
        assert!(matches!(broken, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_custom_materials_replace_palette() {
        let config = GameConfig::from_toml_str(
            r#"
            [[materials]]
            kind = "dirt"
            hit_points = 2
            "#,
        )
        .unwrap();
        let palette = config.palette();
        assert_eq!(palette.len(), 1);
        assert!(palette.template(MaterialKind::Grass).is_none());
    }
}

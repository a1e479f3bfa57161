//! # Materials and Biomes
//!
//! Every block and item the game knows is a [`MaterialKind`]. Placeable
//! kinds have a [`BlockTemplate`] in the [`MaterialPalette`]; crafted kinds
//! never do.
//!
//! A [`BiomeDescriptor`] picks the surface, fluid and subsurface materials
//! for one stage. Subsurface blocks walk a threshold ladder on the ore
//! density: the highest threshold strictly exceeded wins, regardless of the
//! order the rules were declared in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ProceduralError, ProceduralResult};

/// Every block and item kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MaterialKind {
    /// Soil.
    Dirt = 1,
    /// Surface cover for temperate stages.
    Grass = 2,
    /// Plain rock.
    Stone = 3,
    /// Loose surface cover for arid stages.
    Sand = 4,
    /// Surface cover for cold stages.
    Snow = 5,
    /// Frozen subsurface block.
    Ice = 6,
    /// Fluid.
    Water = 7,
    /// Fluid.
    Lava = 8,
    /// Common ore.
    Iron = 9,
    /// Mid-tier ore.
    Gold = 10,
    /// Rare ore.
    Diamond = 11,
    /// Volcanic rock.
    Obsidian = 12,
    /// Crafted weapon.
    IronSword = 13,
    /// Crafted weapon.
    DiamondSword = 14,
    /// Crafted stage key.
    FrostCharm = 15,
}

impl MaterialKind {
    /// Returns the stable byte id of this kind (never 0).
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Returns the config/display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dirt => "dirt",
            Self::Grass => "grass",
            Self::Stone => "stone",
            Self::Sand => "sand",
            Self::Snow => "snow",
            Self::Ice => "ice",
            Self::Water => "water",
            Self::Lava => "lava",
            Self::Iron => "iron",
            Self::Gold => "gold",
            Self::Diamond => "diamond",
            Self::Obsidian => "obsidian",
            Self::IronSword => "iron_sword",
            Self::DiamondSword => "diamond_sword",
            Self::FrostCharm => "frost_charm",
        }
    }
}

/// Static properties shared by every block of one material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTemplate {
    /// Hit points a fresh block starts with.
    pub hit_points: u32,
    /// Whether mining damages this block at all.
    pub mineable: bool,
    /// How many of this material one depleted block yields.
    pub drop_count: u32,
}

impl BlockTemplate {
    /// Creates a mineable template.
    #[inline]
    #[must_use]
    pub const fn mineable(hit_points: u32, drop_count: u32) -> Self {
        Self {
            hit_points,
            mineable: true,
            drop_count,
        }
    }

    /// Creates a template for fluids: non-mineable, no drop.
    #[inline]
    #[must_use]
    pub const fn fluid() -> Self {
        Self {
            hit_points: 1,
            mineable: false,
            drop_count: 0,
        }
    }
}

/// One `[[materials]]` entry in a config file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialEntry {
    /// Material this entry describes.
    pub kind: MaterialKind,
    /// Starting hit points.
    pub hit_points: u32,
    /// Whether the block can be mined.
    #[serde(default = "default_mineable")]
    pub mineable: bool,
    /// Drop count on depletion.
    #[serde(default = "default_drop")]
    pub drop_count: u32,
}

fn default_mineable() -> bool {
    true
}

fn default_drop() -> u32 {
    1
}

/// Registry of block templates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialPalette {
    templates: HashMap<MaterialKind, BlockTemplate>,
}

impl MaterialPalette {
    /// Creates an empty palette.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock palette every built-in stage draws from.
    #[must_use]
    pub fn standard() -> Self {
        let mut palette = Self::new();
        palette.insert(MaterialKind::Dirt, BlockTemplate::mineable(3, 1));
        palette.insert(MaterialKind::Grass, BlockTemplate::mineable(3, 1));
        palette.insert(MaterialKind::Stone, BlockTemplate::mineable(4, 1));
        palette.insert(MaterialKind::Sand, BlockTemplate::mineable(2, 1));
        palette.insert(MaterialKind::Snow, BlockTemplate::mineable(2, 1));
        palette.insert(MaterialKind::Ice, BlockTemplate::mineable(4, 1));
        palette.insert(MaterialKind::Iron, BlockTemplate::mineable(5, 1));
        palette.insert(MaterialKind::Gold, BlockTemplate::mineable(6, 1));
        palette.insert(MaterialKind::Diamond, BlockTemplate::mineable(10, 1));
        palette.insert(MaterialKind::Obsidian, BlockTemplate::mineable(12, 1));
        palette.insert(MaterialKind::Water, BlockTemplate::fluid());
        palette.insert(MaterialKind::Lava, BlockTemplate::fluid());
        palette
    }

    /// Builds a palette from config entries. Later entries override earlier ones.
    #[must_use]
    pub fn from_entries(entries: &[MaterialEntry]) -> Self {
        let mut palette = Self::new();
        for entry in entries {
            palette.insert(
                entry.kind,
                BlockTemplate {
                    hit_points: entry.hit_points,
                    mineable: entry.mineable,
                    drop_count: entry.drop_count,
                },
            );
        }
        palette
    }

    /// Registers or replaces a template.
    pub fn insert(&mut self, kind: MaterialKind, template: BlockTemplate) {
        self.templates.insert(kind, template);
    }

    /// Looks up a template.
    #[inline]
    #[must_use]
    pub fn template(&self, kind: MaterialKind) -> Option<&BlockTemplate> {
        self.templates.get(&kind)
    }

    /// Number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns true if no templates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// One rung of the subsurface threshold ladder.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OreRule {
    /// Density that must be strictly exceeded.
    pub threshold: f64,
    /// Material placed when this rung wins.
    pub material: MaterialKind,
}

impl OreRule {
    /// Creates a ladder rung.
    #[inline]
    #[must_use]
    pub const fn new(threshold: f64, material: MaterialKind) -> Self {
        Self { threshold, material }
    }
}

/// Materials used by one stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeDescriptor {
    /// Stage name used in logs and events.
    pub name: String,
    /// Top block of every column.
    pub surface: MaterialKind,
    /// Fill for unoccupied cells at or below the fluid level.
    pub fluid: MaterialKind,
    /// Subsurface threshold ladder, any declaration order.
    #[serde(default)]
    pub ores: Vec<OreRule>,
    /// Subsurface material when no rung is exceeded.
    pub default_material: MaterialKind,
}

impl BiomeDescriptor {
    /// Temperate stage: grass over dirt with iron and diamond veins.
    #[must_use]
    pub fn meadow() -> Self {
        Self {
            name: "meadow".to_string(),
            surface: MaterialKind::Grass,
            fluid: MaterialKind::Water,
            ores: vec![
                OreRule::new(0.65, MaterialKind::Iron),
                OreRule::new(0.75, MaterialKind::Diamond),
            ],
            default_material: MaterialKind::Dirt,
        }
    }

    /// Volcanic stage: sand over stone, lava pools.
    #[must_use]
    pub fn ashlands() -> Self {
        Self {
            name: "ashlands".to_string(),
            surface: MaterialKind::Sand,
            fluid: MaterialKind::Lava,
            ores: vec![
                OreRule::new(0.58, MaterialKind::Iron),
                OreRule::new(0.68, MaterialKind::Gold),
                OreRule::new(0.76, MaterialKind::Obsidian),
            ],
            default_material: MaterialKind::Stone,
        }
    }

    /// Cold stage hosting the boss.
    #[must_use]
    pub fn frost_lair() -> Self {
        Self {
            name: "frost_lair".to_string(),
            surface: MaterialKind::Snow,
            fluid: MaterialKind::Water,
            ores: vec![
                OreRule::new(0.62, MaterialKind::Ice),
                OreRule::new(0.74, MaterialKind::Diamond),
            ],
            default_material: MaterialKind::Stone,
        }
    }

    /// Picks the subsurface material for a density sample.
    ///
    /// The highest threshold strictly below `density` wins; with no such
    /// rung the default material is used.
    #[must_use]
    pub fn select_material(&self, density: f64) -> MaterialKind {
        self.ores
            .iter()
            .filter(|rule| density > rule.threshold)
            .max_by(|a, b| a.threshold.total_cmp(&b.threshold))
            .map_or(self.default_material, |rule| rule.material)
    }

    /// Every material this biome may place.
    pub fn referenced_materials(&self) -> impl Iterator<Item = MaterialKind> + '_ {
        [self.surface, self.fluid, self.default_material]
            .into_iter()
            .chain(self.ores.iter().map(|rule| rule.material))
    }

    /// Checks that every referenced material has a template.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::Configuration`] naming the first material
    /// without a template.
    pub fn validate(&self, palette: &MaterialPalette) -> ProceduralResult<()> {
        match self
            .referenced_materials()
            .find(|kind| palette.template(*kind).is_none())
        {
            Some(material) => Err(ProceduralError::Configuration {
                biome: self.name.clone(),
                material,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> BiomeDescriptor {
        BiomeDescriptor {
            name: "ladder".to_string(),
            surface: MaterialKind::Grass,
            fluid: MaterialKind::Water,
            // Declared lowest-first on purpose
            ores: vec![
                OreRule::new(0.4, MaterialKind::Stone),
                OreRule::new(0.65, MaterialKind::Iron),
                OreRule::new(0.75, MaterialKind::Diamond),
            ],
            default_material: MaterialKind::Dirt,
        }
    }

    #[test]
    fn test_highest_threshold_wins() {
        let biome = ladder();
        assert_eq!(biome.select_material(0.9), MaterialKind::Diamond);
        assert_eq!(biome.select_material(0.7), MaterialKind::Iron);
        assert_eq!(biome.select_material(0.6), MaterialKind::Stone);
        assert_eq!(biome.select_material(0.1), MaterialKind::Dirt);
    }

    #[test]
    fn test_threshold_must_be_exceeded() {
        let biome = ladder();
        assert_eq!(
            biome.select_material(0.75),
            MaterialKind::Iron,
            "Equal to a threshold does not exceed it"
        );
        assert_eq!(biome.select_material(0.4), MaterialKind::Dirt);
    }

    #[test]
    fn test_missing_template_is_configuration_error() {
        let mut biome = BiomeDescriptor::meadow();
        biome.surface = MaterialKind::IronSword;

        let err = biome.validate(&MaterialPalette::standard());
        assert_eq!(
            err,
            Err(ProceduralError::Configuration {
                biome: "meadow".to_string(),
                material: MaterialKind::IronSword,
            })
        );
    }

    #[test]
    fn test_builtin_biomes_validate() {
        let palette = MaterialPalette::standard();
        for biome in [
            BiomeDescriptor::meadow(),
            BiomeDescriptor::ashlands(),
            BiomeDescriptor::frost_lair(),
        ] {
            assert!(biome.validate(&palette).is_ok(), "{} should validate", biome.name);
        }
    }

    #[test]
    fn test_fluids_are_not_mineable() {
        let palette = MaterialPalette::standard();
        for fluid in [MaterialKind::Water, MaterialKind::Lava] {
            let template = palette.template(fluid).copied();
            assert_eq!(template, Some(BlockTemplate::fluid()));
        }
    }

    #[test]
    fn test_palette_from_entries_overrides() {
        let palette = MaterialPalette::from_entries(&[
            MaterialEntry { kind: MaterialKind::Dirt, hit_points: 3, mineable: true, drop_count: 1 },
            MaterialEntry { kind: MaterialKind::Dirt, hit_points: 9, mineable: true, drop_count: 2 },
        ]);
        assert_eq!(palette.len(), 1);
        assert_eq!(palette.template(MaterialKind::Dirt).map(|t| t.hit_points), Some(9));
    }
}

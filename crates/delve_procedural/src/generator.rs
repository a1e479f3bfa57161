//! # World Builder
//!
//! Turns a noise field, a biome and a material palette into a fully
//! occupied stage plus its spawn points.
//!
//! ## Passes
//!
//! 1. **Terrain**: one column per `(x, z)`. Column height is
//!    `clamp(floor(sample_2d · max_height), 1, max_height)`. The top cell is
//!    the biome surface; cells below it walk the ore ladder on `sample_3d`.
//!    A surface above the fluid level records the cell above it as a spawn point.
//! 2. **Fluid**: every unclaimed cell in `[0, fluid_level]` becomes fluid.
//! 3. **Bake**: the navigation baker runs exactly once on the finished stage.
//!
//! ## Coverage
//!
//! Each column is filled without gaps from `-bedrock_depth` up to
//! `max(height - 1, fluid_level)`.

use serde::{Deserialize, Serialize};

use crate::biome::{BiomeDescriptor, MaterialKind, MaterialPalette};
use crate::error::{ProceduralError, ProceduralResult};
use crate::noise::{NoiseField, NoiseOffsets};
use crate::world::{Coordinate, SpawnPointSet, VoxelWorld, WorldBounds};

/// Stage dimensions and noise scales.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Columns along x.
    pub width: u32,
    /// Columns along z.
    pub depth: u32,
    /// Tallest possible column.
    pub max_height: u32,
    /// Highest y filled with fluid.
    pub fluid_level: u32,
    /// Layers below y = 0.
    pub bedrock_depth: u32,
    /// Terrain noise scale (larger = smoother).
    pub terrain_scale: f64,
    /// Ore noise scale.
    pub ore_scale: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 20,
            depth: 20,
            max_height: 16,
            fluid_level: 5,
            bedrock_depth: 3,
            terrain_scale: 20.0,
            ore_scale: 10.0,
        }
    }
}

impl WorldConfig {
    /// Checks the dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidDimensions`] for empty stages or a
    /// fluid level that would drown every column.
    pub fn validate(&self) -> ProceduralResult<()> {
        if self.width == 0 || self.depth == 0 {
            return Err(ProceduralError::InvalidDimensions(format!(
                "stage must have columns, got {}x{}",
                self.width, self.depth
            )));
        }
        if self.max_height == 0 {
            return Err(ProceduralError::InvalidDimensions(
                "max height must be positive".to_string(),
            ));
        }
        if self.fluid_level >= self.max_height {
            return Err(ProceduralError::InvalidDimensions(format!(
                "fluid level {} must be below max height {}",
                self.fluid_level, self.max_height
            )));
        }
        let column_span = self.max_height.checked_add(self.bedrock_depth);
        if i32::try_from(self.width).is_err()
            || i32::try_from(self.depth).is_err()
            || column_span.map_or(true, |span| i32::try_from(span).is_err())
        {
            return Err(ProceduralError::InvalidDimensions(
                "dimensions exceed the coordinate range".to_string(),
            ));
        }
        Ok(())
    }

    /// Extent of the generated volume.
    #[must_use]
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds {
            width: self.width,
            depth: self.depth,
            min_y: -(self.bedrock_depth as i32),
            max_y: (self.max_height - 1).max(self.fluid_level) as i32,
        }
    }
}

/// Consumer of a finished stage, typically a navigation mesh baker.
pub trait NavigationBaker {
    /// Builds navigation data for the stage.
    fn bake(&mut self, world: &GeneratedWorld);
}

/// Output of one generation run.
#[derive(Clone, Debug)]
pub struct GeneratedWorld {
    /// Config the stage was built from.
    pub config: WorldConfig,
    /// Biome name.
    pub biome: String,
    /// Fluid material of the biome.
    pub fluid: MaterialKind,
    /// Noise offsets used.
    pub offsets: NoiseOffsets,
    /// Block storage.
    pub world: VoxelWorld,
    /// Safe spawn coordinates.
    pub spawn_points: SpawnPointSet,
    heights: Vec<u32>,
}

impl GeneratedWorld {
    /// Terrain column height (number of terrain cells above y = -1).
    #[must_use]
    pub fn column_height(&self, x: u32, z: u32) -> Option<u32> {
        if x >= self.config.width || z >= self.config.depth {
            return None;
        }
        self.heights
            .get((x * self.config.depth + z) as usize)
            .copied()
    }

    /// Number of blocks the coverage invariant requires.
    #[must_use]
    pub fn expected_block_count(&self) -> usize {
        let bedrock = self.config.bedrock_depth as usize;
        let fluid_top = self.config.fluid_level as usize + 1;
        self.heights
            .iter()
            .map(|&h| bedrock + (h as usize).max(fluid_top))
            .sum()
    }
}

/// Builds stages.
///
/// # Example
///
/// ```rust,ignore
/// let field = NoiseField::new(WorldSeed::new(42), 20.0, 10.0);
/// let builder = WorldBuilder::new(WorldConfig::default(), BiomeDescriptor::meadow(),
///     MaterialPalette::standard(), field);
/// let stage = builder.build(&mut navigator)?;
/// ```
#[derive(Clone)]
pub struct WorldBuilder {
    config: WorldConfig,
    biome: BiomeDescriptor,
    palette: MaterialPalette,
    field: NoiseField,
}

impl WorldBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new(
        config: WorldConfig,
        biome: BiomeDescriptor,
        palette: MaterialPalette,
        field: NoiseField,
    ) -> Self {
        Self {
            config,
            biome,
            palette,
            field,
        }
    }

    /// Returns the stage config.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns the biome.
    #[must_use]
    pub const fn biome(&self) -> &BiomeDescriptor {
        &self.biome
    }

    /// Generates and bakes a stage.
    ///
    /// The baker runs exactly once, after both passes succeed.
    ///
    /// # Errors
    ///
    /// See [`WorldBuilder::generate`].
    pub fn build<B: NavigationBaker + ?Sized>(&self, baker: &mut B) -> ProceduralResult<GeneratedWorld> {
        let generated = self.generate()?;
        baker.bake(&generated);
        Ok(generated)
    }

    /// Runs the terrain and fluid passes without baking.
    ///
    /// # Errors
    ///
    /// Fails before placing anything if the dimensions are invalid or the
    /// biome references a material without a template.
    pub fn generate(&self) -> ProceduralResult<GeneratedWorld> {
        self.config.validate()?;
        self.biome.validate(&self.palette)?;

        let bounds = self.config.bounds();
        let mut world = VoxelWorld::new(bounds);
        let mut spawn_points = SpawnPointSet::new();
        let mut heights = Vec::with_capacity((self.config.width * self.config.depth) as usize);

        let max_height = self.config.max_height;
        let fluid_level = self.config.fluid_level as i32;

        for x in 0..self.config.width as i32 {
            for z in 0..self.config.depth as i32 {
                let sample = self.field.sample_2d(f64::from(x), f64::from(z));
                let height = ((sample * f64::from(max_height)).floor() as u32).clamp(1, max_height);
                heights.push(height);

                let surface_y = height as i32 - 1;
                for y in bounds.min_y..=surface_y {
                    let c = Coordinate::new(x, y, z);
                    let material = if y == surface_y {
                        if y > fluid_level {
                            spawn_points.insert(c.above());
                        }
                        self.biome.surface
                    } else {
                        let density = self.field.sample_3d(f64::from(x), f64::from(y), f64::from(z));
                        self.biome.select_material(density)
                    };
                    self.place(&mut world, c, material)?;
                }
            }
        }

        for x in 0..self.config.width as i32 {
            for z in 0..self.config.depth as i32 {
                for y in 0..=fluid_level {
                    let c = Coordinate::new(x, y, z);
                    if !world.occupancy().contains(c) {
                        self.place(&mut world, c, self.biome.fluid)?;
                    }
                }
            }
        }

        tracing::info!(
            biome = %self.biome.name,
            blocks = world.occupancy().len(),
            spawn_points = spawn_points.len(),
            "stage generated"
        );

        Ok(GeneratedWorld {
            config: self.config,
            biome: self.biome.name.clone(),
            fluid: self.biome.fluid,
            offsets: self.field.offsets(),
            world,
            spawn_points,
            heights,
        })
    }

    fn place(&self, world: &mut VoxelWorld, c: Coordinate, material: MaterialKind) -> ProceduralResult<()> {
        let template = self
            .palette
            .template(material)
            .ok_or_else(|| ProceduralError::Configuration {
                biome: self.biome.name.clone(),
                material,
            })?;
        world.place(c, material, template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::WorldSeed;

    struct CountingBaker {
        calls: usize,
    }

    impl NavigationBaker for CountingBaker {
        fn bake(&mut self, _world: &GeneratedWorld) {
            self.calls += 1;
        }
    }

    fn builder(seed: u64, biome: BiomeDescriptor) -> WorldBuilder {
        let config = WorldConfig::default();
        let field = NoiseField::new(WorldSeed::new(seed), config.terrain_scale, config.ore_scale);
        WorldBuilder::new(config, biome, MaterialPalette::standard(), field)
    }

    #[test]
    fn test_coverage_exactly_one_block_per_cell() {
        let stage = builder(42, BiomeDescriptor::meadow()).generate().expect("generate");
        let config = stage.config;

        for x in 0..config.width {
            for z in 0..config.depth {
                let h = stage.column_height(x, z).expect("column");
                let top = (h as i32 - 1).max(config.fluid_level as i32);
                for y in -(config.bedrock_depth as i32)..=top {
                    let c = Coordinate::new(x as i32, y, z as i32);
                    assert!(stage.world.block(c).is_some(), "gap at {c:?}");
                }
                for y in (top + 1)..=stage.world.bounds().max_y {
                    let c = Coordinate::new(x as i32, y, z as i32);
                    assert!(stage.world.block(c).is_none(), "air expected at {c:?}");
                }
            }
        }

        assert_eq!(stage.world.occupancy().len(), stage.expected_block_count());
        assert_eq!(stage.world.block_count(), stage.expected_block_count());
    }

    #[test]
    fn test_spawn_points_sit_on_dry_surface() {
        let stage = builder(42, BiomeDescriptor::meadow()).generate().expect("generate");
        assert!(!stage.spawn_points.is_empty(), "default stage should have dry land");

        for point in stage.spawn_points.iter() {
            assert!(point.y > stage.config.fluid_level as i32, "{point:?} is not above fluid");
            let below = Coordinate::new(point.x, point.y - 1, point.z);
            let block = stage.world.block(below).expect("surface block under spawn point");
            assert_eq!(block.material, MaterialKind::Grass);
            assert!(stage.world.block(point).is_none(), "spawn cell must be empty");
        }
    }

    #[test]
    fn test_fluid_fills_low_cells() {
        let stage = builder(7, BiomeDescriptor::ashlands()).generate().expect("generate");
        for block in stage.world.blocks() {
            if block.material == MaterialKind::Lava {
                assert!(block.coordinate.y >= 0);
                assert!(block.coordinate.y <= stage.config.fluid_level as i32);
                assert!(!block.mineable);
                assert_eq!(block.drop_count, 0);
            }
        }
    }

    #[test]
    fn test_same_seed_same_layout() {
        let a = builder(42, BiomeDescriptor::meadow()).generate().expect("a");
        let b = builder(42, BiomeDescriptor::meadow()).generate().expect("b");
        assert_eq!(a.world.layout_bytes(), b.world.layout_bytes());
        assert_eq!(a.spawn_points, b.spawn_points);
    }

    #[test]
    fn test_build_bakes_exactly_once() {
        let mut baker = CountingBaker { calls: 0 };
        builder(3, BiomeDescriptor::meadow())
            .build(&mut baker)
            .expect("build");
        assert_eq!(baker.calls, 1);
    }

    #[test]
    fn test_missing_template_aborts_before_baking() {
        let mut biome = BiomeDescriptor::meadow();
        biome.ores.push(crate::biome::OreRule::new(0.9, MaterialKind::DiamondSword));
        let mut baker = CountingBaker { calls: 0 };

        let result = builder(3, biome).build(&mut baker);
        assert!(matches!(result, Err(ProceduralError::Configuration { .. })));
        assert_eq!(baker.calls, 0, "a failed stage must not be baked");
    }

    #[test]
    fn test_rejects_drowned_stage() {
        let config = WorldConfig {
            fluid_level: 16,
            ..WorldConfig::default()
        };
        assert!(matches!(config.validate(), Err(ProceduralError::InvalidDimensions(_))));
    }

    #[test]
    fn test_rejects_overflowing_column_span() {
        let config = WorldConfig {
            bedrock_depth: u32::MAX,
            ..WorldConfig::default()
        };
        assert!(matches!(config.validate(), Err(ProceduralError::InvalidDimensions(_))));
    }

    #[test]
    fn test_stage_described_in_toml_generates() {
        #[derive(Deserialize)]
        struct StageFile {
            world: WorldConfig,
            biome: BiomeDescriptor,
        }

        let file: StageFile = toml::from_str(
            r#"
            [world]
            width = 12
            depth = 10

            [biome]
            name = "quarry"
            surface = "stone"
            fluid = "water"
            default_material = "stone"
            ores = [{ threshold = 0.6, material = "gold" }]
            "#,
        )
        .expect("parse");

        assert_eq!(file.world.max_height, WorldConfig::default().max_height, "unset keys keep defaults");
        let field = NoiseField::new(WorldSeed::new(5), file.world.terrain_scale, file.world.ore_scale);
        let stage = WorldBuilder::new(file.world, file.biome, MaterialPalette::standard(), field)
            .generate()
            .expect("generate");
        assert_eq!(stage.biome, "quarry");
        assert_eq!(stage.world.block_count(), stage.expected_block_count());
    }
}

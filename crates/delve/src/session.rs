//! # World Session
//!
//! Explicit handle to the active stage: the generated world, its baked
//! navigator, its spawn coordinator and the arena bounds. The simulation
//! passes it to everything that needs the world instead of reaching for a
//! global "current map".
//!
//! ## Background Generation
//!
//! [`GenerationJob`] runs the terrain and fluid passes on a worker thread and
//! hands the finished stage back over a bounded crossbeam channel. Nothing
//! observes a stage until it has arrived; navigation is then baked once on
//! the simulation thread.

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, TryRecvError};

use delve_procedural::{
    Coordinate, GeneratedWorld, MineOutcome, NavigationBaker, ProceduralResult, WorldBuilder,
    WorldSeed,
};

use crate::ai::ArenaBounds;
use crate::error::{DelveError, DelveResult, SpawnError};
use crate::math::Vec3;
use crate::navigation::SurfaceNavigator;
use crate::spawn::{ClaimMode, SpawnCoordinator, SpawnSettings};

/// The active stage and its collaborators.
#[derive(Debug)]
pub struct WorldSession {
    stage_index: usize,
    stage: GeneratedWorld,
    navigator: SurfaceNavigator,
    spawns: SpawnCoordinator,
    arena: ArenaBounds,
}

impl WorldSession {
    /// Builds a stage synchronously, baking navigation once.
    ///
    /// # Errors
    ///
    /// Propagates generation failures.
    pub fn build(
        builder: &WorldBuilder,
        stage_index: usize,
        seed: WorldSeed,
        settings: SpawnSettings,
    ) -> ProceduralResult<Self> {
        let mut navigator = SurfaceNavigator::new();
        let stage = builder.build(&mut navigator)?;
        Ok(Self::assemble(stage, navigator, stage_index, seed, settings))
    }

    /// Wraps a stage generated elsewhere, baking navigation once.
    #[must_use]
    pub fn from_generated(
        stage: GeneratedWorld,
        stage_index: usize,
        seed: WorldSeed,
        settings: SpawnSettings,
    ) -> Self {
        let mut navigator = SurfaceNavigator::new();
        navigator.bake(&stage);
        Self::assemble(stage, navigator, stage_index, seed, settings)
    }

    fn assemble(
        stage: GeneratedWorld,
        navigator: SurfaceNavigator,
        stage_index: usize,
        seed: WorldSeed,
        settings: SpawnSettings,
    ) -> Self {
        let spawns = SpawnCoordinator::new(stage.spawn_points.clone(), seed, settings);
        let arena = ArenaBounds::from_config(&stage.config);
        Self {
            stage_index,
            stage,
            navigator,
            spawns,
            arena,
        }
    }

    /// Stage index in the campaign.
    #[must_use]
    pub const fn stage_index(&self) -> usize {
        self.stage_index
    }

    /// Biome name.
    #[must_use]
    pub fn biome(&self) -> &str {
        &self.stage.biome
    }

    /// The generated stage.
    #[must_use]
    pub const fn stage(&self) -> &GeneratedWorld {
        &self.stage
    }

    /// Navigation snapshot taken when the stage was generated.
    #[must_use]
    pub const fn navigator(&self) -> &SurfaceNavigator {
        &self.navigator
    }

    /// Region hostiles must stay inside.
    #[must_use]
    pub const fn arena(&self) -> &ArenaBounds {
        &self.arena
    }

    /// Spawn points left in the pool.
    #[must_use]
    pub fn remaining_spawns(&self) -> usize {
        self.spawns.remaining()
    }

    /// Claims and safety-corrects a spawn position.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError::NoValidSpawn` if no safe position was found.
    pub fn spawn(&mut self, mode: ClaimMode, entity_radius: f32) -> Result<Vec3, SpawnError> {
        self.spawns.spawn(&self.navigator, mode, entity_radius)
    }

    /// Places an entity near `position`, safety-corrected.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError::NoValidSpawn` if no safe position was found.
    pub fn place_near(&self, position: Vec3, radius: f32, entity_radius: f32) -> Result<Vec3, SpawnError> {
        self.spawns
            .place_safely(&self.navigator, position, radius, entity_radius)
    }

    /// Mines a block. Navigation is not rebuilt.
    ///
    /// # Errors
    ///
    /// Returns `ProceduralError::OutOfBounds` outside the stage.
    pub fn mine(&mut self, coordinate: Coordinate, damage: u32) -> ProceduralResult<MineOutcome> {
        self.stage.world.mine(coordinate, damage)
    }
}

/// A stage being generated.
pub struct GenerationJob {
    stage_index: usize,
    seed: WorldSeed,
    receiver: Receiver<ProceduralResult<GeneratedWorld>>,
}

impl GenerationJob {
    /// Starts generating.
    ///
    /// With `background` the passes run on a worker thread; otherwise they run
    /// now and the result is waiting on the channel.
    #[must_use]
    pub fn start(stage_index: usize, seed: WorldSeed, builder: WorldBuilder, background: bool) -> Self {
        let (sender, receiver) = bounded(1);
        let builder = Arc::new(builder);

        let spawned = background.then(|| {
            let sender = sender.clone();
            let builder = Arc::clone(&builder);
            thread::Builder::new()
                .name(format!("stage-gen-{stage_index}"))
                .spawn(move || {
                    // The receiver may be gone if the simulation was dropped
                    let _ = sender.send(builder.generate());
                })
        });

        match spawned {
            Some(Ok(_)) => {}
            Some(Err(err)) => {
                tracing::warn!(%err, stage = stage_index, "generation thread unavailable, generating inline");
                let _ = sender.send(builder.generate());
            }
            None => {
                let _ = sender.send(builder.generate());
            }
        }

        Self {
            stage_index,
            seed,
            receiver,
        }
    }

    /// Stage being generated.
    #[must_use]
    pub const fn stage_index(&self) -> usize {
        self.stage_index
    }

    /// Seed the stage is generated with.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Returns the stage if it is finished, without blocking.
    pub fn poll(&self) -> Option<DelveResult<GeneratedWorld>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result.map_err(DelveError::from)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(DelveError::JobDisconnected)),
        }
    }

    /// Blocks until the stage is finished.
    ///
    /// # Errors
    ///
    /// Propagates generation failures, or `JobDisconnected` if the worker died.
    pub fn wait(&self) -> DelveResult<GeneratedWorld> {
        self.receiver
            .recv()
            .map_err(|_| DelveError::JobDisconnected)?
            .map_err(DelveError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::NavQuery;
    use delve_procedural::{BiomeDescriptor, MaterialPalette, NoiseField, WorldConfig};

    fn builder(seed: u64) -> WorldBuilder {
        let config = WorldConfig::default();
        let field = NoiseField::new(WorldSeed::new(seed), config.terrain_scale, config.ore_scale);
        WorldBuilder::new(config, BiomeDescriptor::meadow(), MaterialPalette::standard(), field)
    }

    #[test]
    fn test_session_bakes_once() {
        let session = WorldSession::build(&builder(42), 0, WorldSeed::new(42), SpawnSettings::default()).unwrap();
        assert_eq!(session.navigator().bake_count(), 1);
        assert_eq!(session.remaining_spawns(), session.stage().spawn_points.len());
        assert_eq!(session.biome(), "meadow");
    }

    #[test]
    fn test_background_job_matches_inline_build() {
        let job = GenerationJob::start(0, WorldSeed::new(42), builder(42), true);
        let background = job.wait().unwrap();
        let inline = builder(42).generate().unwrap();
        assert_eq!(background.world.layout_bytes(), inline.world.layout_bytes());
    }

    #[test]
    fn test_inline_job_is_ready_immediately() {
        let job = GenerationJob::start(3, WorldSeed::new(7), builder(7), false);
        assert_eq!(job.stage_index(), 3);
        assert!(matches!(job.poll(), Some(Ok(_))));
    }

    #[test]
    fn test_player_spawn_leaves_pool() {
        let mut session = WorldSession::build(&builder(42), 0, WorldSeed::new(42), SpawnSettings::default()).unwrap();
        let before = session.remaining_spawns();
        let player = session.spawn(ClaimMode::Take, 0.4).unwrap();
        assert!(session.navigator().is_walkable(player));
        assert!(session.remaining_spawns() < before, "the player's point leaves the pool");
    }
}

//! # Spawn Coordination
//!
//! Picks spawn coordinates from the stage's spawn point set and corrects them
//! away from navigation edges.
//!
//! ## Edge Safety
//!
//! After a raw placement the distance to the nearest boundary is probed. If it
//! is below `entity_radius * EDGE_MARGIN_FACTOR` the point is pushed inward by
//! the shortfall and re-sampled, at most `max_retries` times. A failed
//! correction is reported as [`SpawnError::NoValidSpawn`]; nothing ever falls
//! back to the origin.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use delve_procedural::{Coordinate, SpawnPointSet, WorldSeed};

use crate::error::SpawnError;
use crate::math::Vec3;
use crate::navigation::NavQuery;

/// Safety margin as a multiple of the entity radius.
pub const EDGE_MARGIN_FACTOR: f32 = 1.5;

/// Search radius used when snapping a spawn point onto the surface.
pub const SNAP_RADIUS: f32 = 1.0;

/// Seed purpose for the spawn stream.
const SPAWN_STREAM: u64 = 0x5BA_3A;

/// Whether a claimed spawn point leaves the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClaimMode {
    /// Remove the point (single player spawn).
    Take,
    /// Leave the point available (repeated hostile spawns).
    Keep,
}

/// Spawn tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnSettings {
    /// Edge correction attempts per placement.
    pub max_retries: u32,
    /// Different spawn points tried before a spawn is given up.
    pub max_claims: u32,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            max_retries: 4,
            max_claims: 8,
        }
    }
}

/// Selects and safety-corrects spawn positions for one stage.
#[derive(Clone, Debug)]
pub struct SpawnCoordinator {
    points: SpawnPointSet,
    rng: ChaCha8Rng,
    settings: SpawnSettings,
}

impl SpawnCoordinator {
    /// Creates a coordinator over a stage's spawn points.
    #[must_use]
    pub fn new(points: SpawnPointSet, seed: WorldSeed, settings: SpawnSettings) -> Self {
        Self {
            points,
            rng: ChaCha8Rng::seed_from_u64(seed.derive(SPAWN_STREAM).value()),
            settings,
        }
    }

    /// Points still available.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.points.len()
    }

    /// Picks a spawn point uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError::NoValidSpawn` if the pool is empty.
    pub fn claim_random_spawn(&mut self, mode: ClaimMode) -> Result<Coordinate, SpawnError> {
        if self.points.is_empty() {
            return Err(SpawnError::no_valid("spawn point set is empty"));
        }
        let index = self.rng.gen_range(0..self.points.len());
        let point = self
            .points
            .get(index)
            .ok_or_else(|| SpawnError::no_valid("spawn index out of range"))?;
        if mode == ClaimMode::Take {
            self.points.remove(point);
        }
        Ok(point)
    }

    /// Nearest walkable point to `position` within `radius`.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError::NoValidSpawn` if nothing walkable is in range.
    pub fn sample_near<N: NavQuery + ?Sized>(
        &self,
        nav: &N,
        position: Vec3,
        radius: f32,
    ) -> Result<Vec3, SpawnError> {
        nav.sample_navigable(position, radius)
            .ok_or_else(|| SpawnError::no_valid("no navigable point in range"))
    }

    /// Samples near `position` and pushes the result away from edges.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError::NoValidSpawn` if sampling fails or the retries run out.
    pub fn place_safely<N: NavQuery + ?Sized>(
        &self,
        nav: &N,
        position: Vec3,
        radius: f32,
        entity_radius: f32,
    ) -> Result<Vec3, SpawnError> {
        let margin = entity_radius.max(0.0) * EDGE_MARGIN_FACTOR;
        let mut point = self.sample_near(nav, position, radius)?;

        for attempt in 0..=self.settings.max_retries {
            let Some(probe) = nav.edge_probe(point) else {
                return Ok(point);
            };
            if probe.distance >= margin {
                return Ok(point);
            }
            if attempt == self.settings.max_retries {
                break;
            }
            let shortfall = margin - probe.distance;
            let pushed = point + probe.normal * shortfall;
            point = self.sample_near(nav, pushed, margin)?;
        }

        Err(SpawnError::no_valid("edge correction retries exhausted"))
    }

    /// Claims a spawn point and corrects it, moving on to another point when
    /// correction fails.
    ///
    /// In `Take` mode every rejected point leaves the pool as well.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError::NoValidSpawn` once `max_claims` points have failed
    /// or the pool runs dry.
    pub fn spawn<N: NavQuery + ?Sized>(
        &mut self,
        nav: &N,
        mode: ClaimMode,
        entity_radius: f32,
    ) -> Result<Vec3, SpawnError> {
        let mut last = SpawnError::no_valid("no attempts made");
        for _ in 0..self.settings.max_claims.max(1) {
            let cell = self.claim_random_spawn(mode)?;
            match self.place_safely(nav, Vec3::from_cell(cell), SNAP_RADIUS, entity_radius) {
                Ok(point) => return Ok(point),
                Err(err) => last = err,
            }
        }

        tracing::warn!(?mode, error = %last, "spawn failed");
        Err(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::test_support::FlatArena;

    fn points(cells: &[(i32, i32)]) -> SpawnPointSet {
        let mut set = SpawnPointSet::new();
        for &(x, z) in cells {
            set.insert(Coordinate::new(x, 1, z));
        }
        set
    }

    #[test]
    fn test_empty_pool_is_no_valid_spawn() {
        let mut spawns = SpawnCoordinator::new(SpawnPointSet::new(), WorldSeed::new(1), SpawnSettings::default());
        let result = spawns.claim_random_spawn(ClaimMode::Keep);
        assert!(matches!(result, Err(SpawnError::NoValidSpawn { .. })));
    }

    #[test]
    fn test_take_removes_keep_does_not() {
        let mut spawns = SpawnCoordinator::new(points(&[(1, 1), (2, 2), (3, 3)]), WorldSeed::new(1), SpawnSettings::default());

        spawns.claim_random_spawn(ClaimMode::Keep).unwrap();
        assert_eq!(spawns.remaining(), 3);

        let taken = spawns.claim_random_spawn(ClaimMode::Take).unwrap();
        assert_eq!(spawns.remaining(), 2);
        for _ in 0..20 {
            assert_ne!(spawns.claim_random_spawn(ClaimMode::Keep).unwrap(), taken);
        }
    }

    #[test]
    fn test_claims_are_seeded() {
        let cells: Vec<(i32, i32)> = (0..10).map(|i| (i, i)).collect();
        let mut a = SpawnCoordinator::new(points(&cells), WorldSeed::new(9), SpawnSettings::default());
        let mut b = SpawnCoordinator::new(points(&cells), WorldSeed::new(9), SpawnSettings::default());
        for _ in 0..10 {
            assert_eq!(
                a.claim_random_spawn(ClaimMode::Keep).unwrap(),
                b.claim_random_spawn(ClaimMode::Keep).unwrap()
            );
        }
    }

    #[test]
    fn test_point_near_edge_is_pushed_inward() {
        let arena = FlatArena { width: 10.0, depth: 10.0 };
        let spawns = SpawnCoordinator::new(SpawnPointSet::new(), WorldSeed::new(1), SpawnSettings::default());

        let placed = spawns
            .place_safely(&arena, Vec3::new(0.1, 1.0, 5.0), 1.0, 0.5)
            .unwrap();
        assert!(placed.x >= 0.75 - 1e-4, "pushed past the margin, got {}", placed.x);
        assert!((placed.z - 5.0).abs() < 1e-4, "push follows the edge normal");
    }

    #[test]
    fn test_corridor_too_narrow_exhausts_retries() {
        let arena = FlatArena { width: 1.0, depth: 10.0 };
        let spawns = SpawnCoordinator::new(SpawnPointSet::new(), WorldSeed::new(1), SpawnSettings::default());

        let result = spawns.place_safely(&arena, Vec3::new(0.5, 1.0, 5.0), 1.0, 0.5);
        assert!(matches!(result, Err(SpawnError::NoValidSpawn { .. })));
    }

    #[test]
    fn test_sample_out_of_reach_fails() {
        let arena = FlatArena { width: 10.0, depth: 10.0 };
        let spawns = SpawnCoordinator::new(SpawnPointSet::new(), WorldSeed::new(1), SpawnSettings::default());
        let result = spawns.sample_near(&arena, Vec3::new(-50.0, 1.0, 5.0), 2.0);
        assert!(result.is_err(), "must never fall back to the origin");
    }

    #[test]
    fn test_spawn_returns_safe_position() {
        let arena = FlatArena { width: 10.0, depth: 10.0 };
        let mut spawns = SpawnCoordinator::new(points(&[(4, 4), (5, 5)]), WorldSeed::new(3), SpawnSettings::default());
        let placed = spawns.spawn(&arena, ClaimMode::Take, 0.5).unwrap();
        assert!(arena.edge_probe(placed).unwrap().distance >= 0.75);
        assert_eq!(spawns.remaining(), 1);
    }
}

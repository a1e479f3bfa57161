//! # Spawn Safety Integration Test
//!
//! Every position handed out on a generated stage stands on walkable,
//! non-fluid ground.

use delve::navigation::NavQuery;
use delve::{ClaimMode, SpawnError, SpawnSettings, WorldSession, PLAYER_RADIUS};
use delve_procedural::{
    BiomeDescriptor, MaterialPalette, NoiseField, WorldBuilder, WorldConfig, WorldSeed,
};

fn session(seed: u64, biome: BiomeDescriptor) -> WorldSession {
    let config = WorldConfig::default();
    let seed = WorldSeed::new(seed);
    let field = NoiseField::new(seed, config.terrain_scale, config.ore_scale);
    let builder = WorldBuilder::new(config, biome, MaterialPalette::standard(), field);
    WorldSession::build(&builder, 0, seed, SpawnSettings::default()).expect("stage generates")
}

/// Test: player and hostile spawns are walkable across seeds and biomes.
#[test]
fn test_spawns_are_walkable() {
    for seed in 1..=4 {
        for biome in [
            BiomeDescriptor::meadow(),
            BiomeDescriptor::ashlands(),
            BiomeDescriptor::frost_lair(),
        ] {
            let name = biome.name.clone();
            let mut session = session(seed, biome);
            let fluid = session.stage().fluid;

            let mut positions = vec![session.spawn(ClaimMode::Take, PLAYER_RADIUS).expect("player spawns")];
            for _ in 0..4 {
                positions.push(session.spawn(ClaimMode::Keep, 0.5).expect("hostile spawns"));
            }

            for p in positions {
                assert!(session.navigator().is_walkable(p), "seed {seed} {name}: {p:?}");
                assert!(session.arena().contains(p));
                let ground = session
                    .navigator()
                    .cast_downward(p, 2.0)
                    .expect("ground under a spawn");
                assert_ne!(ground.material, fluid, "seed {seed} {name}: spawned on fluid");
            }
        }
    }
}

/// Test: taking spawn points eventually exhausts the pool.
#[test]
fn test_take_exhausts_pool() {
    let mut session = session(42, BiomeDescriptor::meadow());
    assert!(session.remaining_spawns() > 0);

    let mut placed = 0;
    while session.remaining_spawns() > 0 {
        let before = session.remaining_spawns();
        if session.spawn(ClaimMode::Take, PLAYER_RADIUS).is_ok() {
            placed += 1;
        }
        // Rejected points are taken too
        assert!(session.remaining_spawns() < before, "every take shrinks the pool");
    }
    assert!(placed > 0);
    assert!(matches!(
        session.spawn(ClaimMode::Take, PLAYER_RADIUS),
        Err(SpawnError::NoValidSpawn { .. })
    ));
}

/// Test: keep mode leaves the pool untouched.
#[test]
fn test_keep_preserves_pool() {
    let mut session = session(42, BiomeDescriptor::meadow());
    let total = session.remaining_spawns();
    for _ in 0..10 {
        session.spawn(ClaimMode::Keep, 0.5).expect("spawns");
    }
    assert_eq!(session.remaining_spawns(), total);
}

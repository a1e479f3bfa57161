//! # Out-of-Bounds Integration Test
//!
//! A hostile knocked out of the arena is removed and replaced without
//! counting as a kill.

use delve::ai::{EntityId, HostileKind};
use delve::{
    GameConfig, GameEvent, KillFilter, ProgressionRule, Simulation, StageConfig, Status, Vec3,
};
use delve_procedural::{BiomeDescriptor, WorldConfig};

fn lone_melee_stage() -> Simulation {
    let config = GameConfig {
        world: WorldConfig {
            width: 32,
            depth: 32,
            ..WorldConfig::default()
        },
        stages: vec![StageConfig {
            biome: BiomeDescriptor::meadow(),
            rule: ProgressionRule::ClearAll {
                filter: KillFilter::Any,
            },
            roster: vec![HostileKind::Melee],
        }],
        background_generation: false,
        ..GameConfig::default()
    };
    let mut sim = Simulation::new(config).expect("config is valid");
    sim.wait_until_ready().expect("stage generates");
    sim
}

/// Test: falling out of the world replaces the hostile and never clears.
#[test]
fn test_out_of_bounds_hostile_is_replaced() {
    let mut sim = lone_melee_stage();
    let events = sim.events();
    events.drain();

    let original: EntityId = sim.hostiles()[0].id();
    assert_eq!(sim.live_hostiles(), 1);

    let below = Vec3::new(16.5, -100.0, 16.5);
    assert!(sim.displace_hostile(original, below).expect("running"));
    sim.tick(0.1).expect("tick");

    let seen = events.drain();
    assert!(seen.contains(&GameEvent::HostileOutOfBounds { id: original }));
    let replacement = seen
        .iter()
        .find_map(|e| match e {
            GameEvent::HostileSpawned { id, kind, .. } => Some((*id, *kind)),
            _ => None,
        })
        .expect("a replacement spawned");
    assert_ne!(replacement.0, original, "replacement gets a fresh id");
    assert_eq!(replacement.1, HostileKind::Melee);

    assert!(!seen.iter().any(|e| matches!(e, GameEvent::StageCleared { .. })));
    assert!(!seen.iter().any(|e| matches!(e, GameEvent::HostileDied { .. })));
    assert_eq!(sim.status(), Status::Running);
    assert_eq!(sim.live_hostiles(), 1, "live count unchanged");
    assert!(sim.hostile(original).is_none());
    assert!(sim.hostile(replacement.0).is_some());
}

/// Test: displacing an unknown id changes nothing.
#[test]
fn test_displacing_unknown_hostile() {
    let mut sim = lone_melee_stage();
    assert!(!sim
        .displace_hostile(EntityId(999), Vec3::new(0.0, -100.0, 0.0))
        .expect("running"));
    assert_eq!(sim.hostiles().len(), 1);
}

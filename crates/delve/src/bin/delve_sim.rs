//! # DELVE Headless Runner
//!
//! Plays the campaign with a scripted player and logs the event stream.
//!
//! ```text
//! delve_sim [config.toml] [seconds]
//! RUST_LOG=delve=debug delve_sim
//! ```
//!
//! The player walks to the nearest hostile and swings at it, lets dying
//! bosses finish their death visual, and once a second crafts the stage's
//! trigger item or else the first recipe it can afford.

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use delve::{DelveResult, GameConfig, GameEvent, ProgressionRule, Simulation, Status, Vec3};

// ============================================================================
// CONSTANTS
// ============================================================================
const TICK_RATE: f32 = 30.0;
const DEFAULT_SECONDS: f32 = 300.0;
const DEATH_VISUAL_SECONDS: f32 = 2.0;
const CRAFT_INTERVAL: f32 = 1.0;

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "delve=info,delve_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "run failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> DelveResult<()> {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(DEFAULT_SECONDS);

    let crafting = config.crafting()?;
    let recipes: Vec<u32> = crafting.recipes().map(|r| r.id).collect();
    let mut sim = Simulation::new(config)?;
    let events = sim.events();

    let dt = 1.0 / TICK_RATE;
    let total_ticks = (seconds * TICK_RATE) as u64;
    let mut dying = Vec::new();
    let mut craft_timer = 0.0;

    for _ in 0..total_ticks {
        sim.tick(dt)?;

        for event in events.drain() {
            match &event {
                GameEvent::HostileDied { id, .. } => dying.push((*id, 0.0_f32)),
                GameEvent::StageReady { .. }
                | GameEvent::StageCleared { .. }
                | GameEvent::Victory
                | GameEvent::PlayerDied => info!(?event, "stage event"),
                _ => tracing::debug!(?event),
            }
        }

        match sim.status() {
            Status::Victory | Status::Defeat | Status::Failed => break,
            Status::Loading => {
                dying.clear();
                continue;
            }
            Status::Running => {}
        }

        for (id, elapsed) in &mut dying {
            *elapsed += dt;
            if *elapsed >= DEATH_VISUAL_SECONDS {
                sim.complete_death_visual(*id);
            }
        }
        dying.retain(|(_, elapsed)| *elapsed < DEATH_VISUAL_SECONDS);

        chase_nearest(&mut sim, dt)?;
        if sim.status() != Status::Running {
            continue;
        }

        craft_timer += dt;
        if craft_timer >= CRAFT_INTERVAL {
            craft_timer -= CRAFT_INTERVAL;
            // The stage's trigger item goes first
            let trigger = match sim.director().current_stage().rule {
                ProgressionRule::CraftItem { item } => crafting.recipe_for(item).map(|r| r.id),
                ProgressionRule::ClearAll { .. } => None,
            };
            for recipe in trigger.iter().chain(&recipes) {
                if sim.craft(*recipe).is_ok() || sim.status() != Status::Running {
                    break;
                }
            }
        }
    }

    let player_health = sim.player().map_or(0, delve::Player::health);
    info!(
        status = ?sim.status(),
        stage = sim.director().session().stage,
        ticks = sim.ticks(),
        player_health,
        "run finished"
    );
    for row in sim.health_readout() {
        info!(id = %row.id, kind = row.kind.name(), state = row.state.name(), health = row.health, max = row.max_health, "hostile");
    }
    Ok(())
}

fn chase_nearest(sim: &mut Simulation, dt: f32) -> DelveResult<()> {
    let Some(origin) = sim.player().map(|p| p.position) else {
        return Ok(());
    };
    let reach = sim.config().player.attack_reach;
    let nearest = sim
        .hostiles()
        .iter()
        .filter(|h| h.is_alive())
        .map(|h| h.position())
        .min_by(|a, b| a.distance(origin).total_cmp(&b.distance(origin)));

    let Some(target) = nearest else {
        return Ok(());
    };
    if target.distance(origin) > reach {
        let toward = Vec3::new(target.x - origin.x, 0.0, target.z - origin.z);
        sim.move_player(toward, true, dt)?;
    } else {
        sim.attack_nearest()?;
    }
    Ok(())
}

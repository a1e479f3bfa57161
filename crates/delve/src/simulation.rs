//! # Stage Simulation
//!
//! Drives one run of the campaign, tick by tick:
//!
//! ```text
//! tick(dt):
//! ┌──────────────────────────────────────────────────────────────────┐
//! │ paused             -> nothing                                    │
//! │ Loading            -> poll generation job                        │
//! │                       └─ arrived: bake nav, spawn player+roster  │
//! │                       └─ no player spawn: regenerate, reseeded   │
//! │ Running            -> player effects (poison)                    │
//! │                       hostile AI in spawn order                  │
//! │                       strikes -> player                          │
//! │                       out-of-bounds -> remove + replace          │
//! │                       summons -> spawn near caster               │
//! │ Victory / Defeat   -> nothing                                    │
//! │ Failed             -> StageFailed                                │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Player commands (`move_player`, `attack_nearest`, `mine`, `craft`) act
//! between ticks. Every random choice is drawn from ChaCha8 streams derived
//! from the stage seed, so the same config and the same sequence of calls
//! replays identically.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use delve_economy::{CraftReceipt, CraftingGraph, Inventory, RecipeId};
use delve_procedural::{
    Coordinate, GeneratedWorld, MaterialPalette, MineOutcome, NoiseField, WorldBuilder, WorldSeed,
};

use crate::ai::{
    AiCommand, AiState, DamageOutcome, DeathHook, EntityId, HostileEntity, HostileKind, Strike,
};
use crate::config::GameConfig;
use crate::director::{MapDirector, StageOutcome};
use crate::error::{ConfigError, DelveError, DelveResult, SpawnError};
use crate::events::{EventBus, EventReceiver, EventSender, GameEvent};
use crate::math::Vec3;
use crate::player::Player;
use crate::session::{GenerationJob, WorldSession};
use crate::spawn::ClaimMode;

/// Collision radius used when placing the player.
pub const PLAYER_RADIUS: f32 = 0.4;

const MINION_STREAM: u64 = 0x4d49_4e49_4f4e;
const REGENERATE_STREAM: u64 = 0x5245_4745_4e00;

/// Generations tried for one stage before the run stops.
pub const MAX_STAGE_ATTEMPTS: u64 = 4;

/// Where the run is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    /// A stage is generating. No AI or spawning runs.
    Loading,
    /// A stage is live.
    Running,
    /// The final stage was cleared.
    Victory,
    /// The player died.
    Defeat,
    /// A stage could not be generated or had nowhere to place the player.
    Failed,
}

/// One row of the health readout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HealthReadout {
    /// Hostile id.
    pub id: EntityId,
    /// Kind.
    pub kind: HostileKind,
    /// AI state.
    pub state: AiState,
    /// Current health.
    pub health: u32,
    /// Maximum health.
    pub max_health: u32,
}

/// Everything that lives and dies with one stage.
#[derive(Debug)]
struct Stage {
    world: WorldSession,
    player: Player,
    inventory: Inventory,
    hostiles: Vec<HostileEntity>,
}

/// A run of the campaign.
pub struct Simulation {
    config: GameConfig,
    palette: MaterialPalette,
    crafting: CraftingGraph,
    director: MapDirector,
    status: Status,
    paused: bool,
    job: Option<GenerationJob>,
    attempts: u64,
    stage: Option<Box<Stage>>,
    minion_rng: ChaCha8Rng,
    next_id: u32,
    ticks: u64,
    events: EventSender,
    receiver: EventReceiver,
    commands: Vec<AiCommand>,
}

impl Simulation {
    /// Validates the config and starts generating stage 0.
    ///
    /// # Errors
    ///
    /// Returns `DelveError::Config` for an unusable config and
    /// `DelveError::Economy` for a cyclic recipe set.
    pub fn new(config: GameConfig) -> DelveResult<Self> {
        config.validate()?;
        let crafting = config.crafting()?;
        let director = MapDirector::new(config.stages.clone(), config.world_seed())
            .ok_or_else(|| ConfigError::Invalid("at least one stage is required".into()))?;
        let (events, receiver) = EventBus::create_pair(config.event_capacity);

        tracing::info!(
            seed = config.seed,
            stages = director.stage_count(),
            background = config.background_generation,
            "simulation created"
        );

        let mut simulation = Self {
            palette: config.palette(),
            minion_rng: ChaCha8Rng::seed_from_u64(config.world_seed().derive(MINION_STREAM).value()),
            config,
            crafting,
            director,
            status: Status::Loading,
            paused: false,
            job: None,
            attempts: 0,
            stage: None,
            next_id: 0,
            ticks: 0,
            events,
            receiver,
            commands: Vec::new(),
        };
        simulation.start_loading(0);
        Ok(simulation)
    }

    // =========================================================================
    // Ticking
    // =========================================================================

    /// Advances the simulation by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Returns the generation or spawn failure that stopped the run when a
    /// stage cannot be entered, and `StageFailed` on every tick after that.
    pub fn tick(&mut self, dt: f32) -> DelveResult<()> {
        if self.paused {
            return Ok(());
        }
        self.ticks += 1;

        match self.status {
            Status::Loading => {
                let Some(job) = self.job.as_ref() else {
                    return Ok(());
                };
                let Some(result) = job.poll() else {
                    return Ok(());
                };
                let (index, seed) = (job.stage_index(), job.seed());
                self.job = None;
                self.arrive(index, seed, result)
            }
            Status::Running => {
                if let Some(mut stage) = self.stage.take() {
                    self.step(&mut stage, dt.max(0.0));
                    self.stage = Some(stage);
                }
                Ok(())
            }
            Status::Victory | Status::Defeat => Ok(()),
            Status::Failed => Err(DelveError::StageFailed {
                stage: self.director.session().stage,
            }),
        }
    }

    /// Blocks until the loading stage has arrived and is running,
    /// including any regenerations.
    ///
    /// # Errors
    ///
    /// As [`Simulation::tick`].
    pub fn wait_until_ready(&mut self) -> DelveResult<()> {
        while let Some(job) = self.job.take() {
            let result = job.wait();
            self.arrive(job.stage_index(), job.seed(), result)?;
        }
        Ok(())
    }

    /// Freezes or resumes every AI and status countdown.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            tracing::debug!(paused, "simulation pause toggled");
        }
        self.paused = paused;
    }

    fn step(&mut self, stage: &mut Stage, dt: f32) {
        let before = stage.player.health();
        stage.player.tick(dt);
        let poison = before - stage.player.health();
        if poison > 0 {
            self.events.send(GameEvent::PlayerPoisoned {
                damage: poison,
                health_remaining: stage.player.health(),
            });
            if !stage.player.is_alive() {
                self.defeat();
                return;
            }
        }

        let target = Some(stage.player.position);
        let mut strikes: Vec<(EntityId, Strike)> = Vec::new();
        let mut summons = Vec::new();
        let mut escaped = Vec::new();

        for hostile in &mut stage.hostiles {
            self.commands.clear();
            hostile.tick(
                dt,
                target,
                stage.world.navigator(),
                stage.world.arena(),
                &mut self.commands,
            );
            let id = hostile.id();
            for command in self.commands.drain(..) {
                match command {
                    AiCommand::Strike(strike) => strikes.push((id, strike)),
                    AiCommand::Summon { kind, near, range } => summons.push((kind, near, range)),
                    AiCommand::OutOfBounds => escaped.push(id),
                    AiCommand::StateChanged { from, to } => {
                        self.events.send(GameEvent::HostileStateChanged { id, from, to });
                    }
                }
            }
        }

        for (attacker, strike) in strikes {
            let remaining = stage.player.take_damage(strike.damage);
            if let Some(effect) = strike.effect {
                stage.player.apply_effect(effect);
            }
            self.events.send(GameEvent::PlayerDamaged {
                attacker,
                damage: strike.damage,
                health_remaining: remaining,
                effect: strike.effect.map(|e| e.kind()),
            });
            if remaining == 0 {
                self.defeat();
                return;
            }
        }

        for id in escaped {
            let Some(index) = stage.hostiles.iter().position(|h| h.id() == id) else {
                continue;
            };
            let kind = stage.hostiles.remove(index).kind();
            self.director.on_out_of_bounds(kind);
            self.events.send(GameEvent::HostileOutOfBounds { id });
            if let Err(err) = self.spawn_hostile(stage, kind, None) {
                tracing::warn!(%err, kind = kind.name(), "replacement spawn failed");
            }
        }

        for (kind, near, range) in summons {
            if let Err(err) = self.spawn_hostile(stage, kind, Some((near, range))) {
                tracing::warn!(%err, kind = kind.name(), "summon failed");
            }
        }
    }

    // =========================================================================
    // Player Commands
    // =========================================================================

    /// Walks the player along a horizontal direction.
    ///
    /// Returns false if the move was refused (stunned or blocked).
    ///
    /// # Errors
    ///
    /// Returns `Loading` or `Finished` when no stage is live.
    pub fn move_player(&mut self, direction: Vec3, sprinting: bool, dt: f32) -> DelveResult<bool> {
        self.ensure_running()?;
        let stage = self.stage.as_deref_mut().ok_or(DelveError::Loading)?;
        let Stage { world, player, .. } = stage;
        Ok(player.walk(direction, sprinting, dt, world.navigator()))
    }

    /// Hits the nearest active hostile within the player's reach.
    ///
    /// # Errors
    ///
    /// Returns `Loading` or `Finished` when no stage is live.
    pub fn attack_nearest(&mut self) -> DelveResult<Option<(EntityId, DamageOutcome)>> {
        self.ensure_running()?;
        let stage = self.stage.as_deref_mut().ok_or(DelveError::Loading)?;
        let reach = stage.player.config().attack_reach;
        let damage = stage.player.config().attack_damage;
        let origin = stage.player.position;

        let nearest = stage
            .hostiles
            .iter()
            .filter(|h| h.is_alive())
            .map(|h| (h.id(), h.position().distance(origin)))
            .filter(|(_, d)| *d <= reach)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id);

        let Some(id) = nearest else {
            return Ok(None);
        };
        let outcome = self.damage_hostile(id, damage)?;
        Ok(Some((id, outcome)))
    }

    /// Deals damage to a hostile.
    ///
    /// A kill reports to the director immediately. Hostiles with an
    /// immediate death hook are removed at once; the rest stay in `Dying`
    /// until [`Simulation::complete_death_visual`].
    ///
    /// # Errors
    ///
    /// Returns `Loading` or `Finished` when no stage is live.
    pub fn damage_hostile(&mut self, id: EntityId, amount: u32) -> DelveResult<DamageOutcome> {
        self.ensure_running()?;
        let stage = self.stage.as_deref_mut().ok_or(DelveError::Loading)?;
        let Some(index) = stage.hostiles.iter().position(|h| h.id() == id) else {
            return Ok(DamageOutcome::Ignored);
        };

        let hostile = &mut stage.hostiles[index];
        let kind = hostile.kind();
        let outcome = hostile.take_damage(amount);
        let mut cleared = None;

        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Survived { remaining } => {
                self.events.send(GameEvent::HostileDamaged {
                    id,
                    damage: amount,
                    health_remaining: remaining,
                });
            }
            DamageOutcome::Killed => {
                let hook = hostile.death_hook();
                self.events.send(GameEvent::HostileDied { id, kind });
                if hook == DeathHook::Immediate {
                    stage.hostiles.remove(index);
                    self.events.send(GameEvent::HostileRemoved { id });
                }
                cleared = self.director.on_death(kind);
            }
        }

        if let Some(outcome) = cleared {
            self.advance(outcome);
        }
        Ok(outcome)
    }

    /// Removes a hostile whose death visual has finished.
    ///
    /// Returns false if the hostile is unknown or not dying.
    pub fn complete_death_visual(&mut self, id: EntityId) -> bool {
        let Some(stage) = self.stage.as_deref_mut() else {
            return false;
        };
        let Some(index) = stage
            .hostiles
            .iter()
            .position(|h| h.id() == id && h.state() == AiState::Dying)
        else {
            return false;
        };
        stage.hostiles.remove(index);
        self.events.send(GameEvent::HostileRemoved { id });
        true
    }

    /// Moves a hostile without navigation, as knockback or a scripted
    /// teleport would.
    ///
    /// A hostile left outside the arena is removed and replaced on the next
    /// tick without counting as a kill. Returns false for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns `Loading` or `Finished` when no stage is live.
    pub fn displace_hostile(&mut self, id: EntityId, position: Vec3) -> DelveResult<bool> {
        self.ensure_running()?;
        let stage = self.stage.as_deref_mut().ok_or(DelveError::Loading)?;
        let Some(hostile) = stage.hostiles.iter_mut().find(|h| h.id() == id) else {
            return Ok(false);
        };
        tracing::debug!(%id, from = ?hostile.position(), to = ?position, "hostile displaced");
        hostile.set_position(position);
        Ok(true)
    }

    /// Mines a block with the player's tool, granting any drop.
    ///
    /// A drop that does not fit the inventory is lost.
    ///
    /// # Errors
    ///
    /// Returns `Loading` or `Finished` when no stage is live, or
    /// `Procedural(OutOfBounds)` outside the stage.
    pub fn mine(&mut self, coordinate: Coordinate) -> DelveResult<MineOutcome> {
        let damage = self.config.player.mining_damage;
        self.ensure_running()?;
        let stage = self.stage.as_deref_mut().ok_or(DelveError::Loading)?;
        let material = stage
            .world
            .stage()
            .world
            .block(coordinate)
            .map(|b| b.material);
        let outcome = stage.world.mine(coordinate, damage)?;

        if let (MineOutcome::Destroyed { drop }, Some(material)) = (outcome, material) {
            let mut granted = 0;
            if let Some(drop) = drop {
                match stage.inventory.add(drop.material, drop.count) {
                    Ok(()) => granted = drop.count,
                    Err(err) => tracing::warn!(%err, "mined drop lost"),
                }
            }
            self.events.send(GameEvent::BlockMined {
                position: [coordinate.x, coordinate.y, coordinate.z],
                material,
                granted,
            });
        }
        Ok(outcome)
    }

    /// Runs a recipe against the player's inventory.
    ///
    /// # Errors
    ///
    /// Returns `Loading` or `Finished` when no stage is live, or the
    /// crafting failure. A failed craft leaves the inventory untouched.
    pub fn craft(&mut self, recipe: RecipeId) -> DelveResult<CraftReceipt> {
        self.ensure_running()?;
        let stage = self.stage.as_deref_mut().ok_or(DelveError::Loading)?;
        let receipt = self.crafting.craft(&mut stage.inventory, recipe)?;
        self.events.send(GameEvent::ItemCrafted {
            recipe,
            outputs: receipt.outputs.iter().map(|o| (o.item, o.quantity)).collect(),
        });
        if let Some(outcome) = self.director.on_craft(&receipt) {
            self.advance(outcome);
        }
        Ok(receipt)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Where the run is.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns true while a stage is generating.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == Status::Loading
    }

    /// Returns true while paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Ticks processed while unpaused.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Hostiles alive on the active stage.
    #[must_use]
    pub const fn live_hostiles(&self) -> u32 {
        self.director.session().live
    }

    /// Health of every hostile still in the simulation, in spawn order.
    #[must_use]
    pub fn health_readout(&self) -> Vec<HealthReadout> {
        self.hostiles()
            .iter()
            .map(|h| HealthReadout {
                id: h.id(),
                kind: h.kind(),
                state: h.state(),
                health: h.health(),
                max_health: h.max_health(),
            })
            .collect()
    }

    /// Hostiles in the simulation, in spawn order. Includes dying bosses.
    #[must_use]
    pub fn hostiles(&self) -> &[HostileEntity] {
        self.stage
            .as_deref()
            .map(|s| s.hostiles.as_slice())
            .unwrap_or_default()
    }

    /// Looks up a hostile.
    #[must_use]
    pub fn hostile(&self, id: EntityId) -> Option<&HostileEntity> {
        self.hostiles().iter().find(|h| h.id() == id)
    }

    /// The player, once a stage is loaded.
    #[must_use]
    pub fn player(&self) -> Option<&Player> {
        self.stage.as_deref().map(|s| &s.player)
    }

    /// The player's inventory, once a stage is loaded.
    #[must_use]
    pub fn inventory(&self) -> Option<&Inventory> {
        self.stage.as_deref().map(|s| &s.inventory)
    }

    /// The active world session, once a stage is loaded.
    #[must_use]
    pub fn world(&self) -> Option<&WorldSession> {
        self.stage.as_deref().map(|s| &s.world)
    }

    /// Stage order and progression.
    #[must_use]
    pub const fn director(&self) -> &MapDirector {
        &self.director
    }

    /// The config the run was created with.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// A handle on the event stream.
    #[must_use]
    pub fn events(&self) -> EventReceiver {
        self.receiver.clone()
    }

    // =========================================================================
    // Stage Lifecycle
    // =========================================================================

    fn start_loading(&mut self, index: usize) {
        let seed = self.director.stage_seed(index);
        let biome = self.config.stages[index].biome.name.clone();

        tracing::info!(stage = index, %biome, seed = seed.value(), "stage loading");
        self.events.send(GameEvent::StageLoading { stage: index, biome });

        self.attempts = 0;
        self.launch(index, seed);
    }

    fn launch(&mut self, index: usize, seed: WorldSeed) {
        let biome = self.config.stages[index].biome.clone();
        let world = self.config.world;
        let field = NoiseField::new(seed, world.terrain_scale, world.ore_scale);
        let builder = WorldBuilder::new(world, biome, self.palette.clone(), field);
        self.job = Some(GenerationJob::start(
            index,
            seed,
            builder,
            self.config.background_generation,
        ));
        self.status = Status::Loading;
    }

    /// Enters a finished generation, regenerating from a derived seed when the
    /// player has nowhere to stand.
    fn arrive(
        &mut self,
        index: usize,
        seed: WorldSeed,
        generated: DelveResult<GeneratedWorld>,
    ) -> DelveResult<()> {
        let entered = generated.and_then(|world| self.enter_stage(index, seed, world));
        match entered {
            Ok(()) => Ok(()),
            Err(DelveError::Spawn(err)) if self.attempts + 1 < MAX_STAGE_ATTEMPTS => {
                self.attempts += 1;
                let reseeded = self
                    .director
                    .stage_seed(index)
                    .derive(REGENERATE_STREAM + self.attempts);
                tracing::warn!(%err, stage = index, attempt = self.attempts, "no player spawn, regenerating stage");
                self.launch(index, reseeded);
                Ok(())
            }
            Err(err) => {
                tracing::error!(%err, stage = index, "stage could not be entered");
                self.status = Status::Failed;
                Err(err)
            }
        }
    }

    fn enter_stage(&mut self, index: usize, seed: WorldSeed, generated: GeneratedWorld) -> DelveResult<()> {
        let mut world = WorldSession::from_generated(generated, index, seed, self.config.spawn);
        let position = world.spawn(ClaimMode::Take, PLAYER_RADIUS)?;

        let mut inventory = Inventory::new();
        self.director.finish_transition(index, &mut inventory);
        self.minion_rng = ChaCha8Rng::seed_from_u64(seed.derive(MINION_STREAM).value());

        let mut stage = Stage {
            world,
            player: Player::new(position, self.config.player),
            inventory,
            hostiles: Vec::new(),
        };

        let roster = self.director.current_stage().roster.clone();
        for kind in roster {
            if let Err(err) = self.spawn_hostile(&mut stage, kind, None) {
                tracing::warn!(%err, kind = kind.name(), "roster spawn skipped");
            }
        }

        self.events.send(GameEvent::StageReady {
            stage: index,
            biome: stage.world.biome().to_owned(),
            spawn_points: stage.world.remaining_spawns(),
        });
        tracing::info!(
            stage = index,
            hostiles = stage.hostiles.len(),
            spawn_points = stage.world.remaining_spawns(),
            "stage ready"
        );

        self.stage = Some(Box::new(stage));
        self.status = Status::Running;
        Ok(())
    }

    fn spawn_hostile(
        &mut self,
        stage: &mut Stage,
        kind: HostileKind,
        near: Option<(Vec3, f32)>,
    ) -> Result<EntityId, SpawnError> {
        let radius = self.config.archetypes.get(kind).radius;
        let position = match near {
            None => stage.world.spawn(ClaimMode::Keep, radius)?,
            Some((centre, range)) => {
                let offset = Vec3::new(
                    self.minion_rng.gen_range(-range..=range),
                    0.0,
                    self.minion_rng.gen_range(-range..=range),
                );
                stage.world.place_near(centre + offset, range, radius)?
            }
        };

        let id = EntityId(self.next_id);
        self.next_id += 1;
        stage
            .hostiles
            .push(HostileEntity::spawn(id, kind, position, &self.config.archetypes));
        self.director.register_spawn(kind);
        self.events.send(GameEvent::HostileSpawned {
            id,
            kind,
            position: [position.x, position.y, position.z],
        });
        tracing::debug!(%id, kind = kind.name(), ?position, "hostile spawned");
        Ok(id)
    }

    fn advance(&mut self, outcome: StageOutcome) {
        let cleared = self.director.session().stage;
        self.events.send(GameEvent::StageCleared { stage: cleared });

        match outcome {
            StageOutcome::Victory => {
                tracing::info!(stage = cleared, "campaign complete");
                self.status = Status::Victory;
                self.events.send(GameEvent::Victory);
            }
            StageOutcome::Advance { next } => {
                if let Some(stage) = self.stage.take() {
                    self.director.begin_transition(&stage.inventory);
                }
                self.start_loading(next);
            }
        }
    }

    fn defeat(&mut self) {
        tracing::warn!(stage = self.director.session().stage, "player died");
        self.status = Status::Defeat;
        self.events.send(GameEvent::PlayerDied);
    }

    fn ensure_running(&self) -> DelveResult<()> {
        match self.status {
            Status::Running => Ok(()),
            Status::Loading => Err(DelveError::Loading),
            Status::Victory | Status::Defeat => Err(DelveError::Finished),
            Status::Failed => Err(DelveError::StageFailed {
                stage: self.director.session().stage,
            }),
        }
    }
}

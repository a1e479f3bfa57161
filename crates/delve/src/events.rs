//! # Event System
//!
//! Outbound notifications from the simulation to whatever presents it (the
//! headless runner, a renderer, a test).
//!
//! ```text
//! ┌──────────────┐      ┌─────────────┐      ┌──────────────┐
//! │  Simulation  │─────>│    Event    │─────>│  Presenter   │
//! │ (AI, stage)  │      │   Channel   │      │ (log, tests) │
//! └──────────────┘      └─────────────┘      └──────────────┘
//! ```
//!
//! Bounded crossbeam channel: a full channel drops the event instead of
//! stalling the tick.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use delve_economy::RecipeId;
use delve_procedural::MaterialKind;

use crate::ai::{AiState, EntityId, HostileKind};
use crate::status::StatusKind;

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Events emitted by the simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    // =========================================================================
    // Stage Events
    // =========================================================================
    /// A stage started generating.
    StageLoading {
        /// Stage index.
        stage: usize,
        /// Biome name.
        biome: String,
    },

    /// A stage finished generating and navigation is baked.
    StageReady {
        /// Stage index.
        stage: usize,
        /// Biome name.
        biome: String,
        /// Spawn points available.
        spawn_points: usize,
    },

    /// The stage's progression rule was satisfied.
    StageCleared {
        /// Stage index.
        stage: usize,
    },

    /// The final stage was cleared.
    Victory,

    // =========================================================================
    // Hostile Events
    // =========================================================================
    /// A hostile entered the stage.
    HostileSpawned {
        /// Hostile id.
        id: EntityId,
        /// Kind.
        kind: HostileKind,
        /// Feet position.
        position: [f32; 3],
    },

    /// A hostile changed AI state.
    HostileStateChanged {
        /// Hostile id.
        id: EntityId,
        /// Previous state.
        from: AiState,
        /// New state.
        to: AiState,
    },

    /// A hostile took damage and survived.
    HostileDamaged {
        /// Hostile id.
        id: EntityId,
        /// Damage dealt.
        damage: u32,
        /// Health after the hit.
        health_remaining: u32,
    },

    /// A hostile died.
    HostileDied {
        /// Hostile id.
        id: EntityId,
        /// Kind, for kill filtering.
        kind: HostileKind,
    },

    /// A dead hostile left the simulation.
    HostileRemoved {
        /// Hostile id.
        id: EntityId,
    },

    /// A hostile left the arena and was removed without counting as a kill.
    HostileOutOfBounds {
        /// Hostile id.
        id: EntityId,
    },

    // =========================================================================
    // Player Events
    // =========================================================================
    /// A hostile hit the player.
    PlayerDamaged {
        /// Attacker.
        attacker: EntityId,
        /// Damage dealt.
        damage: u32,
        /// Health after the hit.
        health_remaining: u32,
        /// Effect applied, if any.
        effect: Option<StatusKind>,
    },

    /// Poison ticked on the player.
    PlayerPoisoned {
        /// Damage dealt.
        damage: u32,
        /// Health after the tick.
        health_remaining: u32,
    },

    /// The player ran out of health.
    PlayerDied,

    // =========================================================================
    // Economy Events
    // =========================================================================
    /// A block was mined out.
    BlockMined {
        /// Block position.
        position: [i32; 3],
        /// Block material.
        material: MaterialKind,
        /// Items granted.
        granted: u32,
    },

    /// A recipe completed.
    ItemCrafted {
        /// Recipe used.
        recipe: RecipeId,
        /// Items produced.
        outputs: Vec<(MaterialKind, u32)>,
    },
}

/// Event bus for simulation output.
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before new ones are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle (clone for multiple consumers).
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Creates a new pair of sender and receiver.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<GameEvent>,
}

impl EventSender {
    /// Sends an event without blocking.
    ///
    /// Returns `false` if the event was dropped.
    #[inline]
    pub fn send(&self, event: GameEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                tracing::warn!(?event, "event channel full, dropping");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<GameEvent>,
}

impl EventReceiver {
    /// Receives all pending events without blocking.
    #[inline]
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event, if any.
    #[inline]
    pub fn try_recv(&self) -> Option<GameEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

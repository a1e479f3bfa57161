//! Error types for the simulation crate.

use delve_economy::EconomyError;
use delve_procedural::ProceduralError;
use thiserror::Error;

/// Spawn placement failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// No safe coordinate could be produced.
    #[error("no valid spawn: {reason}")]
    NoValidSpawn {
        /// What ran out.
        reason: String,
    },
}

impl SpawnError {
    pub(crate) fn no_valid(reason: impl Into<String>) -> Self {
        Self::NoValidSpawn {
            reason: reason.into(),
        }
    }
}

/// Configuration loading failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML could not be parsed.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The TOML parsed but describes an unusable game.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level error for the simulation.
#[derive(Error, Debug)]
pub enum DelveError {
    /// Stage generation failed.
    #[error(transparent)]
    Procedural(#[from] ProceduralError),

    /// Inventory or crafting failed.
    #[error(transparent)]
    Economy(#[from] EconomyError),

    /// Spawning failed.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// Configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An operation needs a stage but none is loaded yet.
    #[error("stage is still loading")]
    Loading,

    /// The run ended in victory or defeat.
    #[error("the run is over")]
    Finished,

    /// A stage could not be generated or populated and the run stopped.
    #[error("stage {stage} could not be entered")]
    StageFailed {
        /// Index of the stage.
        stage: usize,
    },

    /// The background generation thread went away without a result.
    #[error("generation job disconnected")]
    JobDisconnected,
}

/// Result type for simulation operations.
pub type DelveResult<T> = Result<T, DelveError>;

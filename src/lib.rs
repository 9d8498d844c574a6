//! Resource Sentinel - depletion monitoring for resource probes
//!
//! Tracks a population of resource-monitoring probes attached to entities in
//! a simulated world, refreshes each probe's readings on an amortized
//! round-robin schedule, and derives a smoothed depletion rate and
//! time-to-exhaustion forecast per tracked product.

pub mod core;
pub mod model;
pub mod monitor;
pub mod probe;
pub mod registry;
pub mod scheduler;
pub mod signal;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentinelError {
    #[error("Probe not found: {0:?}")]
    ProbeNotFound(crate::core::types::EntityId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SentinelError>;

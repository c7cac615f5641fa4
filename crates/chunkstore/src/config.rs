//! Chunk store configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default age after which a stored chunk is considered stale.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Default number of peers queried in parallel per DHT lookup.
pub const ALPHA_VALUE: usize = 3;

/// Default number of peers that should hold a copy of each chunk.
pub const BACKUP: usize = 3;

/// Chunk store settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkStoreConfig {
    /// Maximum age of a record before reads evict it.
    pub expiry: Duration,
}

impl Default for ChunkStoreConfig {
    fn default() -> Self {
        Self {
            expiry: DEFAULT_EXPIRY,
        }
    }
}

impl ChunkStoreConfig {
    /// Config with the given expiry threshold.
    pub fn with_expiry(expiry: Duration) -> Self {
        Self { expiry }
    }
}

/// Placement parameters consumed by the DHT routing layer.
///
/// The chunk store only derives routing ids; these are carried for the
/// routing layer that decides which peers hold or are asked for a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingParams {
    /// Fan-out per lookup.
    pub alpha: usize,
    /// Replication target.
    pub backup: usize,
}

impl Default for RoutingParams {
    fn default() -> Self {
        Self {
            alpha: ALPHA_VALUE,
            backup: BACKUP,
        }
    }
}

/// Chunk store CLI arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::Args))]
#[cfg_attr(feature = "cli", command(next_help_heading = "Chunk Store"))]
#[serde(default)]
pub struct ChunkStoreArgs {
    /// Seconds after which a stored chunk expires.
    #[cfg_attr(
        feature = "cli",
        arg(long = "chunkstore.expiry-secs", default_value_t = DEFAULT_EXPIRY.as_secs())
    )]
    pub expiry_secs: u64,

    /// Peers queried in parallel per lookup.
    #[cfg_attr(feature = "cli", arg(long = "routing.alpha", default_value_t = ALPHA_VALUE))]
    pub alpha: usize,

    /// Peers that should hold a copy of each chunk.
    #[cfg_attr(feature = "cli", arg(long = "routing.backup", default_value_t = BACKUP))]
    pub backup: usize,
}

impl Default for ChunkStoreArgs {
    fn default() -> Self {
        Self {
            expiry_secs: DEFAULT_EXPIRY.as_secs(),
            alpha: ALPHA_VALUE,
            backup: BACKUP,
        }
    }
}

impl ChunkStoreArgs {
    /// Chunk store config from these arguments.
    pub fn store_config(&self) -> ChunkStoreConfig {
        ChunkStoreConfig::with_expiry(Duration::from_secs(self.expiry_secs))
    }

    /// Routing parameters from these arguments.
    pub fn routing_params(&self) -> RoutingParams {
        RoutingParams {
            alpha: self.alpha,
            backup: self.backup,
        }
    }
}

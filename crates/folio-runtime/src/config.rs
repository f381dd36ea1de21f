//! Runtime configuration.
//!
//! Durations are written the human way ("10s", "5m") and parsed with
//! `humantime`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use folio_core::ENRICHMENT_BATCH_SIZE;

use crate::resilience::CircuitBreakerConfig;

/// Configuration for the enrichment runner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Blocks per enricher call
    pub batch_size: usize,

    /// Per-batch deadline
    #[serde(with = "human_duration")]
    pub batch_timeout: Duration,

    /// Batches in flight at once
    pub max_concurrent_batches: usize,

    /// Cached annotations kept, by (enricher, block id)
    pub cache_capacity: u64,

    /// How long a cached annotation stays valid
    #[serde(with = "human_duration")]
    pub cache_ttl: Duration,

    pub circuit_breaker: CircuitBreakerConfig,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            batch_size: ENRICHMENT_BATCH_SIZE,
            batch_timeout: Duration::from_secs(10),
            max_concurrent_batches: 2,
            cache_capacity: 10_000,
            cache_ttl: Duration::from_secs(3600),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl EnrichmentConfig {
    /// Parse from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Batch size clamped to at least one block.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

/// Serde adapter for `humantime` durations.
pub(crate) mod human_duration {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(de::Error::custom)
    }
}

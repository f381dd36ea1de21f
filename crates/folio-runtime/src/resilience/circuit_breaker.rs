//! Enrichment circuits.
//!
//! There is one circuit per enricher and domain. A circuit trips after
//! `failure_threshold` consecutive failed batches and rejects batches until
//! `recovery_timeout` has passed. After that it admits trial batches: it
//! closes after `success_threshold` successful trials, and any failed trial
//! trips it again.
//!
//! Whether a tripped circuit is still rejecting or already on trial is
//! derived from the trip time on every read, so there is no timer.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use folio_core::{Domain, PipelineWarning};

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failed batches that trip a circuit
    pub failure_threshold: u32,

    /// How long a tripped circuit rejects batches
    #[serde(with = "crate::config::human_duration")]
    pub recovery_timeout: Duration,

    /// Successful trial batches that close a circuit again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// Identifies one circuit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CircuitKey {
    pub enricher: String,
    pub domain: Domain,
}

impl CircuitKey {
    pub fn new(enricher: impl Into<String>, domain: Domain) -> Self {
        Self {
            enricher: enricher.into(),
            domain,
        }
    }
}

impl fmt::Display for CircuitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.enricher, self.domain)
    }
}

/// Observable state of one circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed { consecutive_failures: u32 },

    /// Rejecting batches
    Open { retry_in: Duration },

    /// Admitting trial batches after the recovery timeout
    Trial { successes: u32 },
}

impl CircuitState {
    pub fn is_open(&self) -> bool {
        matches!(self, CircuitState::Open { .. })
    }
}

/// A circuit tripping, reported to the caller as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitTrip {
    pub key: CircuitKey,

    /// Failed batches that led to the trip, counting a failed trial as one
    pub failures: u32,

    /// Times this circuit has tripped since creation or reset
    pub trips: u32,

    pub retry_in: Duration,
}

impl From<&CircuitTrip> for PipelineWarning {
    fn from(trip: &CircuitTrip) -> Self {
        PipelineWarning {
            source: format!("circuit:{}", trip.key),
            message: format!(
                "enrichment circuit tripped after {} failed batch(es) (trip #{}); \
                 batches are rejected for {}",
                trip.failures,
                trip.trips,
                humantime::format_duration(trip.retry_in)
            ),
        }
    }
}

#[derive(Debug, Default, Clone)]
struct Circuit {
    consecutive_failures: u32,
    tripped_at: Option<Instant>,
    trial_successes: u32,
    trips: u32,
}

impl Circuit {
    fn state(&self, config: &CircuitBreakerConfig, now: Instant) -> CircuitState {
        match self.tripped_at {
            None => CircuitState::Closed {
                consecutive_failures: self.consecutive_failures,
            },
            Some(at) => {
                let elapsed = now.saturating_duration_since(at);
                if elapsed < config.recovery_timeout {
                    CircuitState::Open {
                        retry_in: config.recovery_timeout - elapsed,
                    }
                } else {
                    CircuitState::Trial {
                        successes: self.trial_successes,
                    }
                }
            }
        }
    }

    fn trip(&mut self, key: &CircuitKey, config: &CircuitBreakerConfig, now: Instant) -> CircuitTrip {
        let failures = self.consecutive_failures.max(1);
        self.tripped_at = Some(now);
        self.trial_successes = 0;
        self.consecutive_failures = 0;
        self.trips += 1;
        CircuitTrip {
            key: key.clone(),
            failures,
            trips: self.trips,
            retry_in: config.recovery_timeout,
        }
    }
}

/// Circuits for every enricher and domain a runner has seen.
pub struct CircuitBreaker {
    circuits: RwLock<HashMap<CircuitKey, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state; unseen circuits are closed.
    pub fn state(&self, key: &CircuitKey) -> CircuitState {
        self.circuits
            .read()
            .get(key)
            .map(|c| c.state(&self.config, Instant::now()))
            .unwrap_or(CircuitState::Closed {
                consecutive_failures: 0,
            })
    }

    /// Admit a batch, or return how long the circuit keeps rejecting.
    pub fn admit(&self, key: &CircuitKey) -> Result<(), Duration> {
        match self.state(key) {
            CircuitState::Open { retry_in } => Err(retry_in),
            _ => Ok(()),
        }
    }

    pub fn record_success(&self, key: &CircuitKey) {
        let now = Instant::now();
        let mut circuits = self.circuits.write();
        let Some(circuit) = circuits.get_mut(key) else {
            return;
        };

        match circuit.state(&self.config, now) {
            CircuitState::Closed { .. } => circuit.consecutive_failures = 0,
            CircuitState::Trial { successes } => {
                if successes + 1 >= self.config.success_threshold {
                    *circuit = Circuit {
                        trips: circuit.trips,
                        ..Circuit::default()
                    };
                    tracing::info!(circuit = %key, "Enrichment circuit closed");
                } else {
                    circuit.trial_successes = successes + 1;
                }
            }
            // A batch admitted before the trip finished late
            CircuitState::Open { .. } => {}
        }
    }

    /// Record a failed batch. Returns the trip if this failure tripped the
    /// circuit.
    pub fn record_failure(&self, key: &CircuitKey) -> Option<CircuitTrip> {
        let now = Instant::now();
        let mut circuits = self.circuits.write();
        let circuit = circuits.entry(key.clone()).or_default();

        let trip = match circuit.state(&self.config, now) {
            CircuitState::Closed {
                consecutive_failures,
            } => {
                circuit.consecutive_failures = consecutive_failures + 1;
                (circuit.consecutive_failures >= self.config.failure_threshold)
                    .then(|| circuit.trip(key, &self.config, now))
            }
            CircuitState::Trial { .. } => Some(circuit.trip(key, &self.config, now)),
            CircuitState::Open { .. } => None,
        };

        if let Some(trip) = &trip {
            tracing::debug!(circuit = %key, trips = trip.trips, "Enrichment circuit tripped");
        }
        trip
    }

    /// Close every circuit and forget trip counts.
    pub fn reset(&self) {
        self.circuits.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failure_threshold: u32, recovery_timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold,
            recovery_timeout,
            success_threshold: 1,
        })
    }

    fn gloss(domain: Domain) -> CircuitKey {
        CircuitKey::new("gloss", domain)
    }

    #[test]
    fn test_unseen_circuit_is_closed() {
        let cb = CircuitBreaker::default();
        assert_eq!(
            cb.state(&gloss(Domain::Legal)),
            CircuitState::Closed {
                consecutive_failures: 0
            }
        );
        assert!(cb.admit(&gloss(Domain::Legal)).is_ok());
    }

    #[test]
    fn test_threshold_one_trips_on_first_failure() {
        let cb = breaker(1, Duration::from_secs(30));
        let key = gloss(Domain::Linguistic);

        let trip = cb.record_failure(&key).unwrap();
        assert_eq!(trip.failures, 1);
        assert_eq!(trip.trips, 1);
        assert_eq!(trip.retry_in, Duration::from_secs(30));
        assert!(cb.state(&key).is_open());
        assert!(cb.admit(&key).is_err());
    }

    #[test]
    fn test_trips_only_at_threshold() {
        let cb = breaker(2, Duration::from_secs(30));
        let key = gloss(Domain::Legal);

        assert!(cb.record_failure(&key).is_none());
        assert!(cb.admit(&key).is_ok());
        assert!(cb.record_failure(&key).is_some());
        assert!(cb.admit(&key).is_err());

        // Further failures while open do not trip again
        assert!(cb.record_failure(&key).is_none());
    }

    #[test]
    fn test_success_clears_failure_streak() {
        let cb = CircuitBreaker::default();
        let key = gloss(Domain::Linguistic);

        cb.record_failure(&key);
        cb.record_failure(&key);
        cb.record_success(&key);
        assert_eq!(
            cb.state(&key),
            CircuitState::Closed {
                consecutive_failures: 0
            }
        );

        cb.record_failure(&key);
        cb.record_failure(&key);
        assert!(cb.admit(&key).is_ok());
    }

    #[test]
    fn test_circuits_are_per_enricher_and_domain() {
        let cb = breaker(1, Duration::from_secs(30));
        cb.record_failure(&gloss(Domain::Legal));

        assert!(cb.admit(&gloss(Domain::Legal)).is_err());
        assert!(cb.admit(&gloss(Domain::Linguistic)).is_ok());
        assert!(cb.admit(&CircuitKey::new("speaker", Domain::Legal)).is_ok());
    }

    #[test]
    fn test_trial_success_closes() {
        let cb = breaker(1, Duration::ZERO);
        let key = gloss(Domain::Legal);
        cb.record_failure(&key);

        // Zero recovery timeout: the tripped circuit is on trial at once
        assert_eq!(cb.state(&key), CircuitState::Trial { successes: 0 });
        assert!(cb.admit(&key).is_ok());

        cb.record_success(&key);
        assert_eq!(
            cb.state(&key),
            CircuitState::Closed {
                consecutive_failures: 0
            }
        );
    }

    #[test]
    fn test_failed_trial_trips_again_and_counts_trips() {
        let cb = breaker(1, Duration::ZERO);
        let key = gloss(Domain::Legal);

        assert_eq!(cb.record_failure(&key).unwrap().trips, 1);
        let again = cb.record_failure(&key).unwrap();
        assert_eq!(again.trips, 2);
        assert_eq!(again.failures, 1);
    }

    #[test]
    fn test_trip_becomes_warning() {
        let trip = CircuitTrip {
            key: gloss(Domain::Legal),
            failures: 3,
            trips: 1,
            retry_in: Duration::from_secs(30),
        };
        let warning = PipelineWarning::from(&trip);
        assert_eq!(warning.source, "circuit:gloss/legal");
        assert!(warning.message.contains("3 failed batch(es)"));
        assert!(warning.message.contains("30s"));
    }

    #[test]
    fn test_reset_closes_everything() {
        let cb = breaker(1, Duration::from_secs(30));
        cb.record_failure(&gloss(Domain::Legal));
        cb.reset();
        assert!(cb.admit(&gloss(Domain::Legal)).is_ok());
    }
}

//! Resilience for enrichment calls.

mod circuit_breaker;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitKey, CircuitState, CircuitTrip,
};

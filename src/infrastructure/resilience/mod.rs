pub mod circuit_breaker;
pub mod retry;

use std::sync::Arc;

use circuit_breaker::{BreakerConfig, BreakerStats, CircuitBreaker};

use crate::domain::payment::ProcessorKind;

/// The two per-replica breakers, shared between the dispatcher and the
/// health endpoints.
#[derive(Clone)]
pub struct Breakers {
	pub default:  Arc<CircuitBreaker>,
	pub fallback: Arc<CircuitBreaker>,
}

impl Breakers {
	pub fn new(config: BreakerConfig) -> Self {
		Self {
			default:  Arc::new(CircuitBreaker::new(
				ProcessorKind::Default,
				config,
			)),
			fallback: Arc::new(CircuitBreaker::new(
				ProcessorKind::Fallback,
				config,
			)),
		}
	}

	pub fn reset_all(&self) {
		self.default.reset();
		self.fallback.reset();
	}

	pub fn stats(&self) -> (BreakerStats, BreakerStats) {
		(self.default.stats(), self.fallback.stats())
	}
}

impl Default for Breakers {
	fn default() -> Self {
		Self::new(BreakerConfig::default())
	}
}

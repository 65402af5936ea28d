use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use log::{info, warn};
use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::errors::DispatchError;
use crate::domain::payment::ProcessorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
	Closed,
	Open,
	HalfOpen,
}

#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
	pub failure_threshold: u32,
	pub reset_timeout:     Duration,
	pub ring_capacity:     usize,
}

impl Default for BreakerConfig {
	fn default() -> Self {
		Self {
			failure_threshold: 3,
			reset_timeout:     Duration::from_secs(30),
			ring_capacity:     100,
		}
	}
}

/// Point-in-time view of one breaker, for the health endpoints. Reads are
/// not required to be consistent with in-flight mutations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakerStats {
	pub processor:            ProcessorKind,
	pub state:                BreakerState,
	pub failure_count:        u32,
	pub success_count:        u64,
	pub total_requests:       u64,
	#[serde(with = "time::serde::rfc3339::option")]
	pub last_failure_at:      Option<OffsetDateTime>,
	pub recorded_calls:       usize,
	pub avg_response_time_ms: f64,
}

struct BreakerInner {
	state:            BreakerState,
	failure_count:    u32,
	success_count:    u64,
	last_failure:     Option<Instant>,
	last_failure_at:  Option<OffsetDateTime>,
	response_times:   VecDeque<Duration>,
}

/// Per-processor, per-replica short-circuit state machine. Each replica
/// learns processor failures independently; breaker state is never shared
/// through the cache.
pub struct CircuitBreaker {
	processor:      ProcessorKind,
	config:         BreakerConfig,
	inner:          Mutex<BreakerInner>,
	total_requests: AtomicU64,
}

impl CircuitBreaker {
	pub fn new(processor: ProcessorKind, config: BreakerConfig) -> Self {
		Self {
			processor,
			config,
			inner: Mutex::new(BreakerInner {
				state:           BreakerState::Closed,
				failure_count:   0,
				success_count:   0,
				last_failure:    None,
				last_failure_at: None,
				response_times:  VecDeque::new(),
			}),
			total_requests: AtomicU64::new(0),
		}
	}

	pub fn processor(&self) -> ProcessorKind {
		self.processor
	}

	/// Runs `op` unless the breaker is open. An open breaker whose reset
	/// timeout has elapsed transitions to half-open and lets the call
	/// through as a probe.
	pub async fn execute<T, F, Fut>(&self, op: F) -> Result<T, DispatchError>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = Result<T, DispatchError>>,
	{
		self.total_requests.fetch_add(1, Ordering::Relaxed);

		{
			let mut inner = self.inner.lock().unwrap();
			if inner.state == BreakerState::Open {
				let cooled_down = inner
					.last_failure
					.map(|at| at.elapsed() >= self.config.reset_timeout)
					.unwrap_or(true);
				if cooled_down {
					info!(
						"Circuit breaker for {} processor entering half-open \
						 state.",
						self.processor
					);
					inner.state = BreakerState::HalfOpen;
				} else {
					return Err(DispatchError::CircuitOpen {
						processor: self.processor,
					});
				}
			}
		}

		let started = Instant::now();
		let result = op().await;
		let elapsed = started.elapsed();

		let mut inner = self.inner.lock().unwrap();
		if inner.response_times.len() == self.config.ring_capacity {
			inner.response_times.pop_front();
		}
		inner.response_times.push_back(elapsed);

		match &result {
			Ok(_) => {
				inner.success_count += 1;
				if inner.state == BreakerState::HalfOpen {
					info!(
						"Circuit breaker for {} processor closed after a \
						 successful probe.",
						self.processor
					);
					inner.state = BreakerState::Closed;
					inner.failure_count = 0;
				}
			}
			Err(e) => {
				inner.failure_count += 1;
				inner.last_failure = Some(Instant::now());
				inner.last_failure_at = Some(OffsetDateTime::now_utc());
				if inner.failure_count >= self.config.failure_threshold
					&& inner.state != BreakerState::Open
				{
					warn!(
						"Circuit breaker for {} processor opened after {} \
						 consecutive failures: {e}",
						self.processor, inner.failure_count
					);
					inner.state = BreakerState::Open;
				}
			}
		}

		result
	}

	pub fn current_state(&self) -> BreakerState {
		self.inner.lock().unwrap().state
	}

	pub fn stats(&self) -> BreakerStats {
		let inner = self.inner.lock().unwrap();
		let recorded = inner.response_times.len();
		let avg_ms = if recorded == 0 {
			0.0
		} else {
			let total: Duration = inner.response_times.iter().sum();
			total.as_millis() as f64 / recorded as f64
		};
		BreakerStats {
			processor:            self.processor,
			state:                inner.state,
			failure_count:        inner.failure_count,
			success_count:        inner.success_count,
			total_requests:       self.total_requests.load(Ordering::Relaxed),
			last_failure_at:      inner.last_failure_at,
			recorded_calls:       recorded,
			avg_response_time_ms: avg_ms,
		}
	}

	/// Administrative reset. `total_requests` is monotonic and survives.
	pub fn reset(&self) {
		let mut inner = self.inner.lock().unwrap();
		inner.state = BreakerState::Closed;
		inner.failure_count = 0;
		inner.success_count = 0;
		inner.last_failure = None;
		inner.last_failure_at = None;
		inner.response_times.clear();
		info!("Circuit breaker for {} processor reset.", self.processor);
	}

	pub fn force_open(&self) {
		let mut inner = self.inner.lock().unwrap();
		inner.state = BreakerState::Open;
		inner.last_failure = Some(Instant::now());
		inner.last_failure_at = Some(OffsetDateTime::now_utc());
	}
}

use std::future::Future;
use std::time::Duration;

use log::warn;
use rand::Rng;
use serde::Serialize;
use tokio::time::sleep;

use crate::domain::errors::DispatchError;

/// Bounded exponential backoff with jitter around a single operation.
/// Sits inside the circuit breaker: a breaker rejection never reaches
/// this layer, and the breaker only sees the final outcome of a run.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
	pub max_retries: u32,
	pub base_delay:  Duration,
	pub max_delay:   Duration,
	pub multiplier:  f64,
	pub jitter:      f64,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: 2,
			base_delay:  Duration::from_millis(500),
			max_delay:   Duration::from_secs(5),
			multiplier:  2.0,
			jitter:      0.1,
		}
	}
}

/// Wire view of the policy for the health endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrySnapshot {
	pub max_retries:   u32,
	pub base_delay_ms: u64,
	pub max_delay_ms:  u64,
	pub multiplier:    f64,
	pub jitter:        f64,
}

impl RetryPolicy {
	pub fn snapshot(&self) -> RetrySnapshot {
		RetrySnapshot {
			max_retries:   self.max_retries,
			base_delay_ms: self.base_delay.as_millis() as u64,
			max_delay_ms:  self.max_delay.as_millis() as u64,
			multiplier:    self.multiplier,
			jitter:        self.jitter,
		}
	}

	/// Invokes `op` up to `max_retries + 1` times, sleeping between
	/// attempts. Only transient errors are retried; the last error is
	/// propagated when attempts run out.
	pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, DispatchError>
	where
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<T, DispatchError>>,
	{
		let mut attempt = 0;
		loop {
			attempt += 1;
			match op().await {
				Ok(value) => return Ok(value),
				Err(e) if e.is_retryable() && attempt <= self.max_retries => {
					let delay = self.backoff_delay(attempt);
					warn!(
						"Attempt {attempt}/{} failed ({e}), retrying in \
						 {}ms.",
						self.max_retries + 1,
						delay.as_millis()
					);
					sleep(delay).await;
				}
				Err(e) => return Err(e),
			}
		}
	}

	/// `min(base × multiplier^(attempt-1) ± jitter, max)`.
	fn backoff_delay(&self, attempt: u32) -> Duration {
		let base = self.base_delay.as_millis() as f64
			* self.multiplier.powi(attempt as i32 - 1);
		let spread = base * self.jitter;
		let jittered = base + rand::rng().random_range(-spread..=spread);
		let capped = jittered
			.clamp(0.0, self.max_delay.as_millis() as f64);
		Duration::from_millis(capped as u64)
	}
}

use std::time::Duration;

use log::info;

use crate::domain::cache::{CacheStore, keys};
use crate::domain::health::ProcessorHealth;
use crate::infrastructure::processor::client::ProcessorClient;

/// Minimum spacing between two probes of the same processor.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Probes one processor and publishes the snapshot through the cache.
/// Dispatch-path readers only ever see the cached snapshot; they never
/// wait on a live probe.
#[derive(Clone)]
pub struct CheckProcessorHealthUseCase<C: CacheStore> {
	cache: C,
}

impl<C: CacheStore> CheckProcessorHealthUseCase<C> {
	pub fn new(cache: C) -> Self {
		Self { cache }
	}

	/// Returns the fresh snapshot, or `None` when the minimum interval
	/// since the last probe has not yet elapsed.
	pub async fn execute(
		&self,
		client: &ProcessorClient,
	) -> Option<ProcessorHealth> {
		let name = client.kind().as_str();
		let now_ms = unix_millis();

		if let Some(last) = self.cache.hget(keys::HEALTH_LAST_CHECK, name).await
			&& let Ok(last_ms) = last.parse::<i128>()
			&& now_ms - last_ms < POLL_INTERVAL.as_millis() as i128
		{
			return None;
		}

		let snapshot = client.health().await;
		info!(
			"{name} processor health refreshed: failing={}, \
			 minResponseTime={}ms",
			snapshot.failing, snapshot.min_response_time_ms
		);

		if let Ok(serialized) = serde_json::to_string(&snapshot) {
			self.cache
				.hset(keys::HEALTH_SNAPSHOTS, name, &serialized, keys::HEALTH_TTL)
				.await;
		}
		self.cache
			.hset(
				keys::HEALTH_LAST_CHECK,
				name,
				&now_ms.to_string(),
				keys::HEALTH_TTL,
			)
			.await;
		self.cache
			.lpush_capped(
				&keys::response_times(name),
				&snapshot.response_time_ms.to_string(),
				keys::RESPONSE_TIMES_CAP,
				keys::HEALTH_TTL,
			)
			.await;

		Some(snapshot)
	}
}

fn unix_millis() -> i128 {
	time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000
}

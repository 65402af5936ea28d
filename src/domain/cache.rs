use std::time::Duration;

use async_trait::async_trait;

/// Port onto the short-TTL key/value cache. Implementations absorb
/// backend failures (falling back to per-replica memory) so every
/// operation is infallible from the caller's point of view.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
	async fn get(&self, key: &str) -> Option<String>;
	async fn set(&self, key: &str, value: &str, ttl: Duration);
	async fn del(&self, key: &str);
	/// Deletes every key matching `pattern`. Only used for the
	/// `payment:summary:*` purge after a successful write.
	async fn del_matching(&self, pattern: &str);
	async fn hget(&self, key: &str, field: &str) -> Option<String>;
	async fn hset(&self, key: &str, field: &str, value: &str, ttl: Duration);
	/// Push onto the head of a list, trimming it to `cap` entries.
	async fn lpush_capped(
		&self,
		key: &str,
		value: &str,
		cap: usize,
		ttl: Duration,
	);
	async fn lrange(&self, key: &str, limit: usize) -> Vec<String>;
}

/// Cache key families and their TTLs.
pub mod keys {
	use std::time::Duration;

	use time::OffsetDateTime;
	use time::format_description::well_known::Rfc3339;
	use uuid::Uuid;

	pub const HEALTH_SNAPSHOTS: &str = "health:cache";
	pub const HEALTH_LAST_CHECK: &str = "health:last_check";
	pub const SUMMARY_PATTERN: &str = "payment:summary:*";
	pub const RESPONSE_TIMES_PATTERN: &str = "health:response_times:*";

	pub const HEALTH_TTL: Duration = Duration::from_secs(3600);
	pub const CORRELATION_TTL: Duration = Duration::from_secs(600);
	pub const RESPONSE_TIMES_CAP: usize = 50;

	pub fn response_times(processor: &str) -> String {
		format!("health:response_times:{processor}")
	}

	pub fn correlation(id: &Uuid) -> String {
		format!("payment:correlation:{id}")
	}

	/// Summary keys are built from normalized timestamps, with `"null"`
	/// standing in for an unbounded side.
	pub fn summary(
		from: Option<OffsetDateTime>,
		to: Option<OffsetDateTime>,
	) -> String {
		let side = |bound: Option<OffsetDateTime>| {
			bound
				.and_then(|ts| ts.format(&Rfc3339).ok())
				.unwrap_or_else(|| "null".to_string())
		};
		format!("payment:summary:{}:{}", side(from), side(to))
	}
}

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Sentinel reported when a processor could not be probed at all.
pub const UNREACHABLE_RESPONSE_TIME_MS: u64 = 999_999;

/// Last observed health of one processor, published by the health poller
/// and read by the dispatcher and the stats endpoints. Staleness is
/// bounded by the poll interval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorHealth {
	pub failing:              bool,
	pub min_response_time_ms: u64,
	pub response_time_ms:     u64,
	#[serde(with = "time::serde::rfc3339")]
	pub last_checked_at:      OffsetDateTime,
	pub is_healthy:           bool,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub error:                Option<String>,
	#[serde(skip_serializing_if = "Option::is_none", default)]
	pub status_code:          Option<u16>,
}

impl ProcessorHealth {
	pub fn reachable(
		failing: bool,
		min_response_time_ms: u64,
		response_time_ms: u64,
	) -> Self {
		Self {
			failing,
			min_response_time_ms,
			response_time_ms,
			last_checked_at: OffsetDateTime::now_utc(),
			is_healthy: !failing,
			error: None,
			status_code: None,
		}
	}

	pub fn unreachable(
		response_time_ms: u64,
		error: String,
		status_code: Option<u16>,
	) -> Self {
		Self {
			failing: true,
			min_response_time_ms: UNREACHABLE_RESPONSE_TIME_MS,
			response_time_ms,
			last_checked_at: OffsetDateTime::now_utc(),
			is_healthy: false,
			error: Some(error),
			status_code,
		}
	}
}

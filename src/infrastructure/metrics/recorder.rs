use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use log::warn;
use serde::Serialize;
use time::OffsetDateTime;

const SAMPLE_CAPACITY: usize = 1000;
const PERCENTILE_WINDOW: usize = 100;
const THROUGHPUT_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Sample {
	at: OffsetDateTime,
	ms: u64,
	ok: bool,
}

/// Derived view for `/health/performance`. Latency figures cover the last
/// 100 samples; throughput covers the last 60 seconds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
	pub avg_ms:         f64,
	pub min_ms:         u64,
	pub max_ms:         u64,
	pub p50_ms:         u64,
	pub p95_ms:         u64,
	pub p99_ms:         u64,
	pub throughput_rps: f64,
	pub success_rate:   f64,
	pub sample_count:   usize,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTotals {
	pub total:     u64,
	pub succeeded: u64,
	pub failed:    u64,
}

/// Per-replica ring of recent request outcomes. Derived values are
/// recomputed on demand from a sliced tail; nothing is pre-aggregated.
pub struct MetricsRecorder {
	samples:          Mutex<VecDeque<Sample>>,
	totals:           Mutex<RequestTotals>,
	p99_threshold_ms: u64,
}

fn percentile(sorted: &[u64], quantile: f64) -> u64 {
	if sorted.is_empty() {
		return 0;
	}
	// Nearest-rank: the smallest value covering `quantile` of the samples.
	let rank = (quantile * sorted.len() as f64).ceil() as usize;
	sorted[rank.clamp(1, sorted.len()) - 1]
}

impl MetricsRecorder {
	pub fn new(p99_threshold_ms: u64) -> Self {
		Self {
			samples: Mutex::new(VecDeque::with_capacity(SAMPLE_CAPACITY)),
			totals: Mutex::new(RequestTotals {
				total:     0,
				succeeded: 0,
				failed:    0,
			}),
			p99_threshold_ms,
		}
	}

	pub fn record(&self, duration: Duration, ok: bool) {
		let ms = duration.as_millis() as u64;
		let p99 = {
			let mut samples = self.samples.lock().unwrap();
			if samples.len() == SAMPLE_CAPACITY {
				samples.pop_front();
			}
			samples.push_back(Sample {
				at: OffsetDateTime::now_utc(),
				ms,
				ok,
			});
			let mut tail: Vec<u64> = samples
				.iter()
				.rev()
				.take(PERCENTILE_WINDOW)
				.map(|s| s.ms)
				.collect();
			tail.sort_unstable();
			percentile(&tail, 0.99)
		};

		{
			let mut totals = self.totals.lock().unwrap();
			totals.total += 1;
			if ok {
				totals.succeeded += 1;
			} else {
				totals.failed += 1;
			}
		}

		if p99 > self.p99_threshold_ms {
			warn!(
				"p99 latency {p99}ms exceeds the {}ms threshold.",
				self.p99_threshold_ms
			);
		}
	}

	pub fn totals(&self) -> RequestTotals {
		*self.totals.lock().unwrap()
	}

	pub fn performance(&self) -> PerformanceReport {
		let samples = self.samples.lock().unwrap();
		let tail: Vec<Sample> = samples
			.iter()
			.rev()
			.take(PERCENTILE_WINDOW)
			.copied()
			.collect();

		let mut sorted: Vec<u64> = tail.iter().map(|s| s.ms).collect();
		sorted.sort_unstable();

		let avg_ms = if sorted.is_empty() {
			0.0
		} else {
			sorted.iter().sum::<u64>() as f64 / sorted.len() as f64
		};
		let success_rate = if tail.is_empty() {
			1.0
		} else {
			tail.iter().filter(|s| s.ok).count() as f64 / tail.len() as f64
		};

		let window_start = OffsetDateTime::now_utc() - THROUGHPUT_WINDOW;
		let recent = samples.iter().filter(|s| s.at >= window_start).count();
		let throughput_rps =
			recent as f64 / THROUGHPUT_WINDOW.as_secs() as f64;

		PerformanceReport {
			avg_ms,
			min_ms: sorted.first().copied().unwrap_or(0),
			max_ms: sorted.last().copied().unwrap_or(0),
			p50_ms: percentile(&sorted, 0.50),
			p95_ms: percentile(&sorted, 0.95),
			p99_ms: percentile(&sorted, 0.99),
			throughput_rps,
			success_rate,
			sample_count: samples.len(),
		}
	}
}

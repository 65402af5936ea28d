use std::time::Duration;

use log::warn;

use crate::domain::cache::{CacheStore, keys};
use crate::domain::consistency;
use crate::domain::errors::DispatchError;
use crate::domain::ledger::LedgerRepository;
use crate::domain::payment::ProcessorKind;
use crate::use_cases::dto::{
	GetPaymentSummaryQuery, PaymentsSummaryResponse, ProcessorSummary,
};

/// Serves `(from, to)` summary queries through the cache, falling back to
/// the ledger. Cached payloads are re-validated before being trusted.
#[derive(Clone)]
pub struct GetPaymentSummaryUseCase<L: LedgerRepository, C: CacheStore> {
	ledger:    L,
	cache:     C,
	cache_ttl: Duration,
}

impl<L: LedgerRepository, C: CacheStore> GetPaymentSummaryUseCase<L, C> {
	pub fn new(ledger: L, cache: C, cache_ttl: Duration) -> Self {
		Self {
			ledger,
			cache,
			cache_ttl,
		}
	}

	pub async fn execute(
		&self,
		query: GetPaymentSummaryQuery,
	) -> Result<PaymentsSummaryResponse, DispatchError> {
		let range = consistency::date_range(query.from, query.to);
		if !range.passed {
			return Err(DispatchError::Validation {
				failures: vec![range],
			});
		}

		let key = keys::summary(query.from, query.to);
		if let Some(cached) = self.cache.get(&key).await {
			match validated(&cached) {
				Some(summary) => return Ok(summary),
				None => warn!(
					"Cached summary for {key} failed consistency checks, \
					 recomputing from the ledger."
				),
			}
		}

		let summary = self.fetch(query).await?;

		// Assertion on the freshly computed result. A failure here means
		// the ledger returned something impossible; serve it uncached.
		let value = serde_json::to_value(&summary).unwrap_or_default();
		let failed: Vec<_> = consistency::summary_checks(&value)
			.into_iter()
			.filter(|outcome| !outcome.passed)
			.collect();
		if !failed.is_empty() {
			warn!("Summary consistency warning: {failed:?}");
			return Ok(summary);
		}

		if let Ok(serialized) = serde_json::to_string(&summary) {
			self.cache.set(&key, &serialized, self.cache_ttl).await;
		}
		Ok(summary)
	}

	async fn fetch(
		&self,
		query: GetPaymentSummaryQuery,
	) -> Result<PaymentsSummaryResponse, DispatchError> {
		let totals = self.ledger.get_summary(query.from, query.to).await?;

		let mut summary = PaymentsSummaryResponse::zero();
		for row in totals {
			let side = match row.processor {
				ProcessorKind::Default => &mut summary.default,
				ProcessorKind::Fallback => &mut summary.fallback,
				// Simulated charges do not participate in summaries.
				ProcessorKind::Simulated => continue,
			};
			*side = ProcessorSummary {
				total_requests: row.total_requests,
				total_amount:   row.total_amount,
			};
		}
		Ok(summary)
	}
}

fn validated(cached: &str) -> Option<PaymentsSummaryResponse> {
	let value: serde_json::Value = serde_json::from_str(cached).ok()?;
	if consistency::summary_checks(&value)
		.iter()
		.any(|outcome| !outcome.passed)
	{
		return None;
	}
	serde_json::from_value(value).ok()
}

use std::sync::Arc;
use std::time::Instant;

use log::{error, info, warn};
use time::OffsetDateTime;

use crate::domain::cache::{CacheStore, keys};
use crate::domain::consistency;
use crate::domain::errors::DispatchError;
use crate::domain::ledger::LedgerRepository;
use crate::domain::payment::ProcessorKind;
use crate::infrastructure::audit::log::{AuditLog, AuditStage};
use crate::infrastructure::metrics::recorder::MetricsRecorder;
use crate::infrastructure::processor::client::{
	ProcessorClient, ProcessorPaymentRequest,
};
use crate::infrastructure::resilience::Breakers;
use crate::infrastructure::resilience::circuit_breaker::CircuitBreaker;
use crate::infrastructure::resilience::retry::RetryPolicy;
use crate::use_cases::dto::{PaymentAccepted, SubmitPaymentCommand};

/// Top-level per-request control: validate, try the default processor
/// through breaker and retry, fall back, optionally simulate, persist,
/// invalidate caches, record metrics. Within one submission the default
/// attempt strictly precedes any fallback attempt, and the ledger write
/// strictly precedes cache invalidation and the response.
#[derive(Clone)]
pub struct SubmitPaymentUseCase<L: LedgerRepository, C: CacheStore> {
	ledger:            L,
	cache:             C,
	default_client:    ProcessorClient,
	fallback_client:   ProcessorClient,
	breakers:          Breakers,
	retry:             RetryPolicy,
	metrics:           Arc<MetricsRecorder>,
	audit:             Arc<AuditLog>,
	simulate_payments: bool,
}

impl<L, C> SubmitPaymentUseCase<L, C>
where
	L: LedgerRepository + Clone,
	C: CacheStore + Clone,
{
	#[allow(clippy::too_many_arguments)]
	pub fn new(
		ledger: L,
		cache: C,
		default_client: ProcessorClient,
		fallback_client: ProcessorClient,
		breakers: Breakers,
		retry: RetryPolicy,
		metrics: Arc<MetricsRecorder>,
		audit: Arc<AuditLog>,
		simulate_payments: bool,
	) -> Self {
		Self {
			ledger,
			cache,
			default_client,
			fallback_client,
			breakers,
			retry,
			metrics,
			audit,
			simulate_payments,
		}
	}

	pub async fn execute(
		&self,
		command: SubmitPaymentCommand,
	) -> Result<PaymentAccepted, DispatchError> {
		let started = Instant::now();
		let requested_at = OffsetDateTime::now_utc();
		let correlation_id = command.correlation_id;

		let failures: Vec<_> =
			consistency::preflight(&correlation_id, command.amount)
				.into_iter()
				.filter(|outcome| !outcome.passed)
				.collect();
		if !failures.is_empty() {
			warn!(
				"Payment {correlation_id} rejected by pre-flight checks: \
				 {failures:?}"
			);
			self.audit.record(
				Some(correlation_id),
				AuditStage::Rejected,
				None,
				Some("pre-flight validation failed".to_string()),
			);
			return Err(DispatchError::Validation { failures });
		}

		// Best-effort duplicate observation; the store's unique index is
		// the enforcer.
		let seen = self
			.cache
			.get(&keys::correlation(&correlation_id))
			.await
			.is_some();
		if !consistency::no_duplicate_correlation_id(seen).passed {
			warn!(
				"Duplicate submission observed for {correlation_id}; the \
				 ledger will keep the original row."
			);
		}

		self.audit
			.record(Some(correlation_id), AuditStage::Received, None, None);

		let wire = ProcessorPaymentRequest {
			correlation_id,
			amount: command.amount,
			requested_at,
		};

		let processor = match self
			.attempt(&self.default_client, &self.breakers.default, &wire)
			.await
		{
			Ok(()) => ProcessorKind::Default,
			Err(default_err) => {
				match self
					.attempt(&self.fallback_client, &self.breakers.fallback, &wire)
					.await
				{
					Ok(()) => ProcessorKind::Fallback,
					Err(fallback_err) if self.simulate_payments => {
						warn!(
							"Both processors failed for {correlation_id} \
							 (default: {default_err}; fallback: \
							 {fallback_err}), recording a simulated success."
						);
						self.audit.record(
							Some(correlation_id),
							AuditStage::Simulated,
							Some(ProcessorKind::Simulated),
							None,
						);
						ProcessorKind::Simulated
					}
					Err(fallback_err) => {
						error!(
							"Payment {correlation_id} could not be processed \
							 by any processor. default: {default_err}; \
							 fallback: {fallback_err}"
						);
						self.audit.record(
							Some(correlation_id),
							AuditStage::Rejected,
							None,
							Some(fallback_err.to_string()),
						);
						self.metrics.record(started.elapsed(), false);
						return Err(DispatchError::Unavailable);
					}
				}
			}
		};

		// The processor charge is authoritative from here on: a ledger
		// failure surfaces as PERSISTENCE with no compensation.
		if let Err(e) = self
			.ledger
			.put_payment(correlation_id, command.amount, processor, requested_at)
			.await
		{
			self.audit.record(
				Some(correlation_id),
				AuditStage::PersistenceFailed,
				Some(processor),
				Some(e.to_string()),
			);
			self.metrics.record(started.elapsed(), false);
			return Err(e);
		}
		self.audit.record(
			Some(correlation_id),
			AuditStage::Persisted,
			Some(processor),
			None,
		);

		self.cache.del_matching(keys::SUMMARY_PATTERN).await;
		self.cache
			.set(
				&keys::correlation(&correlation_id),
				processor.as_str(),
				keys::CORRELATION_TTL,
			)
			.await;

		self.metrics.record(started.elapsed(), true);
		info!(
			"Payment {correlation_id} processed by {processor} processor."
		);

		Ok(PaymentAccepted {
			correlation_id,
			amount: command.amount,
			processor,
		})
	}

	/// One processor attempt: Breaker(Retry(Call)). A breaker rejection
	/// is immediate and terminal for this processor; retries happen only
	/// inside an admitted call, so they never individually count against
	/// the breaker.
	async fn attempt(
		&self,
		client: &ProcessorClient,
		breaker: &CircuitBreaker,
		wire: &ProcessorPaymentRequest,
	) -> Result<(), DispatchError> {
		self.audit.record(
			Some(wire.correlation_id),
			AuditStage::AttemptStarted,
			Some(client.kind()),
			None,
		);

		let outcome = breaker
			.execute(|| self.retry.run(|| client.pay(wire)))
			.await;

		match &outcome {
			Ok(()) => self.audit.record(
				Some(wire.correlation_id),
				AuditStage::ProcessorAccepted,
				Some(client.kind()),
				None,
			),
			Err(e) => self.audit.record(
				Some(wire.correlation_id),
				AuditStage::AttemptFailed,
				Some(client.kind()),
				Some(e.to_string()),
			),
		}
		outcome
	}
}

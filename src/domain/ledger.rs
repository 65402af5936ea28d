use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::errors::DispatchError;
use crate::domain::payment::{Payment, ProcessorKind};

/// Aggregate totals for one processor over a queried interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorTotals {
	pub processor:      ProcessorKind,
	pub total_requests: i64,
	pub total_amount:   f64,
}

/// Port onto the relational ledger. Store failures surface as
/// [`DispatchError::Persistence`]; a `correlation_id` conflict is never
/// an error.
#[async_trait]
pub trait LedgerRepository: Send + Sync + 'static {
	/// Insert a `processed` row. On conflict the original record wins and
	/// the call returns without error.
	async fn put_payment(
		&self,
		correlation_id: Uuid,
		amount: f64,
		processor: ProcessorKind,
		requested_at: OffsetDateTime,
	) -> Result<(), DispatchError>;

	/// Per-processor totals over `status = processed` rows within the
	/// closed `[from, to]` interval; either bound may be absent.
	async fn get_summary(
		&self,
		from: Option<OffsetDateTime>,
		to: Option<OffsetDateTime>,
	) -> Result<Vec<ProcessorTotals>, DispatchError>;

	async fn get_payment(
		&self,
		correlation_id: Uuid,
	) -> Result<Option<Payment>, DispatchError>;
}

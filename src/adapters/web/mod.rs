pub mod errors;
pub mod health_handlers;
pub mod payments_handler;
pub mod payments_summary_handler;
pub mod schema;

use crate::infrastructure::cache::redis_cache::RedisCache;
use crate::infrastructure::persistence::postgres_ledger::PostgresLedger;
use crate::use_cases::get_payment_summary::GetPaymentSummaryUseCase;
use crate::use_cases::submit_payment::SubmitPaymentUseCase;

/// Concrete use-case types the handlers are wired with.
pub type SubmitPayment = SubmitPaymentUseCase<PostgresLedger, RedisCache>;
pub type GetPaymentSummary =
	GetPaymentSummaryUseCase<PostgresLedger, RedisCache>;

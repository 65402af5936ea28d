use std::sync::Arc;
use std::time::Duration;

use payment_relay::domain::errors::DispatchError;
use payment_relay::domain::ledger::LedgerRepository;
use payment_relay::domain::payment::ProcessorKind;
use payment_relay::infrastructure::audit::log::AuditLog;
use payment_relay::infrastructure::cache::redis_cache::RedisCache;
use payment_relay::infrastructure::metrics::recorder::MetricsRecorder;
use payment_relay::infrastructure::persistence::postgres_ledger::PostgresLedger;
use payment_relay::infrastructure::processor::client::ProcessorClient;
use payment_relay::infrastructure::resilience::Breakers;
use payment_relay::infrastructure::resilience::retry::RetryPolicy;
use payment_relay::use_cases::dto::SubmitPaymentCommand;
use payment_relay::use_cases::submit_payment::SubmitPaymentUseCase;
use uuid::Uuid;

mod support;

use crate::support::postgres_container::setup_postgres;
use crate::support::redis_container::setup_redis;
use crate::support::stub_processor::StubProcessor;

// Unroutable quickly: nothing listens on port 1.
const DEAD_PROCESSOR: &str = "http://127.0.0.1:1";

fn fast_retry() -> RetryPolicy {
	RetryPolicy {
		max_retries: 2,
		base_delay:  Duration::from_millis(1),
		max_delay:   Duration::from_millis(10),
		multiplier:  2.0,
		jitter:      0.1,
	}
}

fn build_use_case(
	ledger: PostgresLedger,
	cache: RedisCache,
	default_url: &str,
	fallback_url: &str,
	breakers: Breakers,
	simulate_payments: bool,
) -> SubmitPaymentUseCase<PostgresLedger, RedisCache> {
	let http_client = reqwest::Client::builder()
		.timeout(Duration::from_secs(2))
		.build()
		.unwrap();

	SubmitPaymentUseCase::new(
		ledger,
		cache,
		ProcessorClient::new(
			ProcessorKind::Default,
			default_url,
			http_client.clone(),
		),
		ProcessorClient::new(ProcessorKind::Fallback, fallback_url, http_client),
		breakers,
		fast_retry(),
		Arc::new(MetricsRecorder::new(1000)),
		Arc::new(AuditLog::new()),
		simulate_payments,
	)
}

fn command(amount: f64) -> SubmitPaymentCommand {
	SubmitPaymentCommand {
		correlation_id: Uuid::new_v4(),
		amount,
	}
}

#[actix_web::test]
async fn test_submit_happy_path_uses_default_processor() {
	let postgres = setup_postgres().await;
	let redis = setup_redis().await;
	let default = StubProcessor::healthy().await;
	let fallback = StubProcessor::healthy().await;

	let use_case = build_use_case(
		postgres.ledger.clone(),
		redis.cache.clone(),
		&default.url,
		&fallback.url,
		Breakers::default(),
		false,
	);

	let cmd = command(100.50);
	let accepted = use_case.execute(cmd).await.unwrap();

	assert_eq!(accepted.processor, ProcessorKind::Default);
	assert_eq!(accepted.correlation_id, cmd.correlation_id);
	assert_eq!(default.received_count(), 1);
	assert_eq!(fallback.received_count(), 0);

	let row = postgres
		.ledger
		.get_payment(cmd.correlation_id)
		.await
		.unwrap()
		.unwrap();
	assert_eq!(row.amount, 100.50);
	assert_eq!(row.processor, ProcessorKind::Default);
}

#[actix_web::test]
async fn test_submit_falls_back_when_default_keeps_failing() {
	let postgres = setup_postgres().await;
	let redis = setup_redis().await;
	let default = StubProcessor::failing_first(-1, 500).await;
	let fallback = StubProcessor::healthy().await;
	let breakers = Breakers::default();

	let use_case = build_use_case(
		postgres.ledger.clone(),
		redis.cache.clone(),
		&default.url,
		&fallback.url,
		breakers.clone(),
		false,
	);

	let accepted = use_case.execute(command(50.00)).await.unwrap();

	assert_eq!(accepted.processor, ProcessorKind::Fallback);
	// Initial attempt plus max_retries against the default processor.
	assert_eq!(default.received_count(), 3);
	assert_eq!(fallback.received_count(), 1);
	assert!(breakers.default.stats().failure_count >= 1);
}

#[actix_web::test]
async fn test_open_breaker_bypasses_default_without_retrying() {
	let postgres = setup_postgres().await;
	let redis = setup_redis().await;
	let default = StubProcessor::healthy().await;
	let fallback = StubProcessor::healthy().await;
	let breakers = Breakers::default();
	breakers.default.force_open();

	let use_case = build_use_case(
		postgres.ledger.clone(),
		redis.cache.clone(),
		&default.url,
		&fallback.url,
		breakers,
		false,
	);

	let accepted = use_case.execute(command(10.00)).await.unwrap();

	assert_eq!(accepted.processor, ProcessorKind::Fallback);
	assert_eq!(default.received_count(), 0);
	assert_eq!(fallback.received_count(), 1);
}

#[actix_web::test]
async fn test_simulation_mode_records_success_when_both_fail() {
	let postgres = setup_postgres().await;
	let redis = setup_redis().await;

	let use_case = build_use_case(
		postgres.ledger.clone(),
		redis.cache.clone(),
		DEAD_PROCESSOR,
		DEAD_PROCESSOR,
		Breakers::default(),
		true,
	);

	let cmd = command(42.00);
	let accepted = use_case.execute(cmd).await.unwrap();
	assert_eq!(accepted.processor, ProcessorKind::Simulated);

	let row = postgres
		.ledger
		.get_payment(cmd.correlation_id)
		.await
		.unwrap()
		.unwrap();
	assert_eq!(row.processor, ProcessorKind::Simulated);
}

#[actix_web::test]
async fn test_both_processors_down_surfaces_unavailable() {
	let postgres = setup_postgres().await;
	let redis = setup_redis().await;

	let use_case = build_use_case(
		postgres.ledger.clone(),
		redis.cache.clone(),
		DEAD_PROCESSOR,
		DEAD_PROCESSOR,
		Breakers::default(),
		false,
	);

	let result = use_case.execute(command(42.00)).await;
	assert!(matches!(result, Err(DispatchError::Unavailable)));
}

#[actix_web::test]
async fn test_duplicate_submit_keeps_one_ledger_row() {
	let postgres = setup_postgres().await;
	let redis = setup_redis().await;
	let default = StubProcessor::healthy().await;
	let fallback = StubProcessor::healthy().await;

	let use_case = build_use_case(
		postgres.ledger.clone(),
		redis.cache.clone(),
		&default.url,
		&fallback.url,
		Breakers::default(),
		false,
	);

	let cmd = command(25.00);
	let first = use_case.execute(cmd).await.unwrap();
	let second = use_case.execute(cmd).await.unwrap();

	assert_eq!(first.processor, ProcessorKind::Default);
	assert_eq!(second.processor, ProcessorKind::Default);

	let totals = postgres.ledger.get_summary(None, None).await.unwrap();
	assert_eq!(totals.len(), 1);
	assert_eq!(totals[0].total_requests, 1);
	assert_eq!(totals[0].total_amount, 25.00);
}

#[actix_web::test]
async fn test_validation_failure_never_reaches_a_processor() {
	let postgres = setup_postgres().await;
	let redis = setup_redis().await;
	let default = StubProcessor::healthy().await;
	let fallback = StubProcessor::healthy().await;

	let use_case = build_use_case(
		postgres.ledger.clone(),
		redis.cache.clone(),
		&default.url,
		&fallback.url,
		Breakers::default(),
		false,
	);

	let result = use_case.execute(command(0.0)).await;
	match result {
		Err(DispatchError::Validation { failures }) => {
			assert!(failures.iter().any(|f| f.check == "amount_format"));
		}
		other => panic!("expected validation failure, got {other:?}"),
	}
	assert_eq!(default.received_count(), 0);
	assert_eq!(fallback.received_count(), 0);
}

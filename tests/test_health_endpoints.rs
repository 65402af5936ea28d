use std::sync::Arc;

use actix_web::{App, test, web};
use payment_relay::adapters::web::health_handlers::{
	self, ServiceInfo, audit_events, audit_events_for_correlation,
	clear_audit_logs, clear_health_cache, health, payment_processors_health,
	performance, reset_circuit_breakers, service_stats,
};
use payment_relay::domain::payment::ProcessorKind;
use payment_relay::infrastructure::audit::log::{AuditLog, AuditStage};
use payment_relay::infrastructure::metrics::recorder::MetricsRecorder;
use payment_relay::infrastructure::processor::client::ProcessorClient;
use payment_relay::infrastructure::resilience::Breakers;
use payment_relay::infrastructure::resilience::circuit_breaker::BreakerState;
use payment_relay::infrastructure::resilience::retry::RetryPolicy;
use payment_relay::use_cases::check_processor_health::CheckProcessorHealthUseCase;
use time::OffsetDateTime;
use uuid::Uuid;

mod support;

use crate::support::postgres_container::setup_postgres;
use crate::support::redis_container::setup_redis;
use crate::support::stub_processor::StubProcessor;

#[actix_web::test]
async fn test_health_liveness_shape() {
	let app = test::init_service(App::new().service(health)).await;

	let req = test::TestRequest::get().uri("/health").to_request();
	let resp = test::call_service(&app, req).await;
	assert!(resp.status().is_success());

	let body: serde_json::Value = test::read_body_json(resp).await;
	assert_eq!(body["status"], "ok");
	assert_eq!(body["service"], "payment-relay");
	assert!(body.get("timestamp").is_some());
	assert!(body.get("version").is_some());
}

#[actix_web::test]
async fn test_payment_processors_returns_503_without_snapshots() {
	let redis = setup_redis().await;

	let app = test::init_service(
		App::new()
			.app_data(web::Data::new(redis.cache.clone()))
			.app_data(web::Data::new(Breakers::default()))
			.app_data(web::Data::new(RetryPolicy::default()))
			.service(payment_processors_health),
	)
	.await;

	let req = test::TestRequest::get()
		.uri("/health/payment-processors")
		.to_request();
	let resp = test::call_service(&app, req).await;
	assert_eq!(resp.status().as_u16(), 503);
}

#[actix_web::test]
async fn test_payment_processors_reports_snapshots_and_breakers() {
	let redis = setup_redis().await;
	let stub = StubProcessor::healthy().await;

	// Publish a snapshot the way the poller does.
	let check = CheckProcessorHealthUseCase::new(redis.cache.clone());
	let client = ProcessorClient::new(
		ProcessorKind::Default,
		&stub.url,
		reqwest::Client::new(),
	);
	assert!(check.execute(&client).await.is_some());

	let app = test::init_service(
		App::new()
			.app_data(web::Data::new(redis.cache.clone()))
			.app_data(web::Data::new(Breakers::default()))
			.app_data(web::Data::new(RetryPolicy::default()))
			.service(payment_processors_health),
	)
	.await;

	let req = test::TestRequest::get()
		.uri("/health/payment-processors")
		.to_request();
	let resp = test::call_service(&app, req).await;
	assert!(resp.status().is_success());

	let body: serde_json::Value = test::read_body_json(resp).await;
	assert_eq!(body["processors"]["default"]["isHealthy"], true);
	assert_eq!(body["circuitBreakers"]["default"]["state"], "CLOSED");
	assert_eq!(body["retry"]["maxRetries"], 2);
}

#[actix_web::test]
async fn test_reset_circuit_breakers_closes_forced_open_breaker() {
	let breakers = Breakers::default();
	breakers.default.force_open();
	assert_eq!(breakers.default.current_state(), BreakerState::Open);

	let app = test::init_service(
		App::new()
			.app_data(web::Data::new(breakers.clone()))
			.app_data(web::Data::from(Arc::new(AuditLog::new())))
			.service(reset_circuit_breakers),
	)
	.await;

	let req = test::TestRequest::post()
		.uri("/health/reset-circuit-breakers")
		.to_request();
	let resp = test::call_service(&app, req).await;
	assert!(resp.status().is_success());
	assert_eq!(breakers.default.current_state(), BreakerState::Closed);
}

#[actix_web::test]
async fn test_audit_endpoints_filter_and_clear() {
	let audit = Arc::new(AuditLog::new());
	let correlation_id = Uuid::new_v4();
	audit.record(Some(correlation_id), AuditStage::Received, None, None);
	audit.record(
		Some(correlation_id),
		AuditStage::ProcessorAccepted,
		Some(ProcessorKind::Default),
		None,
	);
	audit.record(Some(Uuid::new_v4()), AuditStage::Received, None, None);

	let app = test::init_service(
		App::new()
			.app_data(web::Data::from(audit.clone()))
			.service(audit_events)
			.service(audit_events_for_correlation)
			.service(clear_audit_logs),
	)
	.await;

	let req = test::TestRequest::get().uri("/health/audit").to_request();
	let resp = test::call_service(&app, req).await;
	let body: serde_json::Value = test::read_body_json(resp).await;
	assert_eq!(body["count"], 3);

	let req = test::TestRequest::get()
		.uri(&format!("/health/audit/{correlation_id}"))
		.to_request();
	let resp = test::call_service(&app, req).await;
	let body: serde_json::Value = test::read_body_json(resp).await;
	assert_eq!(body["count"], 2);

	let req = test::TestRequest::get()
		.uri("/health/audit/not-a-uuid")
		.to_request();
	let resp = test::call_service(&app, req).await;
	assert_eq!(resp.status().as_u16(), 400);

	let req = test::TestRequest::post()
		.uri("/health/clear-audit-logs")
		.to_request();
	let resp = test::call_service(&app, req).await;
	assert!(resp.status().is_success());
	assert!(audit.is_empty());
}

#[actix_web::test]
async fn test_clear_health_cache_removes_snapshots() {
	let redis = setup_redis().await;
	let stub = StubProcessor::healthy().await;

	let check = CheckProcessorHealthUseCase::new(redis.cache.clone());
	let client = ProcessorClient::new(
		ProcessorKind::Default,
		&stub.url,
		reqwest::Client::new(),
	);
	assert!(check.execute(&client).await.is_some());

	let app = test::init_service(
		App::new()
			.app_data(web::Data::new(redis.cache.clone()))
			.app_data(web::Data::new(Breakers::default()))
			.app_data(web::Data::new(RetryPolicy::default()))
			.app_data(web::Data::from(Arc::new(AuditLog::new())))
			.service(payment_processors_health)
			.service(clear_health_cache),
	)
	.await;

	let req = test::TestRequest::post()
		.uri("/health/clear-health-cache")
		.to_request();
	let resp = test::call_service(&app, req).await;
	assert!(resp.status().is_success());

	let req = test::TestRequest::get()
		.uri("/health/payment-processors")
		.to_request();
	let resp = test::call_service(&app, req).await;
	assert_eq!(resp.status().as_u16(), 503);
}

#[actix_web::test]
async fn test_performance_reports_db_pool_bounds() {
	let postgres = setup_postgres().await;
	let metrics = Arc::new(MetricsRecorder::new(1000));
	metrics.record(std::time::Duration::from_millis(12), true);

	let app = test::init_service(
		App::new()
			.app_data(web::Data::from(metrics))
			.app_data(web::Data::new(postgres.ledger.clone()))
			.service(performance),
	)
	.await;

	let req = test::TestRequest::get()
		.uri("/health/performance")
		.to_request();
	let resp = test::call_service(&app, req).await;
	assert!(resp.status().is_success());

	let body: serde_json::Value = test::read_body_json(resp).await;
	assert_eq!(body["dbPool"]["max"], 25);
	assert_eq!(body["performance"]["sampleCount"], 1);
	assert_eq!(body["performance"]["successRate"], 1.0);
}

#[actix_web::test]
async fn test_stats_aggregates_requests_and_breakers() {
	let metrics = Arc::new(MetricsRecorder::new(1000));
	metrics.record(std::time::Duration::from_millis(5), true);
	metrics.record(std::time::Duration::from_millis(5), false);

	let app = test::init_service(
		App::new()
			.app_data(web::Data::new(ServiceInfo {
				started_at: OffsetDateTime::now_utc(),
			}))
			.app_data(web::Data::from(metrics))
			.app_data(web::Data::new(Breakers::default()))
			.app_data(web::Data::from(Arc::new(AuditLog::new())))
			.service(service_stats),
	)
	.await;

	let req = test::TestRequest::get().uri("/health/stats").to_request();
	let resp = test::call_service(&app, req).await;
	assert!(resp.status().is_success());

	let body: serde_json::Value = test::read_body_json(resp).await;
	assert_eq!(body["requests"]["total"], 2);
	assert_eq!(body["requests"]["succeeded"], 1);
	assert_eq!(body["circuitBreakers"]["default"]["state"], "CLOSED");
}

#[actix_web::test]
async fn test_unknown_path_returns_404_with_path() {
	let app = test::init_service(
		App::new()
			.service(health)
			.default_service(web::route().to(health_handlers::not_found)),
	)
	.await;

	let req = test::TestRequest::get().uri("/nope").to_request();
	let resp = test::call_service(&app, req).await;
	assert_eq!(resp.status().as_u16(), 404);

	let body: serde_json::Value = test::read_body_json(resp).await;
	assert_eq!(body["path"], "/nope");
	assert!(body.get("error").is_some());
}

pub mod adapters;
pub mod domain;
pub mod infrastructure;
pub mod use_cases;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use log::info;
use time::OffsetDateTime;

use crate::adapters::web::health_handlers::{self, ServiceInfo};
use crate::adapters::web::{payments_handler, payments_summary_handler};
use crate::domain::payment::ProcessorKind;
use crate::infrastructure::audit::log::AuditLog;
use crate::infrastructure::cache::redis_cache::RedisCache;
use crate::infrastructure::config::settings::Settings;
use crate::infrastructure::metrics::recorder::MetricsRecorder;
use crate::infrastructure::persistence::postgres_ledger::PostgresLedger;
use crate::infrastructure::processor::client::{
	PAYMENT_TIMEOUT, ProcessorClient,
};
use crate::infrastructure::resilience::Breakers;
use crate::infrastructure::resilience::circuit_breaker::BreakerConfig;
use crate::infrastructure::resilience::retry::RetryPolicy;
use crate::infrastructure::workers::health_poller::health_poller_worker;
use crate::use_cases::check_processor_health::CheckProcessorHealthUseCase;
use crate::use_cases::get_payment_summary::GetPaymentSummaryUseCase;
use crate::use_cases::submit_payment::SubmitPaymentUseCase;

/// Composition root. Builds one instance of every collaborator per
/// replica, spawns the health poller, and runs the HTTP server until
/// shutdown.
pub async fn run(settings: Arc<Settings>) -> anyhow::Result<()> {
	env_logger::Builder::new()
		.parse_filters(&settings.log_level)
		.try_init()
		.ok();

	let pool = PostgresLedger::connect_pool(&settings.database_url()).await?;
	sqlx::migrate!("./migrations").run(&pool).await?;
	let ledger = PostgresLedger::new(pool);

	let cache = RedisCache::new(&settings.redis_url)?;

	let http_client = reqwest::Client::builder()
		.timeout(PAYMENT_TIMEOUT)
		.user_agent(concat!("payment-relay/", env!("CARGO_PKG_VERSION")))
		.build()?;
	let default_client = ProcessorClient::new(
		ProcessorKind::Default,
		&settings.default_processor_url,
		http_client.clone(),
	);
	let fallback_client = ProcessorClient::new(
		ProcessorKind::Fallback,
		&settings.fallback_processor_url,
		http_client,
	);

	let breakers = Breakers::new(BreakerConfig::default());
	let retry = RetryPolicy::default();
	let metrics = Arc::new(MetricsRecorder::new(settings.p99_threshold));
	let audit = Arc::new(AuditLog::new());

	let submit_payment_use_case = SubmitPaymentUseCase::new(
		ledger.clone(),
		cache.clone(),
		default_client.clone(),
		fallback_client.clone(),
		breakers.clone(),
		retry,
		metrics.clone(),
		audit.clone(),
		settings.simulate_payments,
	);
	let get_payment_summary_use_case = GetPaymentSummaryUseCase::new(
		ledger.clone(),
		cache.clone(),
		Duration::from_secs(settings.cache_ttl),
	);

	info!("Starting health poller...");
	tokio::spawn(health_poller_worker(
		CheckProcessorHealthUseCase::new(cache.clone()),
		default_client,
		fallback_client,
	));

	let service_info = ServiceInfo {
		started_at: OffsetDateTime::now_utc(),
	};
	let metrics_data = web::Data::from(metrics);
	let audit_data = web::Data::from(audit);
	let port = settings.port;

	info!("Starting HTTP server on 0.0.0.0:{port}...");
	HttpServer::new(move || {
		App::new()
			.app_data(web::Data::new(submit_payment_use_case.clone()))
			.app_data(web::Data::new(get_payment_summary_use_case.clone()))
			.app_data(web::Data::new(cache.clone()))
			.app_data(web::Data::new(ledger.clone()))
			.app_data(web::Data::new(breakers.clone()))
			.app_data(web::Data::new(retry))
			.app_data(metrics_data.clone())
			.app_data(audit_data.clone())
			.app_data(web::Data::new(service_info.clone()))
			.service(payments_handler::payments)
			.service(payments_summary_handler::payments_summary)
			.service(health_handlers::health)
			.service(health_handlers::payment_processors_health)
			.service(health_handlers::service_stats)
			.service(health_handlers::performance)
			.service(health_handlers::audit_events)
			.service(health_handlers::audit_events_for_correlation)
			.service(health_handlers::reset_circuit_breakers)
			.service(health_handlers::clear_health_cache)
			.service(health_handlers::clear_audit_logs)
			.default_service(web::route().to(health_handlers::not_found))
	})
	.bind(("0.0.0.0", port))?
	.run()
	.await?;

	Ok(())
}

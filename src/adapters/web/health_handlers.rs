use actix_web::{HttpRequest, HttpResponse, Responder, get, post, web};
use serde_json::json;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::adapters::web::errors::not_found_response;
use crate::domain::cache::{CacheStore, keys};
use crate::domain::health::ProcessorHealth;
use crate::infrastructure::audit::log::{AuditLog, AuditStage};
use crate::infrastructure::cache::redis_cache::RedisCache;
use crate::infrastructure::metrics::recorder::MetricsRecorder;
use crate::infrastructure::persistence::postgres_ledger::PostgresLedger;
use crate::infrastructure::resilience::Breakers;
use crate::infrastructure::resilience::retry::RetryPolicy;

/// Replica-wide facts fixed at startup.
#[derive(Clone)]
pub struct ServiceInfo {
	pub started_at: OffsetDateTime,
}

fn now_rfc3339() -> String {
	OffsetDateTime::now_utc()
		.format(&Rfc3339)
		.unwrap_or_default()
}

async fn read_snapshot(
	cache: &RedisCache,
	name: &str,
) -> Option<ProcessorHealth> {
	let raw = cache.hget(keys::HEALTH_SNAPSHOTS, name).await?;
	serde_json::from_str(&raw).ok()
}

#[get("/health")]
pub async fn health() -> impl Responder {
	HttpResponse::Ok().json(json!({
		"status": "ok",
		"timestamp": now_rfc3339(),
		"service": env!("CARGO_PKG_NAME"),
		"version": env!("CARGO_PKG_VERSION"),
	}))
}

#[get("/health/payment-processors")]
pub async fn payment_processors_health(
	cache: web::Data<RedisCache>,
	breakers: web::Data<Breakers>,
	retry: web::Data<RetryPolicy>,
) -> impl Responder {
	let default = read_snapshot(&cache, "default").await;
	let fallback = read_snapshot(&cache, "fallback").await;

	if default.is_none() && fallback.is_none() {
		return HttpResponse::ServiceUnavailable().json(json!({
			"error": "No processor health information available.",
		}));
	}

	let (default_breaker, fallback_breaker) = breakers.stats();
	HttpResponse::Ok().json(json!({
		"processors": {
			"default": default,
			"fallback": fallback,
		},
		"circuitBreakers": {
			"default": default_breaker,
			"fallback": fallback_breaker,
		},
		"retry": retry.snapshot(),
		"timestamp": now_rfc3339(),
	}))
}

#[get("/health/stats")]
pub async fn service_stats(
	info: web::Data<ServiceInfo>,
	metrics: web::Data<MetricsRecorder>,
	breakers: web::Data<Breakers>,
	audit: web::Data<AuditLog>,
) -> impl Responder {
	let uptime = OffsetDateTime::now_utc() - info.started_at;
	let (default_breaker, fallback_breaker) = breakers.stats();

	HttpResponse::Ok().json(json!({
		"service": env!("CARGO_PKG_NAME"),
		"timestamp": now_rfc3339(),
		"uptimeSeconds": uptime.whole_seconds(),
		"requests": metrics.totals(),
		"circuitBreakers": {
			"default": default_breaker,
			"fallback": fallback_breaker,
		},
		"auditEvents": audit.len(),
	}))
}

#[get("/health/performance")]
pub async fn performance(
	metrics: web::Data<MetricsRecorder>,
	ledger: web::Data<PostgresLedger>,
) -> impl Responder {
	HttpResponse::Ok().json(json!({
		"performance": metrics.performance(),
		"dbPool": ledger.pool_stats(),
		"timestamp": now_rfc3339(),
	}))
}

#[get("/health/audit")]
pub async fn audit_events(audit: web::Data<AuditLog>) -> impl Responder {
	let events = audit.all();
	HttpResponse::Ok().json(json!({
		"count": events.len(),
		"events": events,
	}))
}

#[get("/health/audit/{correlation_id}")]
pub async fn audit_events_for_correlation(
	path: web::Path<String>,
	audit: web::Data<AuditLog>,
) -> impl Responder {
	let Ok(correlation_id) = Uuid::parse_str(&path) else {
		return HttpResponse::BadRequest().json(json!({
			"error": "Invalid correlation id.",
		}));
	};

	let events = audit.for_correlation(correlation_id);
	HttpResponse::Ok().json(json!({
		"correlationId": correlation_id,
		"count": events.len(),
		"events": events,
	}))
}

#[post("/health/reset-circuit-breakers")]
pub async fn reset_circuit_breakers(
	breakers: web::Data<Breakers>,
	audit: web::Data<AuditLog>,
) -> impl Responder {
	breakers.reset_all();
	audit.record(None, AuditStage::BreakersReset, None, None);
	HttpResponse::Ok().json(json!({
		"message": "Circuit breakers reset.",
	}))
}

#[post("/health/clear-health-cache")]
pub async fn clear_health_cache(
	cache: web::Data<RedisCache>,
	audit: web::Data<AuditLog>,
) -> impl Responder {
	cache.del(keys::HEALTH_SNAPSHOTS).await;
	cache.del(keys::HEALTH_LAST_CHECK).await;
	cache.del_matching(keys::RESPONSE_TIMES_PATTERN).await;
	audit.record(None, AuditStage::HealthCacheCleared, None, None);
	HttpResponse::Ok().json(json!({
		"message": "Health cache cleared.",
	}))
}

#[post("/health/clear-audit-logs")]
pub async fn clear_audit_logs(audit: web::Data<AuditLog>) -> impl Responder {
	audit.clear();
	HttpResponse::Ok().json(json!({
		"message": "Audit log cleared.",
	}))
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
	not_found_response(req.path())
}

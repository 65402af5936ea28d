use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, web};
use serde_json::json;

/// In-process stand-in for one payment processor, with scriptable
/// failure behavior. Runs on a random local port inside the test's
/// actix runtime.
pub struct StubProcessor {
	pub url:      String,
	pub received: Arc<AtomicU32>,
	handle:       actix_web::dev::ServerHandle,
}

#[derive(Clone)]
struct StubState {
	received:           Arc<AtomicU32>,
	// Number of /payments requests that still fail; -1 fails forever.
	remaining_failures: Arc<AtomicI64>,
	fail_status:        u16,
	failing_health:     bool,
	min_response_time:  u64,
}

async fn stub_payments(state: web::Data<StubState>) -> HttpResponse {
	state.received.fetch_add(1, Ordering::SeqCst);

	let remaining = state.remaining_failures.load(Ordering::SeqCst);
	if remaining != 0 {
		if remaining > 0 {
			state.remaining_failures.fetch_sub(1, Ordering::SeqCst);
		}
		let status = StatusCode::from_u16(state.fail_status)
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		return HttpResponse::build(status)
			.json(json!({"error": "stub failure"}));
	}

	HttpResponse::Ok().json(json!({"message": "payment processed"}))
}

async fn stub_health(state: web::Data<StubState>) -> HttpResponse {
	HttpResponse::Ok().json(json!({
		"failing": state.failing_health,
		"minResponseTime": state.min_response_time,
	}))
}

impl StubProcessor {
	/// Always accepts payments and reports itself healthy.
	pub async fn healthy() -> Self {
		Self::start(0, 500, false).await
	}

	/// Fails the first `failures` payment requests with `status`
	/// (`-1` fails every request), then succeeds.
	pub async fn failing_first(failures: i64, status: u16) -> Self {
		Self::start(failures, status, false).await
	}

	/// Reports `failing: true` on its health endpoint.
	pub async fn unhealthy() -> Self {
		Self::start(-1, 500, true).await
	}

	async fn start(
		failures: i64,
		fail_status: u16,
		failing_health: bool,
	) -> Self {
		let received = Arc::new(AtomicU32::new(0));
		let state = StubState {
			received:           received.clone(),
			remaining_failures: Arc::new(AtomicI64::new(failures)),
			fail_status,
			failing_health,
			min_response_time: 5,
		};

		let server = HttpServer::new(move || {
			App::new()
				.app_data(web::Data::new(state.clone()))
				.route("/payments", web::post().to(stub_payments))
				.route(
					"/payments/service-health",
					web::get().to(stub_health),
				)
		})
		.workers(1)
		.disable_signals()
		.bind(("127.0.0.1", 0))
		.unwrap();

		let addr = server.addrs()[0];
		let server = server.run();
		let handle = server.handle();
		actix_web::rt::spawn(server);

		Self {
			url: format!("http://{addr}"),
			received,
			handle,
		}
	}

	pub fn received_count(&self) -> u32 {
		self.received.load(Ordering::SeqCst)
	}

	pub async fn stop(self) {
		self.handle.stop(false).await;
	}
}

use std::time::{Duration, Instant};

use log::error;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::errors::DispatchError;
use crate::domain::health::ProcessorHealth;
use crate::domain::payment::ProcessorKind;

pub const PAYMENT_TIMEOUT: Duration = Duration::from_secs(10);
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

/// Wire payload for `POST {processor}/payments`. `requestedAt` is always
/// included, in UTC RFC 3339.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorPaymentRequest {
	pub correlation_id: Uuid,
	pub amount:         f64,
	#[serde(with = "time::serde::rfc3339")]
	pub requested_at:   OffsetDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceHealthResponse {
	failing:           bool,
	min_response_time: u64,
}

/// Typed HTTP client for one processor.
#[derive(Clone)]
pub struct ProcessorClient {
	kind:     ProcessorKind,
	base_url: String,
	http:     Client,
}

/// Network-level failures worth another attempt: timeouts, connection
/// errors, and failures before a response was produced.
fn is_retryable_transport_error(e: &reqwest::Error) -> bool {
	e.is_connect() || e.is_timeout() || e.is_request()
}

impl ProcessorClient {
	pub fn new(kind: ProcessorKind, base_url: &str, http: Client) -> Self {
		Self {
			kind,
			base_url: base_url.trim_end_matches('/').to_string(),
			http,
		}
	}

	pub fn kind(&self) -> ProcessorKind {
		self.kind
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Executes a charge. Success is any 2xx; everything else maps onto
	/// the transient/permanent split that drives the retry coordinator.
	pub async fn pay(
		&self,
		request: &ProcessorPaymentRequest,
	) -> Result<(), DispatchError> {
		let url = format!("{}/payments", self.base_url);
		match self.http.post(&url).json(request).send().await {
			Ok(resp) if resp.status().is_success() => Ok(()),
			Ok(resp) => {
				let status = resp.status();
				let message = format!(
					"{} processor returned status {status} for {}",
					self.kind, request.correlation_id
				);
				if status.is_server_error()
					|| status == StatusCode::TOO_MANY_REQUESTS
				{
					Err(DispatchError::Transient {
						message,
						status_code: Some(status.as_u16()),
					})
				} else {
					Err(DispatchError::Permanent {
						message,
						status_code: Some(status.as_u16()),
					})
				}
			}
			Err(e) => {
				let message = format!(
					"{} processor request failed for {}: {e}",
					self.kind, request.correlation_id
				);
				if is_retryable_transport_error(&e) {
					Err(DispatchError::Transient {
						message,
						status_code: e.status().map(|s| s.as_u16()),
					})
				} else {
					Err(DispatchError::Permanent {
						message,
						status_code: e.status().map(|s| s.as_u16()),
					})
				}
			}
		}
	}

	/// Probes `GET /payments/service-health`. Never fails: unreachable or
	/// malformed responses synthesize a failing snapshot carrying the
	/// error and the probe duration.
	pub async fn health(&self) -> ProcessorHealth {
		let url = format!("{}/payments/service-health", self.base_url);
		let started = Instant::now();

		let response = self
			.http
			.get(&url)
			.timeout(HEALTH_TIMEOUT)
			.send()
			.await;
		let elapsed_ms = started.elapsed().as_millis() as u64;

		match response {
			Ok(resp) if resp.status().is_success() => {
				match resp.json::<ServiceHealthResponse>().await {
					Ok(body) => ProcessorHealth::reachable(
						body.failing,
						body.min_response_time,
						elapsed_ms,
					),
					Err(e) => {
						error!(
							"Failed to parse health response from {} \
							 processor: {e}",
							self.kind
						);
						ProcessorHealth::unreachable(
							elapsed_ms,
							format!("invalid health payload: {e}"),
							None,
						)
					}
				}
			}
			Ok(resp) => {
				let status = resp.status();
				error!(
					"Health check for {} processor failed with status \
					 {status}.",
					self.kind
				);
				ProcessorHealth::unreachable(
					elapsed_ms,
					format!("health endpoint returned {status}"),
					Some(status.as_u16()),
				)
			}
			Err(e) => {
				error!(
					"Failed to reach health endpoint of {} processor: {e}",
					self.kind
				);
				ProcessorHealth::unreachable(elapsed_ms, e.to_string(), None)
			}
		}
	}
}

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, error};
use derive_more::derive::Display;
use serde::Serialize;

use crate::domain::consistency::CheckOutcome;
use crate::domain::errors::DispatchError;

#[derive(Serialize)]
struct ErrorBody {
	error:   String,
	#[serde(skip_serializing_if = "Option::is_none")]
	details: Option<Vec<CheckOutcome>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	path:    Option<String>,
}

#[derive(Debug, Display)]
pub enum ApiError {
	#[display("Request data is invalid.")]
	Validation(Vec<CheckOutcome>),
	#[display("All payment processors are unavailable.")]
	Unavailable,
	#[display("Payment was accepted but could not be recorded.")]
	Persistence,
	#[display("Internal server error.")]
	Internal,
}

impl From<DispatchError> for ApiError {
	fn from(e: DispatchError) -> Self {
		match e {
			DispatchError::Validation { failures } => {
				ApiError::Validation(failures)
			}
			DispatchError::Unavailable => ApiError::Unavailable,
			DispatchError::Persistence { .. } => ApiError::Persistence,
			// A breaker rejection or raw processor error escaping the
			// dispatcher means both attempts were exhausted upstream.
			_ => ApiError::Internal,
		}
	}
}

impl error::ResponseError for ApiError {
	fn status_code(&self) -> StatusCode {
		match self {
			ApiError::Validation(_) => StatusCode::BAD_REQUEST,
			ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
			ApiError::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
			ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	fn error_response(&self) -> HttpResponse {
		let details = match self {
			ApiError::Validation(failures) => Some(failures.clone()),
			_ => None,
		};
		HttpResponse::build(self.status_code())
			.content_type(ContentType::json())
			.json(ErrorBody {
				error: self.to_string(),
				details,
				path: None,
			})
	}
}

pub fn not_found_response(path: &str) -> HttpResponse {
	HttpResponse::NotFound()
		.content_type(ContentType::json())
		.json(ErrorBody {
			error:   "Not found.".to_string(),
			details: None,
			path:    Some(path.to_string()),
		})
}

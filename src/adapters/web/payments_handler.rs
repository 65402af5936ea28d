use actix_web::{HttpResponse, Responder, ResponseError, post, web};

use crate::adapters::web::errors::ApiError;
use crate::adapters::web::schema::{PaymentRequest, PaymentResponse};
use crate::adapters::web::SubmitPayment;
use crate::use_cases::dto::SubmitPaymentCommand;

#[post("/payments")]
pub async fn payments(
	payload: web::Json<PaymentRequest>,
	submit_payment_use_case: web::Data<SubmitPayment>,
) -> impl Responder {
	let command = SubmitPaymentCommand {
		correlation_id: payload.correlation_id,
		amount:         payload.amount,
	};

	match submit_payment_use_case.execute(command).await {
		Ok(accepted) => HttpResponse::Ok().json(PaymentResponse {
			message:        "payment processed".to_string(),
			correlation_id: accepted.correlation_id,
			amount:         accepted.amount,
			processor:      accepted.processor,
		}),
		Err(e) => ApiError::from(e).error_response(),
	}
}

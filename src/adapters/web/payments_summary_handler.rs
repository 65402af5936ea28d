use actix_web::{HttpResponse, Responder, ResponseError, get, web};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::adapters::web::GetPaymentSummary;
use crate::adapters::web::errors::ApiError;
use crate::adapters::web::schema::SummaryFilter;
use crate::domain::consistency::{self, CheckOutcome};
use crate::use_cases::dto::GetPaymentSummaryQuery;

fn parse_bound(
	raw: Option<&str>,
	failures: &mut Vec<CheckOutcome>,
) -> Option<OffsetDateTime> {
	let raw = raw?;
	let outcome = consistency::timestamp_format(raw);
	if !outcome.passed {
		failures.push(outcome);
		return None;
	}
	OffsetDateTime::parse(raw, &Rfc3339).ok()
}

#[get("/payments/summary")]
pub async fn payments_summary(
	query: web::Query<SummaryFilter>,
	get_payment_summary_use_case: web::Data<GetPaymentSummary>,
) -> impl Responder {
	let mut failures = Vec::new();
	let from = parse_bound(query.from.as_deref(), &mut failures);
	let to = parse_bound(query.to.as_deref(), &mut failures);
	if !failures.is_empty() {
		return ApiError::Validation(failures).error_response();
	}

	match get_payment_summary_use_case
		.execute(GetPaymentSummaryQuery { from, to })
		.await
	{
		Ok(summary) => HttpResponse::Ok().json(summary),
		Err(e) => ApiError::from(e).error_response(),
	}
}

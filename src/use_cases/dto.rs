use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::payment::ProcessorKind;

#[derive(Debug, Clone, Copy)]
pub struct SubmitPaymentCommand {
	pub correlation_id: Uuid,
	pub amount:         f64,
}

/// Final outcome of a dispatched payment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaymentAccepted {
	pub correlation_id: Uuid,
	pub amount:         f64,
	pub processor:      ProcessorKind,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GetPaymentSummaryQuery {
	pub from: Option<OffsetDateTime>,
	pub to:   Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorSummary {
	pub total_requests: i64,
	pub total_amount:   f64,
}

impl ProcessorSummary {
	pub fn zero() -> Self {
		Self {
			total_requests: 0,
			total_amount:   0.0,
		}
	}
}

/// The summary always carries both processor keys, zero-filled when the
/// store has no rows for one of them.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PaymentsSummaryResponse {
	pub default:  ProcessorSummary,
	pub fallback: ProcessorSummary,
}

impl PaymentsSummaryResponse {
	pub fn zero() -> Self {
		Self {
			default:  ProcessorSummary::zero(),
			fallback: ProcessorSummary::zero(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_summary_wire_shape_is_camel_case() {
		let summary = PaymentsSummaryResponse {
			default:  ProcessorSummary {
				total_requests: 3,
				total_amount:   60.0,
			},
			fallback: ProcessorSummary::zero(),
		};

		let json = serde_json::to_value(&summary).unwrap();
		assert_eq!(json["default"]["totalRequests"], 3);
		assert_eq!(json["default"]["totalAmount"], 60.0);
		assert_eq!(json["fallback"]["totalRequests"], 0);
		assert_eq!(json["fallback"]["totalAmount"], 0.0);
	}
}

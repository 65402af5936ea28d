use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::payment::ProcessorKind;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
	pub correlation_id: Uuid,
	pub amount:         f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
	pub message:        String,
	pub correlation_id: Uuid,
	pub amount:         f64,
	pub processor:      ProcessorKind,
}

/// Raw query bounds for the summary endpoint. Kept as strings so the
/// timestamp consistency check can reject values that parse but lack the
/// explicit UTC markers.
#[derive(Debug, Deserialize)]
pub struct SummaryFilter {
	pub from: Option<String>,
	pub to:   Option<String>,
}

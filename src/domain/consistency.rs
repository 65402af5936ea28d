//! Local, synchronous, side-effect-free consistency checks. Every check
//! returns a [`CheckOutcome`] instead of failing, so callers can log the
//! full pass/fail list and decide what to surface.

use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::{Uuid, Variant};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
	pub check:  &'static str,
	pub passed: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub detail: Option<String>,
}

impl CheckOutcome {
	fn pass(check: &'static str) -> Self {
		Self {
			check,
			passed: true,
			detail: None,
		}
	}

	fn fail(check: &'static str, detail: String) -> Self {
		Self {
			check,
			passed: false,
			detail: Some(detail),
		}
	}
}

/// Correlation ids must be version 4, RFC 4122 variant. Any other UUID
/// version is rejected even though it parses.
pub fn correlation_id_format(id: &Uuid) -> CheckOutcome {
	let version = id.get_version_num();
	if version == 4 && matches!(id.get_variant(), Variant::RFC4122) {
		CheckOutcome::pass("correlation_id_format")
	} else {
		CheckOutcome::fail(
			"correlation_id_format",
			format!("expected a version 4 UUID, got version {version}"),
		)
	}
}

/// Amounts are strictly positive with at most two fractional digits.
pub fn amount_format(amount: f64) -> CheckOutcome {
	if !amount.is_finite() {
		return CheckOutcome::fail(
			"amount_format",
			"amount must be a finite number".to_string(),
		);
	}
	if amount <= 0.0 {
		return CheckOutcome::fail(
			"amount_format",
			format!("amount must be strictly positive, got {amount}"),
		);
	}
	let cents = amount * 100.0;
	if (cents - cents.round()).abs() > 1e-6 {
		return CheckOutcome::fail(
			"amount_format",
			format!("amount {amount} has more than two decimal places"),
		);
	}
	CheckOutcome::pass("amount_format")
}

pub fn processor_type(name: &str) -> CheckOutcome {
	if name == "default" || name == "fallback" {
		CheckOutcome::pass("processor_type")
	} else {
		CheckOutcome::fail(
			"processor_type",
			format!("unknown processor '{name}'"),
		)
	}
}

/// Timestamps must parse as RFC 3339 and carry the explicit UTC markers.
/// An offset like `+00:00` parses but is rejected: the wire contract is
/// `T` and `Z`.
pub fn timestamp_format(raw: &str) -> CheckOutcome {
	if !raw.contains('T') || !raw.contains('Z') {
		return CheckOutcome::fail(
			"timestamp_format",
			format!("'{raw}' is missing the T or Z UTC marker"),
		);
	}
	match OffsetDateTime::parse(raw, &Rfc3339) {
		Ok(_) => CheckOutcome::pass("timestamp_format"),
		Err(e) => CheckOutcome::fail(
			"timestamp_format",
			format!("'{raw}' is not a valid RFC 3339 timestamp: {e}"),
		),
	}
}

/// Best-effort only. The store's unique index is the enforcer; a positive
/// observation here is logged, never blocking.
pub fn no_duplicate_correlation_id(already_seen: bool) -> CheckOutcome {
	if already_seen {
		CheckOutcome::fail(
			"no_duplicate_correlation_id",
			"correlation id was recently submitted".to_string(),
		)
	} else {
		CheckOutcome::pass("no_duplicate_correlation_id")
	}
}

pub fn date_range(
	from: Option<OffsetDateTime>,
	to: Option<OffsetDateTime>,
) -> CheckOutcome {
	match (from, to) {
		(Some(from), Some(to)) if from > to => CheckOutcome::fail(
			"date_range",
			format!("from ({from}) is after to ({to})"),
		),
		_ => CheckOutcome::pass("date_range"),
	}
}

fn summary_side<'v>(
	value: &'v serde_json::Value,
	key: &str,
) -> Option<(&'v serde_json::Value, &'v serde_json::Value)> {
	let side = value.get(key)?;
	let requests = side.get("totalRequests").filter(|v| v.is_number())?;
	let amount = side.get("totalAmount").filter(|v| v.is_number())?;
	Some((requests, amount))
}

/// Both processor keys present, each with numeric totals.
pub fn summary_structure(value: &serde_json::Value) -> CheckOutcome {
	for key in ["default", "fallback"] {
		if summary_side(value, key).is_none() {
			return CheckOutcome::fail(
				"summary_structure",
				format!("'{key}' summary is missing or not numeric"),
			);
		}
	}
	CheckOutcome::pass("summary_structure")
}

pub fn summary_amounts(value: &serde_json::Value) -> CheckOutcome {
	for key in ["default", "fallback"] {
		if let Some((_, amount)) = summary_side(value, key)
			&& amount.as_f64().unwrap_or(-1.0) < 0.0
		{
			return CheckOutcome::fail(
				"summary_amounts",
				format!("'{key}' totalAmount is negative"),
			);
		}
	}
	CheckOutcome::pass("summary_amounts")
}

pub fn summary_counts(value: &serde_json::Value) -> CheckOutcome {
	for key in ["default", "fallback"] {
		if let Some((requests, _)) = summary_side(value, key)
			&& requests.as_f64().unwrap_or(-1.0) < 0.0
		{
			return CheckOutcome::fail(
				"summary_counts",
				format!("'{key}' totalRequests is negative"),
			);
		}
	}
	CheckOutcome::pass("summary_counts")
}

/// Pre-flight list for a payment submission. Returns every outcome so the
/// failures can be logged together.
pub fn preflight(correlation_id: &Uuid, amount: f64) -> Vec<CheckOutcome> {
	vec![
		correlation_id_format(correlation_id),
		amount_format(amount),
	]
}

/// Full validation of a summary payload (cached or freshly computed).
pub fn summary_checks(value: &serde_json::Value) -> Vec<CheckOutcome> {
	vec![
		summary_structure(value),
		summary_amounts(value),
		summary_counts(value),
	]
}

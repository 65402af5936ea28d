use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Which external processor ended up executing a charge. `Simulated` is
/// only produced when both processors are down and simulation mode is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessorKind {
	Default,
	Fallback,
	Simulated,
}

impl ProcessorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ProcessorKind::Default => "default",
			ProcessorKind::Fallback => "fallback",
			ProcessorKind::Simulated => "simulated",
		}
	}

	pub fn parse(raw: &str) -> Option<ProcessorKind> {
		match raw {
			"default" => Some(ProcessorKind::Default),
			"fallback" => Some(ProcessorKind::Fallback),
			"simulated" => Some(ProcessorKind::Simulated),
			_ => None,
		}
	}
}

impl fmt::Display for ProcessorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
	Processed,
	Failed,
	Pending,
}

impl PaymentStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			PaymentStatus::Processed => "processed",
			PaymentStatus::Failed => "failed",
			PaymentStatus::Pending => "pending",
		}
	}
}

/// A ledger row. `correlation_id` is unique across the store; conflicting
/// inserts keep the original record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
	pub correlation_id: Uuid,
	pub amount:         f64,
	pub processor:      ProcessorKind,
	#[serde(with = "time::serde::rfc3339")]
	pub requested_at:   OffsetDateTime,
	#[serde(
		with = "time::serde::rfc3339::option",
		skip_serializing_if = "Option::is_none",
		default
	)]
	pub processed_at:   Option<OffsetDateTime>,
	pub status:         PaymentStatus,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_processor_kind_round_trip() {
		for kind in [
			ProcessorKind::Default,
			ProcessorKind::Fallback,
			ProcessorKind::Simulated,
		] {
			assert_eq!(ProcessorKind::parse(kind.as_str()), Some(kind));
		}
		assert_eq!(ProcessorKind::parse("unknown"), None);
	}

	#[test]
	fn test_processor_kind_serializes_lowercase() {
		let json = serde_json::to_string(&ProcessorKind::Fallback).unwrap();
		assert_eq!(json, "\"fallback\"");
	}

	#[test]
	fn test_payment_serializes_rfc3339_timestamps() {
		let payment = Payment {
			correlation_id: Uuid::new_v4(),
			amount:         19.90,
			processor:      ProcessorKind::Default,
			requested_at:   OffsetDateTime::UNIX_EPOCH,
			processed_at:   None,
			status:         PaymentStatus::Processed,
		};

		let json = serde_json::to_value(&payment).unwrap();
		assert_eq!(json["requested_at"], "1970-01-01T00:00:00Z");
		assert!(json.get("processed_at").is_none());
	}
}

use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::payment::ProcessorKind;

const AUDIT_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
	Received,
	AttemptStarted,
	AttemptFailed,
	ProcessorAccepted,
	Simulated,
	Persisted,
	PersistenceFailed,
	Rejected,
	BreakersReset,
	HealthCacheCleared,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
	#[serde(with = "time::serde::rfc3339")]
	pub at:             OffsetDateTime,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub correlation_id: Option<Uuid>,
	pub stage:          AuditStage,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub processor:      Option<ProcessorKind>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub detail:         Option<String>,
}

impl AuditEvent {
	pub fn now(
		correlation_id: Option<Uuid>,
		stage: AuditStage,
		processor: Option<ProcessorKind>,
		detail: Option<String>,
	) -> Self {
		Self {
			at: OffsetDateTime::now_utc(),
			correlation_id,
			stage,
			processor,
			detail,
		}
	}
}

/// Per-replica bounded ring of dispatch events. Every attempt, fallback,
/// simulation, persistence outcome, and administrative reset lands here;
/// the `/health/audit` endpoints read it back.
pub struct AuditLog {
	events: Mutex<VecDeque<AuditEvent>>,
}

impl AuditLog {
	pub fn new() -> Self {
		Self {
			events: Mutex::new(VecDeque::with_capacity(AUDIT_CAPACITY)),
		}
	}

	pub fn record(
		&self,
		correlation_id: Option<Uuid>,
		stage: AuditStage,
		processor: Option<ProcessorKind>,
		detail: Option<String>,
	) {
		let mut events = self.events.lock().unwrap();
		if events.len() == AUDIT_CAPACITY {
			events.pop_front();
		}
		events.push_back(AuditEvent::now(
			correlation_id,
			stage,
			processor,
			detail,
		));
	}

	/// Most recent first.
	pub fn all(&self) -> Vec<AuditEvent> {
		self.events.lock().unwrap().iter().rev().cloned().collect()
	}

	pub fn for_correlation(&self, correlation_id: Uuid) -> Vec<AuditEvent> {
		self.events
			.lock()
			.unwrap()
			.iter()
			.rev()
			.filter(|event| event.correlation_id == Some(correlation_id))
			.cloned()
			.collect()
	}

	pub fn len(&self) -> usize {
		self.events.lock().unwrap().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn clear(&self) {
		self.events.lock().unwrap().clear();
	}
}

impl Default for AuditLog {
	fn default() -> Self {
		Self::new()
	}
}

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::errors::DispatchError;
use crate::domain::ledger::{LedgerRepository, ProcessorTotals};
use crate::domain::payment::{Payment, PaymentStatus, ProcessorKind};

const MIN_CONNECTIONS: u32 = 5;
const MAX_CONNECTIONS: u32 = 25;
const IDLE_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Connection pool snapshot for `/health/performance`.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolStats {
	pub size: u32,
	pub idle: usize,
	pub max:  u32,
}

#[derive(Clone)]
pub struct PostgresLedger {
	pool: PgPool,
}

impl PostgresLedger {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	/// Builds the bounded pool the ledger runs on. Each session gets a
	/// statement timeout so a wedged query cannot hold a connection
	/// forever.
	pub async fn connect_pool(
		database_url: &str,
	) -> Result<PgPool, sqlx::Error> {
		PgPoolOptions::new()
			.min_connections(MIN_CONNECTIONS)
			.max_connections(MAX_CONNECTIONS)
			.idle_timeout(IDLE_TIMEOUT)
			.acquire_timeout(CONNECT_TIMEOUT)
			.after_connect(|conn, _meta| {
				Box::pin(async move {
					sqlx::query("SET statement_timeout = '30s'")
						.execute(&mut *conn)
						.await?;
					Ok(())
				})
			})
			.connect(database_url)
			.await
	}

	pub fn pool_stats(&self) -> PoolStats {
		PoolStats {
			size: self.pool.size(),
			idle: self.pool.num_idle(),
			max:  MAX_CONNECTIONS,
		}
	}
}

fn persistence(e: sqlx::Error) -> DispatchError {
	error!("DATABASE_OPERATION FAILED: {e}");
	DispatchError::Persistence {
		message: e.to_string(),
	}
}

#[async_trait]
impl LedgerRepository for PostgresLedger {
	async fn put_payment(
		&self,
		correlation_id: Uuid,
		amount: f64,
		processor: ProcessorKind,
		requested_at: OffsetDateTime,
	) -> Result<(), DispatchError> {
		let result = sqlx::query(
			r#"
			INSERT INTO payments
				(correlation_id, amount, processor_type, requested_at)
			VALUES ($1, $2::numeric(10, 2), $3, $4)
			ON CONFLICT (correlation_id) DO NOTHING
			"#,
		)
		.bind(correlation_id)
		.bind(amount)
		.bind(processor.as_str())
		.bind(requested_at)
		.execute(&self.pool)
		.await
		.map_err(persistence)?;

		if result.rows_affected() == 0 {
			debug!(
				"Payment {correlation_id} already recorded, keeping the \
				 original row."
			);
		}
		Ok(())
	}

	async fn get_summary(
		&self,
		from: Option<OffsetDateTime>,
		to: Option<OffsetDateTime>,
	) -> Result<Vec<ProcessorTotals>, DispatchError> {
		let rows = sqlx::query(
			r#"
			SELECT
				processor_type,
				COUNT(*) AS total_requests,
				COALESCE(SUM(amount), 0)::float8 AS total_amount
			FROM payments
			WHERE status = 'processed'
				AND ($1::timestamptz IS NULL OR requested_at >= $1)
				AND ($2::timestamptz IS NULL OR requested_at <= $2)
			GROUP BY processor_type
			"#,
		)
		.bind(from)
		.bind(to)
		.fetch_all(&self.pool)
		.await
		.map_err(persistence)?;

		let mut totals = Vec::with_capacity(rows.len());
		for row in rows {
			let kind: String =
				row.try_get("processor_type").map_err(persistence)?;
			let Some(processor) = ProcessorKind::parse(&kind) else {
				continue;
			};
			totals.push(ProcessorTotals {
				processor,
				total_requests: row
					.try_get("total_requests")
					.map_err(persistence)?,
				total_amount: row
					.try_get("total_amount")
					.map_err(persistence)?,
			});
		}
		Ok(totals)
	}

	async fn get_payment(
		&self,
		correlation_id: Uuid,
	) -> Result<Option<Payment>, DispatchError> {
		let row = sqlx::query(
			r#"
			SELECT
				correlation_id,
				amount::float8 AS amount,
				processor_type,
				requested_at,
				processed_at,
				status
			FROM payments
			WHERE correlation_id = $1
			"#,
		)
		.bind(correlation_id)
		.fetch_optional(&self.pool)
		.await
		.map_err(persistence)?;

		let Some(row) = row else {
			return Ok(None);
		};

		let kind: String = row.try_get("processor_type").map_err(persistence)?;
		let status: String = row.try_get("status").map_err(persistence)?;
		Ok(Some(Payment {
			correlation_id: row
				.try_get("correlation_id")
				.map_err(persistence)?,
			amount: row.try_get("amount").map_err(persistence)?,
			processor: ProcessorKind::parse(&kind)
				.unwrap_or(ProcessorKind::Default),
			requested_at: row.try_get("requested_at").map_err(persistence)?,
			processed_at: row.try_get("processed_at").map_err(persistence)?,
			status: match status.as_str() {
				"failed" => PaymentStatus::Failed,
				"pending" => PaymentStatus::Pending,
				_ => PaymentStatus::Processed,
			},
		}))
	}
}

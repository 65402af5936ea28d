use tokio::time::sleep;

use crate::domain::cache::CacheStore;
use crate::infrastructure::processor::client::ProcessorClient;
use crate::use_cases::check_processor_health::{
	CheckProcessorHealthUseCase, POLL_INTERVAL,
};

/// Background loop refreshing both processor snapshots. One task per
/// replica; the per-processor minimum interval is enforced inside the
/// use case via the cached last-check timestamp, so extra wakeups are
/// harmless.
pub async fn health_poller_worker<C>(
	check_health_use_case: CheckProcessorHealthUseCase<C>,
	default_client: ProcessorClient,
	fallback_client: ProcessorClient,
) where
	C: CacheStore + Clone,
{
	loop {
		check_health_use_case.execute(&default_client).await;
		check_health_use_case.execute(&fallback_client).await;

		sleep(POLL_INTERVAL).await;
	}
}

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::events::AppEvent;
use crate::scheduler::DeferredCallScheduler;

/// How long the controller gets to finish the event in hand and stop.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Ask the controller to stop, then wait for it.
///
/// If it does not stop within `limit` (a slow request in flight), the
/// scheduler is shut down underneath it and the task is aborted.
pub async fn graceful_shutdown<R>(
    scheduler: &DeferredCallScheduler<AppEvent>,
    controller: JoinHandle<R>,
    limit: Duration,
) -> Option<R> {
    tracing::info!("Shutdown sequence started");

    if scheduler.post(AppEvent::Shutdown) {
        tracing::info!("Shutdown: stop request posted");
    } else {
        tracing::info!("Shutdown: controller already stopped");
    }

    let abort = controller.abort_handle();
    let result = match timeout(limit, controller).await {
        Ok(Ok(result)) => {
            tracing::info!("Shutdown: controller stopped");
            Some(result)
        }
        Ok(Err(e)) => {
            tracing::warn!("Shutdown: controller task failed: {e}");
            None
        }
        Err(_) => {
            tracing::warn!("Shutdown: controller did not stop within {limit:?}, aborting");
            scheduler.shutdown();
            abort.abort();
            None
        }
    };

    tracing::info!("Shutdown sequence completed");
    result
}

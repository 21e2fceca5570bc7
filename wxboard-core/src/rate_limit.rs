use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Minimum spacing between outbound requests. Concurrent callers queue on the
/// inner mutex, so spacing holds across tasks.
#[derive(Debug)]
pub(crate) struct RequestSpacing {
    min_interval: Duration,
    last_request_at: Mutex<Option<Instant>>,
}

impl RequestSpacing {
    pub(crate) fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request_at: Mutex::new(None),
        }
    }

    /// Sleep until `min_interval` has passed since the previous turn, then
    /// claim the current instant as the new previous turn.
    pub(crate) async fn wait_turn(&self) {
        let mut last = self.last_request_at.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                let delay = self.min_interval - elapsed;
                tracing::debug!(delay_ms = delay.as_millis() as u64, "spacing out geocoding request");
                tokio::time::sleep(delay).await;
            }
        }

        *last = Some(Instant::now());
    }
}

//! Fire-and-forget recording of access events.
//!
//! The resolution path hands entries to [`AnalyticsRecorder::record`], which only
//! enqueues them on a bounded channel. [`run_analytics_worker`] drains the channel
//! in the background and persists entries with a bounded retry. Neither a full
//! queue nor a failing store ever reaches the caller of `record`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, warn};

use crate::domain::entities::NewAnalyticsEntry;
use crate::domain::repositories::AnalyticsRepository;

/// Attempts made to persist one entry before it is dropped.
const PERSIST_ATTEMPTS: usize = 3;

/// Handle used by the resolution engine to emit access events.
#[derive(Clone)]
pub struct AnalyticsRecorder {
    sender: mpsc::Sender<NewAnalyticsEntry>,
}

impl AnalyticsRecorder {
    /// Creates a recorder together with the receiving end of its queue.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<NewAnalyticsEntry>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Enqueues an entry without waiting. Drops it with a warning if the queue is
    /// full or the worker has stopped.
    pub fn record(&self, entry: NewAnalyticsEntry) {
        match self.sender.try_send(entry) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(entry)) => {
                metrics::counter!("shortcode_analytics_dropped_total", "reason" => "queue_full")
                    .increment(1);
                warn!(url_id = entry.url_id, "Analytics queue full, dropping entry");
            }
            Err(mpsc::error::TrySendError::Closed(entry)) => {
                metrics::counter!("shortcode_analytics_dropped_total", "reason" => "closed")
                    .increment(1);
                warn!(url_id = entry.url_id, "Analytics worker stopped, dropping entry");
            }
        }
    }

    /// Free slots currently left in the queue.
    pub fn remaining_capacity(&self) -> usize {
        self.sender.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Persists queued entries until every sender is dropped.
///
/// Up to `concurrency` inserts run at once. Each insert is retried with jittered
/// exponential backoff; an entry that still fails is logged and dropped.
pub async fn run_analytics_worker(
    mut receiver: mpsc::Receiver<NewAnalyticsEntry>,
    repository: Arc<dyn AnalyticsRepository>,
    concurrency: usize,
) {
    let concurrency = concurrency.max(1);
    let permits = Arc::new(Semaphore::new(concurrency));

    while let Some(entry) = receiver.recv().await {
        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };
        let repository = repository.clone();

        tokio::spawn(async move {
            let _permit = permit;
            persist_entry(repository.as_ref(), entry).await;
        });
    }

    // Wait for in-flight inserts before returning.
    let _ = permits.acquire_many(concurrency as u32).await;
    debug!("Analytics worker stopped");
}

async fn persist_entry(repository: &dyn AnalyticsRepository, entry: NewAnalyticsEntry) {
    let strategy = ExponentialBackoff::from_millis(10)
        .max_delay(Duration::from_secs(1))
        .map(jitter)
        .take(PERSIST_ATTEMPTS - 1);

    let url_id = entry.url_id;
    let result = Retry::spawn(strategy, || repository.insert(entry.clone())).await;

    if let Err(e) = result {
        metrics::counter!("shortcode_analytics_dropped_total", "reason" => "store_error")
            .increment(1);
        error!(url_id, error = %e, "Failed to persist analytics entry");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::AnalyticsEntry;
    use crate::domain::repositories::MockAnalyticsRepository;
    use crate::error::AppError;
    use chrono::Utc;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn entry(url_id: i64) -> NewAnalyticsEntry {
        NewAnalyticsEntry {
            url_id,
            ip: Some("127.0.0.1".to_string()),
            user_agent: None,
            referrer: None,
            timestamp: Utc::now(),
        }
    }

    fn stored(new: NewAnalyticsEntry) -> AnalyticsEntry {
        AnalyticsEntry {
            id: 1,
            url_id: new.url_id,
            ip: new.ip,
            user_agent: new.user_agent,
            referrer: new.referrer,
            timestamp: new.timestamp,
        }
    }

    #[tokio::test]
    async fn test_record_enqueues_entry() {
        let (recorder, mut rx) = AnalyticsRecorder::channel(4);
        recorder.record(entry(10));

        let received = rx.try_recv().unwrap();
        assert_eq!(received.url_id, 10);
    }

    #[tokio::test]
    async fn test_record_drops_when_full() {
        let (recorder, mut rx) = AnalyticsRecorder::channel(1);
        recorder.record(entry(1));
        recorder.record(entry(2));

        assert_eq!(rx.try_recv().unwrap().url_id, 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_record_after_worker_stopped_does_not_panic() {
        let (recorder, rx) = AnalyticsRecorder::channel(1);
        drop(rx);
        assert!(recorder.is_closed());
        recorder.record(entry(1));
    }

    #[tokio::test]
    async fn test_worker_persists_entries() {
        let mut repo = MockAnalyticsRepository::new();
        repo.expect_insert()
            .times(2)
            .returning(|new| Ok(stored(new)));

        let (recorder, rx) = AnalyticsRecorder::channel(8);
        recorder.record(entry(1));
        recorder.record(entry(2));
        drop(recorder);

        run_analytics_worker(rx, Arc::new(repo), 2).await;
    }

    #[tokio::test]
    async fn test_worker_retries_then_gives_up() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut repo = MockAnalyticsRepository::new();
        repo.expect_insert().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(AppError::internal("Database error", json!({})))
        });

        let (recorder, rx) = AnalyticsRecorder::channel(8);
        recorder.record(entry(1));
        drop(recorder);

        run_analytics_worker(rx, Arc::new(repo), 1).await;

        assert_eq!(calls.load(Ordering::SeqCst), PERSIST_ATTEMPTS);
    }
}

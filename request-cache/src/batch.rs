use crate::deduplication::DeduplicationError;
use chrono::Duration;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;

/// Configuration for request batching
#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Quiet period after the latest call for a key before the batch runs
    pub delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            delay: Duration::milliseconds(50),
        }
    }
}

type BatchResult<V, E> = Result<V, DeduplicationError<E>>;
type BatchRequest<V, E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<V, E>> + Send>;

/// Callers queued for the next execution of a key
struct BatchQueue<V, E> {
    generation: u64,
    request: Option<BatchRequest<V, E>>,
    waiters: Vec<oneshot::Sender<BatchResult<V, E>>>,
}

/// Collapses bursts of identical calls.
///
/// Every call to [`RequestBatcher::batch`] restarts the key's timer. When the
/// timer runs out, the first queued request is executed once and all queued
/// callers receive its outcome.
pub struct RequestBatcher<V, E> {
    // Queued requests are `Send` but not `Sync`, so the map sits behind a mutex
    queues: Arc<Mutex<HashMap<String, BatchQueue<V, E>>>>,
    next_generation: AtomicU64,
    config: BatchConfig,
}

impl<V, E> RequestBatcher<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(config: BatchConfig) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            config,
        }
    }

    pub async fn batch<F, Fut>(&self, key: &str, request_fn: F) -> BatchResult<V, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        {
            let mut queues = lock(&self.queues);
            let queue = queues.entry(key.to_string()).or_insert_with(|| BatchQueue {
                generation,
                request: None,
                waiters: vec![],
            });
            queue.generation = generation;
            if queue.request.is_none() {
                queue.request = Some(Box::new(move || request_fn().boxed()));
            }
            queue.waiters.push(tx);
            log::debug!("Queued request for key: {} ({} waiting)", key, queue.waiters.len());
        }

        self.schedule(key.to_string(), generation);

        match rx.await {
            Ok(result) => result,
            Err(_) => {
                log::warn!("Batch for key {} was dropped before completing", key);
                Err(DeduplicationError::Aborted("batch dropped".to_string()))
            }
        }
    }

    fn schedule(&self, key: String, generation: u64) {
        let queues = Arc::clone(&self.queues);
        let delay = self.config.delay.to_std().unwrap_or_default();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // A newer call for the key owns the timer now
            let queue = {
                let mut queues = lock(&queues);
                let current = queues
                    .get(&key)
                    .is_some_and(|queue| queue.generation == generation);
                if current {
                    queues.remove(&key)
                } else {
                    None
                }
            };
            let Some(queue) = queue else {
                return;
            };

            let Some(request) = queue.request else {
                return;
            };

            log::debug!("Executing batch for key: {} with {} waiters", key, queue.waiters.len());
            let result = request().await.map_err(|err| DeduplicationError::Failed(Arc::new(err)));

            for waiter in queue.waiters {
                let _ = waiter.send(result.clone());
            }
        });
    }

    /// Number of keys with callers waiting for a batch to run
    pub fn pending_batches(&self) -> usize {
        lock(&self.queues).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Thread-safe wrapper for the batcher
pub type SharedRequestBatcher<V, E> = Arc<RequestBatcher<V, E>>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration as StdDuration;
    use tokio::time::Instant;

    #[derive(Debug, thiserror::Error)]
    #[error("{0}")]
    struct TestError(&'static str);

    fn counted(
        count: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32, TestError>> + Send + 'static {
        let count = count.clone();
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            async move { Ok(value) }.boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_runs_first_request_once() {
        let batcher = RequestBatcher::new(BatchConfig::default());
        let count = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            batcher.batch("listings:page=1", counted(&count, 1)),
            batcher.batch("listings:page=1", counted(&count, 2)),
            batcher.batch("listings:page=1", counted(&count, 3)),
        );

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 1);
        assert_eq!(c.unwrap(), 1);
        assert_eq!(batcher.pending_batches(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_call_restarts_timer() {
        let batcher = RequestBatcher::new(BatchConfig::default());
        let count = Arc::new(AtomicUsize::new(0));
        let start = Instant::now();

        let (a, b) = tokio::join!(batcher.batch("k", counted(&count, 7)), async {
            tokio::time::sleep(StdDuration::from_millis(30)).await;
            batcher.batch("k", counted(&count, 8)).await
        });

        assert_eq!(a.unwrap(), 7);
        assert_eq!(b.unwrap(), 7);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() >= StdDuration::from_millis(80));
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_keys_run_separately() {
        let batcher = RequestBatcher::new(BatchConfig::default());
        let count = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            batcher.batch("listing:1", counted(&count, 1)),
            batcher.batch("listing:2", counted(&count, 2)),
        );

        assert_eq!(a.unwrap(), 1);
        assert_eq!(b.unwrap(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_reaches_every_caller() {
        let batcher: RequestBatcher<u32, TestError> = RequestBatcher::new(BatchConfig::default());

        let (a, b) = tokio::join!(
            batcher.batch("k", || async { Err(TestError("rate limited")) }),
            batcher.batch("k", || async { Ok(1) }),
        );

        assert_eq!(a.unwrap_err().to_string(), "rate limited");
        assert_eq!(b.unwrap_err().to_string(), "rate limited");
    }
}

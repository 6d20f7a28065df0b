use crate::clock::{SharedClock, SystemClock};
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;

/// Configuration for request deduplication
#[derive(Clone, Debug)]
pub struct DeduplicationConfig {
    /// Whether deduplication is enabled
    pub enabled: bool,
}

impl Default for DeduplicationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

type SharedResult<V, E> = Result<V, DeduplicationError<E>>;
type InFlight<V, E> = Shared<BoxFuture<'static, SharedResult<V, E>>>;

/// A request that is currently executing
struct PendingRequest<V, E> {
    id: u64,
    started_at: DateTime<Utc>,
    future: InFlight<V, E>,
}

type PendingMap<V, E> = DashMap<String, PendingRequest<V, E>>;

/// Request deduplication system
/// When multiple identical requests come in, only the first one is executed
/// and its outcome is shared with every caller that arrived while it was running.
///
/// The work is spawned on the tokio runtime, so it runs to completion even if
/// all callers stop waiting for it.
pub struct RequestDeduplicator<V, E> {
    /// Map of request keys to in-flight requests
    pending: Arc<PendingMap<V, E>>,
    next_id: AtomicU64,
    clock: SharedClock,
    config: DeduplicationConfig,
}

impl<V, E> RequestDeduplicator<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new(config: DeduplicationConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: DeduplicationConfig, clock: SharedClock) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
            clock,
            config,
        }
    }

    /// Run `request_fn` for `key` unless a request for `key` is already in
    /// flight, in which case wait for that one instead.
    ///
    /// `request_fn` is only invoked by the caller that starts the request.
    pub async fn deduplicate<F, Fut>(&self, key: &str, request_fn: F) -> SharedResult<V, E>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        if !self.config.enabled {
            return request_fn()
                .await
                .map_err(|err| DeduplicationError::Failed(Arc::new(err)));
        }

        let (sender, receiver) = oneshot::channel();
        let (in_flight, started) = match self.pending.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                log::debug!("Request already pending for key: {}", key);
                (entry.get().future.clone(), None)
            }
            Entry::Vacant(entry) => {
                log::debug!("Executing new request for key: {}", key);
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let future = Self::settled(receiver);
                entry.insert(PendingRequest {
                    id,
                    started_at: self.clock.now(),
                    future: future.clone(),
                });
                (future, Some(id))
            }
        };

        // The map guard is gone, so `request_fn` may use this deduplicator
        if let Some(id) = started {
            let release = PendingRelease {
                pending: Arc::clone(&self.pending),
                key: key.to_string(),
                id,
            };
            let work = request_fn();

            tokio::spawn(async move {
                let sender = sender;
                // Dropped first on unwind, releasing the key before waiters see the abort
                let release = release;
                let result = work
                    .await
                    .map_err(|err| DeduplicationError::Failed(Arc::new(err)));
                drop(release);
                let _ = sender.send(result);
            });
        }

        in_flight.await
    }

    /// Shared view of the outcome the request task sends through `receiver`
    fn settled(receiver: oneshot::Receiver<SharedResult<V, E>>) -> InFlight<V, E> {
        async move {
            receiver.await.unwrap_or_else(|_| {
                log::warn!("Deduplicated request aborted before settling");
                Err(DeduplicationError::Aborted(
                    "request task ended without a result".to_string(),
                ))
            })
        }
        .boxed()
        .shared()
    }

    /// Whether a request for `key` is currently in flight
    pub fn is_pending(&self, key: &str) -> bool {
        self.pending.contains_key(key)
    }

    /// Forget in-flight requests whose key starts with `prefix`, or all of them.
    ///
    /// Forgotten requests keep running and their current callers still get the
    /// result; the next caller for the same key starts a new request.
    pub fn clear(&self, prefix: Option<&str>) -> usize {
        let before = self.pending.len();
        match prefix {
            Some(prefix) => self.pending.retain(|key, _| !key.starts_with(prefix)),
            None => self.pending.clear(),
        }
        let removed = before.saturating_sub(self.pending.len());
        log::info!("Request deduplicator cleared {} pending requests", removed);
        removed
    }

    /// Get statistics about pending requests
    pub fn stats(&self) -> DeduplicationStats {
        let oldest_started_at = self
            .pending
            .iter()
            .map(|entry| entry.value().started_at)
            .min();

        DeduplicationStats {
            pending_requests: self.pending.len(),
            oldest_started_at,
        }
    }
}

/// Removes the pending entry it was created for, unless the key has since
/// been taken over by a newer request.
struct PendingRelease<V, E> {
    pending: Arc<PendingMap<V, E>>,
    key: String,
    id: u64,
}

impl<V, E> Drop for PendingRelease<V, E> {
    fn drop(&mut self) {
        let id = self.id;
        self.pending.remove_if(&self.key, |_, request| request.id == id);
    }
}

/// Statistics for request deduplication
#[derive(Debug, Clone)]
pub struct DeduplicationStats {
    pub pending_requests: usize,
    pub oldest_started_at: Option<DateTime<Utc>>,
}

/// Errors that can occur during request deduplication
#[derive(Debug, thiserror::Error)]
pub enum DeduplicationError<E> {
    /// The request function returned an error. Every caller shares it.
    #[error("{0}")]
    Failed(Arc<E>),
    /// The request task panicked or was cancelled by the runtime
    #[error("Request aborted: {0}")]
    Aborted(String),
}

impl<E> DeduplicationError<E> {
    /// The error returned by the request function, if that is what happened
    pub fn failure(&self) -> Option<&E> {
        match self {
            DeduplicationError::Failed(err) => Some(&**err),
            DeduplicationError::Aborted(_) => None,
        }
    }
}

// Derived Clone would require `E: Clone`; the error is shared instead.
impl<E> Clone for DeduplicationError<E> {
    fn clone(&self) -> Self {
        match self {
            DeduplicationError::Failed(err) => DeduplicationError::Failed(Arc::clone(err)),
            DeduplicationError::Aborted(reason) => DeduplicationError::Aborted(reason.clone()),
        }
    }
}

impl<V, E> fmt::Debug for RequestDeduplicator<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDeduplicator")
            .field("pending_requests", &self.pending.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Thread-safe wrapper for the deduplicator
pub type SharedRequestDeduplicator<V, E> = Arc<RequestDeduplicator<V, E>>;

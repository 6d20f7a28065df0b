use crate::{CacheConfig, DeduplicationConfig, ManualClock, RequestCache};
use chrono::Duration;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct FetchError(String);

fn request_cache() -> (RequestCache<Value, FetchError>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let cache = RequestCache::with_clock(
        CacheConfig::default(),
        DeduplicationConfig::default(),
        clock.clone(),
    );
    (cache, clock)
}

#[test]
fn test_set_then_expire_scenario() {
    let (cache, clock) = request_cache();

    cache.set("a", json!({"x": 1}), Duration::seconds(1));
    assert_eq!(cache.get("a"), Some(json!({"x": 1})));

    clock.advance(Duration::milliseconds(1100));
    assert_eq!(cache.get("a"), None);
}

#[test]
fn test_get_returns_most_recent_set() {
    let (cache, clock) = request_cache();

    cache.set("listing:42", json!({"title": "HU66 Lishi"}), Duration::seconds(60));
    cache.set("listing:42", json!({"title": "HU100 Lishi"}), Duration::seconds(60));
    clock.advance(Duration::seconds(59));

    assert_eq!(cache.get("listing:42"), Some(json!({"title": "HU100 Lishi"})));
}

#[test]
fn test_clear_prefix_leaves_other_keys() {
    let (cache, _clock) = request_cache();

    cache.set("listings:category=keys", json!([]), Duration::seconds(60));
    cache.set("listings:", json!([]), Duration::seconds(60));
    cache.set("listing:7", json!({}), Duration::seconds(60));
    cache.set("messages:7", json!({}), Duration::seconds(60));

    assert_eq!(cache.clear(Some("listings:")), 2);
    assert!(cache.has("listing:7"));
    assert!(cache.has("messages:7"));
    assert_eq!(cache.stats().total_entries, 2);
}

#[tokio::test(start_paused = true)]
async fn test_get_or_fetch_collapses_concurrent_misses() {
    let (cache, _clock) = request_cache();
    let fetches = Arc::new(AtomicUsize::new(0));

    let fetch = |fetches: Arc<AtomicUsize>| {
        move || {
            fetches.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok::<_, FetchError>(json!({"id": "7", "price": 45.0}))
            }
        }
    };

    let (a, b) = tokio::join!(
        cache.get_or_fetch("listing:7", Duration::seconds(60), fetch(fetches.clone())),
        cache.get_or_fetch("listing:7", Duration::seconds(60), fetch(fetches.clone())),
    );
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(fetches.load(Ordering::SeqCst), 1);

    // Served from cache now
    let c = cache
        .get_or_fetch("listing:7", Duration::seconds(60), fetch(fetches.clone()))
        .await
        .unwrap();
    assert_eq!(c, json!({"id": "7", "price": 45.0}));
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_get_or_fetch_does_not_cache_errors() {
    let (cache, _clock) = request_cache();

    let result = cache
        .get_or_fetch("listing:9", Duration::seconds(60), || async {
            Err(FetchError("Failed to fetch listing".to_string()))
        })
        .await;
    assert_eq!(result.unwrap_err().to_string(), "Failed to fetch listing");
    assert!(!cache.has("listing:9"));
    assert!(!cache.is_pending("listing:9"));

    let result = cache
        .get_or_fetch("listing:9", Duration::seconds(60), || async { Ok(json!({"id": "9"})) })
        .await;
    assert_eq!(result.unwrap(), json!({"id": "9"}));
    assert!(cache.has("listing:9"));
}

#[tokio::test]
async fn test_refetch_after_expiry() {
    let (cache, clock) = request_cache();
    let fetches = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let fetches = fetches.clone();
        cache
            .get_or_fetch("listings:page=2", Duration::seconds(30), move || {
                fetches.fetch_add(1, Ordering::SeqCst);
                async { Ok(json!([])) }
            })
            .await
            .unwrap();
        clock.advance(Duration::seconds(31));
    }

    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}

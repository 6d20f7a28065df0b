use chrono::Duration;
use request_cache::{CacheConfig, DeduplicationConfig, RequestCache};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct BackendError(String);

async fn slow_listing_fetch(id: &'static str) -> Result<String, BackendError> {
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    Ok(format!("listing {}", id))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();

    let cache: Arc<RequestCache<String, BackendError>> = Arc::new(RequestCache::new(
        CacheConfig::default(),
        DeduplicationConfig::default(),
    ));

    println!("=== Concurrent identical requests ===");
    let start = std::time::Instant::now();
    let mut handles = vec![];
    for _ in 0..5 {
        let cache = cache.clone();
        handles.push(tokio::spawn(async move {
            cache
                .get_or_fetch("listing:42", Duration::seconds(60), || slow_listing_fetch("42"))
                .await
        }));
    }
    for handle in handles {
        println!("Got: {}", handle.await??);
    }
    println!("Five callers took: {:?}", start.elapsed());

    println!("\n=== Cached read ===");
    let start = std::time::Instant::now();
    let cached = cache.get("listing:42");
    println!("Cached value {:?} in {:?}", cached, start.elapsed());

    println!("\n=== Cache management ===");
    println!("Stats before clear: {:?}", cache.stats());
    cache.clear(Some("listing:"));
    println!("Stats after clear: {:?}", cache.stats());

    Ok(())
}

// In-memory request caching, deduplication and batching

pub mod batch;
pub mod cache;
pub mod clock;
pub mod deduplication;
mod layer;

#[cfg(test)]
mod tests;

// Re-export for convenience
pub use batch::{BatchConfig, RequestBatcher, SharedRequestBatcher};
pub use cache::{CacheConfig, CacheEntry, CacheStats, TtlCache};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use deduplication::{
    DeduplicationConfig, DeduplicationError, DeduplicationStats, RequestDeduplicator,
    SharedRequestDeduplicator,
};
pub use layer::{RequestCache, SharedRequestCache};

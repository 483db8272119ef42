//! Content-addressed memoization of transform results
//!
//! Descriptions are rendered far more often than they are edited, and the
//! transform is a pure function of its input, so a result can be reused for
//! as long as the input text is byte-identical. Entries are keyed by a
//! BLAKE3 digest of the Markdown source (first 16 bytes, hex encoded).
//!
//! The cache is bounded: once `capacity` entries are held, the oldest entry
//! is evicted first. Output with or without the cache is identical.
//!
//! # Examples
//!
//! ```rust
//! use safe_markdown::cache::TransformCache;
//! use safe_markdown::pipeline::MarkdownPipeline;
//!
//! let cache = TransformCache::with_capacity(128);
//! let pipeline = MarkdownPipeline::new();
//!
//! let first = cache.get_or_transform("*low miles*", |md| pipeline.transform(md));
//! let second = cache.get_or_transform("*low miles*", |_| unreachable!());
//! assert_eq!(first, second);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Default number of cached results
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// BLAKE3 content hasher for cache keys
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentHasher;

impl ContentHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash content to a 32-character hex key
    ///
    /// # Examples
    ///
    /// ```rust
    /// use safe_markdown::cache::ContentHasher;
    ///
    /// let key = ContentHasher::new().key(b"# Title");
    /// assert_eq!(key.len(), 32);
    /// assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    /// ```
    pub fn key(&self, content: &[u8]) -> String {
        let hash = blake3::hash(content);
        // 128 bits is plenty for a bounded in-process cache
        hex::encode(&hash.as_bytes()[..16])
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, String>,
    order: VecDeque<String>,
}

/// Bounded FIFO cache of transform results
#[derive(Debug)]
pub struct TransformCache {
    hasher: ContentHasher,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl TransformCache {
    /// Create a cache with [`DEFAULT_CACHE_CAPACITY`]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `capacity` results
    ///
    /// A capacity of zero disables storage; every call transforms.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hasher: ContentHasher::new(),
            capacity,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Return the cached result for `markdown`, or compute and store it
    ///
    /// `transform` runs outside the lock, so two threads missing on the same
    /// input may both compute it; the results are identical.
    pub fn get_or_transform<F>(&self, markdown: &str, transform: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        let key = self.hasher.key(markdown.as_bytes());

        if let Ok(state) = self.state.lock()
            && let Some(hit) = state.entries.get(&key)
        {
            tracing::trace!(key = %key, "transform cache hit");
            return hit.clone();
        }

        let html = transform(markdown);
        self.insert(key, &html);
        html
    }

    fn insert(&self, key: String, html: &str) {
        if self.capacity == 0 {
            return;
        }
        // A poisoned lock only costs us the memoization
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        if state.entries.contains_key(&key) {
            return;
        }

        while state.entries.len() >= self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
        }

        state.order.push_back(key.clone());
        state.entries.insert(key, html.to_string());
    }

    /// Number of cached results
    pub fn len(&self) -> usize {
        self.state.lock().map_or(0, |state| state.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached result
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.entries.clear();
            state.order.clear();
        }
    }
}

impl Default for TransformCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;

    #[test]
    fn test_key_format() {
        let key = ContentHasher::new().key(b"test content");
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_key_consistency_and_uniqueness() {
        let hasher = ContentHasher::new();
        assert_eq!(hasher.key(b"same"), hasher.key(b"same"));
        assert_ne!(hasher.key(b"content 1"), hasher.key(b"content 2"));
        assert_eq!(hasher.key(b"").len(), 32);
    }

    #[test]
    fn test_hit_skips_transform() {
        let cache = TransformCache::with_capacity(4);
        let calls = Cell::new(0);
        let run = |md: &str| {
            calls.set(calls.get() + 1);
            md.to_uppercase()
        };

        assert_eq!(cache.get_or_transform("abc", run), "ABC");
        assert_eq!(cache.get_or_transform("abc", run), "ABC");
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_fifo_eviction() {
        let cache = TransformCache::with_capacity(2);
        cache.get_or_transform("a", str::to_string);
        cache.get_or_transform("b", str::to_string);
        cache.get_or_transform("c", str::to_string);
        assert_eq!(cache.len(), 2);

        // "a" was evicted and must be recomputed
        let recomputed = Cell::new(false);
        cache.get_or_transform("a", |md| {
            recomputed.set(true);
            md.to_string()
        });
        assert!(recomputed.get());
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = TransformCache::with_capacity(0);
        cache.get_or_transform("a", str::to_string);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = TransformCache::new();
        cache.get_or_transform("a", str::to_string);
        cache.clear();
        assert!(cache.is_empty());
    }

    proptest! {
        #[test]
        fn prop_len_never_exceeds_capacity(
            capacity in 0usize..8,
            inputs in prop::collection::vec("[a-z]{0,4}", 0..32)
        ) {
            let cache = TransformCache::with_capacity(capacity);
            for input in &inputs {
                cache.get_or_transform(input, str::to_string);
                prop_assert!(cache.len() <= capacity);
            }
        }
    }
}

//! API key pool with per-session shuffling and round-robin rotation
//!
//! The remote service rate-limits per key, so the application keeps a pool of
//! keys and walks them with a cursor that survives across fetches. Each fetch
//! cycle takes one `KeyRotation`, which offers every key at most once; the
//! shared cursor means consecutive cycles continue round-robin instead of
//! hammering the same key first every time.

use log::warn;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};

/// An ordered, deduplicated pool of API keys
#[derive(Debug)]
pub struct ApiKeyPool {
    /// Keys in rotation order (post-shuffle)
    keys: Vec<String>,
    /// Index of the next key to hand out, advancing mod `keys.len()`
    cursor: AtomicUsize,
}

impl ApiKeyPool {
    /// Builds a pool from raw candidate strings
    ///
    /// Candidates are trimmed, empties dropped, and duplicates removed while
    /// preserving first-seen order. An empty result is not an error; fetches
    /// against an empty pool behave like an exhausted one.
    pub fn new(candidates: Vec<String>) -> Self {
        let mut keys: Vec<String> = Vec::new();
        for candidate in candidates {
            let trimmed = candidate.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !keys.iter().any(|k| k == trimmed) {
                keys.push(trimmed.to_string());
            }
        }

        if keys.is_empty() {
            warn!("no API keys configured; remote fetches will be unavailable");
        }

        Self {
            keys,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Shuffles the pool in place
    ///
    /// Called once at startup so the first key tried varies between sessions.
    pub fn shuffle(&mut self) {
        self.keys.shuffle(&mut rand::thread_rng());
    }

    /// Number of keys in the pool
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// True when no keys are configured
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Starts one rotation over the pool
    ///
    /// The rotation yields at most `len()` keys, each exactly once, starting
    /// from the shared cursor and advancing it as keys are consumed.
    pub fn rotation(&self) -> KeyRotation<'_> {
        KeyRotation {
            pool: self,
            remaining: self.keys.len(),
        }
    }
}

/// One bounded pass over the key pool
#[derive(Debug)]
pub struct KeyRotation<'a> {
    pool: &'a ApiKeyPool,
    remaining: usize,
}

impl Iterator for KeyRotation<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.remaining == 0 || self.pool.keys.is_empty() {
            return None;
        }
        self.remaining -= 1;
        let idx = self.pool.cursor.fetch_add(1, Ordering::Relaxed) % self.pool.keys.len();
        Some(self.pool.keys[idx].clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for KeyRotation<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_of(keys: &[&str]) -> ApiKeyPool {
        ApiKeyPool::new(keys.iter().map(|k| k.to_string()).collect())
    }

    #[test]
    fn test_new_deduplicates_preserving_order() {
        let pool = pool_of(&["beta", "alpha", "beta", " alpha "]);
        let keys: Vec<String> = pool.rotation().collect();
        assert_eq!(keys, vec!["beta", "alpha"]);
    }

    #[test]
    fn test_new_drops_blank_candidates() {
        let pool = pool_of(&["", "   ", "real-key"]);
        assert_eq!(pool.len(), 1);
        let keys: Vec<String> = pool.rotation().collect();
        assert_eq!(keys, vec!["real-key"]);
    }

    #[test]
    fn test_empty_pool_rotation_is_immediately_exhausted() {
        let pool = pool_of(&[]);
        assert!(pool.is_empty());
        assert_eq!(pool.rotation().next(), None);
    }

    #[test]
    fn test_rotation_yields_each_key_exactly_once() {
        let pool = pool_of(&["k1", "k2", "k3"]);
        let mut keys: Vec<String> = pool.rotation().collect();
        keys.sort();
        assert_eq!(keys, vec!["k1", "k2", "k3"]);
        assert_eq!(pool.rotation().len(), 3);
    }

    #[test]
    fn test_consecutive_rotations_continue_round_robin() {
        let pool = pool_of(&["k1", "k2", "k3"]);

        // Consume a single key, then abandon the rotation
        let first = pool.rotation().next().expect("key");
        assert_eq!(first, "k1");

        // The next rotation picks up where the cursor left off
        let second: Vec<String> = pool.rotation().collect();
        assert_eq!(second, vec!["k2", "k3", "k1"]);
    }

    #[test]
    fn test_full_rotations_wrap_to_the_same_start() {
        let pool = pool_of(&["k1", "k2"]);
        let first: Vec<String> = pool.rotation().collect();
        let second: Vec<String> = pool.rotation().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shuffle_preserves_the_key_set() {
        let mut pool = pool_of(&["k1", "k2", "k3", "k4", "k5"]);
        pool.shuffle();
        let mut keys: Vec<String> = pool.rotation().collect();
        keys.sort();
        assert_eq!(keys, vec!["k1", "k2", "k3", "k4", "k5"]);
    }

    #[test]
    fn test_shuffle_of_single_key_pool_is_stable() {
        let mut pool = pool_of(&["only"]);
        pool.shuffle();
        let keys: Vec<String> = pool.rotation().collect();
        assert_eq!(keys, vec!["only"]);
    }
}

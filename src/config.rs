//! Environment-driven configuration
//!
//! API keys come from `GEMINI_API_KEY_POOL` (comma-separated) merged with the
//! single `GEMINI_API_KEY`, in that order. Values are trimmed and blanks
//! dropped here; deduplication is the key pool's job. A `.env` file is
//! honored when present (main loads it before reading the environment).

use std::env;

/// Environment variable holding a comma-separated pool of API keys
pub const KEY_POOL_ENV: &str = "GEMINI_API_KEY_POOL";

/// Environment variable holding a single API key
pub const SINGLE_KEY_ENV: &str = "GEMINI_API_KEY";

/// Application configuration assembled at startup
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Candidate API keys in configuration order, pool entries first
    pub api_keys: Vec<String>,
}

impl Settings {
    /// Reads configuration from the process environment
    pub fn from_env() -> Self {
        let pool = env::var(KEY_POOL_ENV).ok();
        let single = env::var(SINGLE_KEY_ENV).ok();
        Self {
            api_keys: merge_key_sources(pool.as_deref(), single.as_deref()),
        }
    }
}

/// Merges the pooled and single-key sources into one candidate list
fn merge_key_sources(pool: Option<&str>, single: Option<&str>) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    if let Some(pool) = pool {
        keys.extend(
            pool.split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
        );
    }
    if let Some(single) = single {
        let single = single.trim();
        if !single.is_empty() {
            keys.push(single.to_string());
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_combines_pool_then_single() {
        let keys = merge_key_sources(Some("alpha, beta"), Some("gamma"));
        assert_eq!(keys, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_merge_with_pool_only() {
        let keys = merge_key_sources(Some("one,two,three"), None);
        assert_eq!(keys, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_merge_with_single_only() {
        let keys = merge_key_sources(None, Some("  solo  "));
        assert_eq!(keys, vec!["solo"]);
    }

    #[test]
    fn test_merge_drops_blank_entries() {
        let keys = merge_key_sources(Some(" , ,real, "), Some("   "));
        assert_eq!(keys, vec!["real"]);
    }

    #[test]
    fn test_merge_keeps_duplicates_for_the_pool_to_resolve() {
        let keys = merge_key_sources(Some("same,same"), Some("same"));
        assert_eq!(keys, vec!["same", "same", "same"]);
    }

    #[test]
    fn test_merge_with_nothing_configured() {
        assert!(merge_key_sources(None, None).is_empty());
    }
}

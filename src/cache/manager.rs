//! Cache manager for persisting API responses to disk
//!
//! Provides a `CacheManager` that stores serializable data to JSON files
//! stamped with their write time. Freshness is decided by the reader: `get`
//! takes a TTL, removes entries older than it, and treats every storage or
//! parse failure as a plain cache miss.

use chrono::Utc;
use directories::ProjectDirs;
use log::debug;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Wrapper struct for cached data stored on disk
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// When the data was written, as epoch milliseconds
    timestamp: i64,
    /// The cached data
    data: T,
}

/// Manages reading and writing cached data to disk
///
/// The cache manager stores data as JSON files in an XDG-compliant cache
/// directory (`~/.cache/grid7/` on Linux). Each entry records when it was
/// written; `get` enforces the caller's TTL and deletes entries that have
/// outlived it. Failures to read or write are never surfaced to callers,
/// so a broken cache degrades to "always miss" rather than an error.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
}

impl CacheManager {
    /// Creates a new CacheManager using an XDG-compliant cache directory
    ///
    /// Uses `~/.cache/grid7/` on Linux, or the equivalent path on other
    /// platforms. Returns `None` if the cache directory cannot be determined
    /// (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "grid7")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a new CacheManager with a custom cache directory
    ///
    /// Useful for testing or when a specific cache location is needed.
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Returns the path to a cache file for the given key
    ///
    /// Keys may contain characters that are not filename-safe (the speech
    /// cache keys embed raw summary text); anything outside
    /// `[A-Za-z0-9._-]` is mapped to `_`.
    fn entry_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.cache_dir.join(format!("{}.json", safe))
    }

    /// Writes data to the cache, stamped with the current time
    ///
    /// Serialization and I/O failures are logged at debug level and
    /// swallowed; a failed write simply means the next `get` misses.
    pub fn set<T: Serialize>(&self, key: &str, data: &T) {
        if let Err(e) = self.try_set(key, data) {
            debug!("cache write for '{}' failed: {}", key, e);
        }
    }

    fn try_set<T: Serialize>(&self, key: &str, data: &T) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let entry = CacheEntry {
            timestamp: Utc::now().timestamp_millis(),
            data,
        };
        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(self.entry_path(key), json)
    }

    /// Reads data from the cache if it is younger than `ttl`
    ///
    /// Returns `None` when the entry is missing, unreadable, or unparseable.
    /// An entry older than `ttl` is deleted on the spot and reported as a
    /// miss, so a stale entry is observed at most once.
    pub fn get<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let path = self.entry_path(key);
        let content = fs::read_to_string(&path).ok()?;
        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("cache entry for '{}' is corrupt: {}", key, e);
                return None;
            }
        };

        let age_ms = Utc::now().timestamp_millis() - entry.timestamp;
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        if age_ms > ttl_ms {
            debug!("cache entry for '{}' is stale ({}ms old), removing", key, age_ms);
            let _ = fs::remove_file(&path);
            return None;
        }

        Some(entry.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::thread;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    const HOUR: Duration = Duration::from_secs(60 * 60);

    fn create_test_cache() -> (CacheManager, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = CacheManager::with_dir(temp_dir.path().to_path_buf());
        (cache, temp_dir)
    }

    #[test]
    fn test_set_creates_file_in_cache_directory() {
        let (cache, temp_dir) = create_test_cache();
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };

        cache.set("test_key", &data);

        let expected_path = temp_dir.path().join("test_key.json");
        assert!(expected_path.exists(), "Cache file should exist");

        // Verify the file contains the entry wrapper and payload
        let content = fs::read_to_string(&expected_path).expect("Should read file");
        assert!(content.contains("\"timestamp\""));
        assert!(content.contains("\"name\""));
        assert!(content.contains("\"test\""));
        assert!(content.contains("42"));
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let (cache, _temp_dir) = create_test_cache();

        let result: Option<TestData> = cache.get("nonexistent_key", HOUR);

        assert!(result.is_none(), "Should return None for missing key");
    }

    #[test]
    fn test_set_then_get_returns_fresh_data() {
        let (cache, _temp_dir) = create_test_cache();
        let data = TestData {
            name: "fresh".to_string(),
            value: 100,
        };

        cache.set("fresh_key", &data);

        let result: TestData = cache.get("fresh_key", HOUR).expect("Should read fresh cache");
        assert_eq!(result, data);
    }

    #[test]
    fn test_stale_entry_is_removed_on_read() {
        let (cache, temp_dir) = create_test_cache();
        let data = TestData {
            name: "stale".to_string(),
            value: 0,
        };

        cache.set("stale_key", &data);
        thread::sleep(Duration::from_millis(10));

        let result: Option<TestData> = cache.get("stale_key", Duration::ZERO);
        assert!(result.is_none(), "Zero-TTL read should be a miss");
        assert!(
            !temp_dir.path().join("stale_key.json").exists(),
            "Stale entry should be deleted"
        );

        // Once removed, even a generous TTL cannot resurrect it
        let retry: Option<TestData> = cache.get("stale_key", HOUR);
        assert!(retry.is_none(), "Removed entry should stay gone");
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let (cache, temp_dir) = create_test_cache();
        fs::create_dir_all(temp_dir.path()).expect("dir");
        fs::write(temp_dir.path().join("bad_key.json"), "not json").expect("write");

        let result: Option<TestData> = cache.get("bad_key", HOUR);

        assert!(result.is_none(), "Corrupt entry should read as a miss");
    }

    #[test]
    fn test_set_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested_path = temp_dir.path().join("nested").join("cache").join("dir");
        let cache = CacheManager::with_dir(nested_path.clone());

        let data = TestData {
            name: "nested".to_string(),
            value: 1,
        };

        cache.set("nested_key", &data);

        assert!(nested_path.exists(), "Nested directory should be created");
        assert!(nested_path.join("nested_key.json").exists(), "Cache file should exist");
    }

    #[test]
    fn test_set_failure_is_swallowed() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "occupied").expect("write");

        // cache_dir points at an existing file, so every write must fail
        let cache = CacheManager::with_dir(blocker);
        let data = TestData {
            name: "doomed".to_string(),
            value: 7,
        };

        cache.set("doomed_key", &data);

        let result: Option<TestData> = cache.get("doomed_key", HOUR);
        assert!(result.is_none(), "Failed write should behave as a miss");
    }

    #[test]
    fn test_keys_with_unsafe_characters_roundtrip() {
        let (cache, temp_dir) = create_test_cache();
        let data = TestData {
            name: "spoken".to_string(),
            value: 3,
        };
        let key = "speech:OpenAI ships a new model/today";

        cache.set(key, &data);

        let result: TestData = cache.get(key, HOUR).expect("Sanitized key should roundtrip");
        assert_eq!(result, data);

        let on_disk: Vec<_> = fs::read_dir(temp_dir.path())
            .expect("read dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(on_disk.len(), 1);
        assert!(
            !on_disk[0].contains(':') && !on_disk[0].contains('/'),
            "Filename should be sanitized, got {:?}",
            on_disk
        );
    }

    #[test]
    fn test_overwrite_existing_cache() {
        let (cache, _temp_dir) = create_test_cache();
        let data1 = TestData {
            name: "first".to_string(),
            value: 1,
        };
        let data2 = TestData {
            name: "second".to_string(),
            value: 2,
        };

        cache.set("overwrite_key", &data1);
        cache.set("overwrite_key", &data2);

        let result: TestData = cache.get("overwrite_key", HOUR).expect("Should read cache");
        assert_eq!(result, data2, "Cache should contain latest data");
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(cache) = CacheManager::new() {
            let path_str = cache.cache_dir.to_string_lossy();
            assert!(
                path_str.contains("grid7"),
                "Cache path should contain project name"
            );
        }
        // Test passes if new() returns None (e.g., no home directory in CI)
    }
}

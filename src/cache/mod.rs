//! Cache module for storing API responses to disk
//!
//! This module provides a cache manager that persists API responses to the
//! filesystem as timestamped JSON entries. Readers supply a TTL; entries past
//! it are removed on read, and any storage failure degrades to a cache miss
//! so the application keeps working without a usable cache directory.

mod manager;

pub use manager::CacheManager;

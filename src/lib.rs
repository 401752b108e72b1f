//! Grid7 library
//!
//! Exposes the resilient fetch core (cache, key rotation, retry, cooldown,
//! content fetchers) and the CLI definitions for use in integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod cooldown;
pub mod data;
pub mod fetch;
pub mod gemini;
pub mod keys;
pub mod retry;

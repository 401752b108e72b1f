//! Shared cooldown flag that suppresses remote calls after key exhaustion
//!
//! When every API key in a rotation comes back rate-limited, fetchers engage
//! this flag for a fixed window and skip the network entirely until it
//! lapses. The flag is plain shared state (hand the same instance to every
//! fetcher, usually behind an `Arc`); tests construct their own instances.

use log::debug;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A time-bounded "stop calling the API" flag
#[derive(Debug, Default)]
pub struct Cooldown {
    ends_at: Mutex<Option<Instant>>,
}

impl Cooldown {
    /// Creates an inactive cooldown
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates the cooldown for `duration` from now
    pub fn engage(&self, duration: Duration) {
        let mut ends_at = self.lock();
        *ends_at = Some(Instant::now() + duration);
    }

    /// True while the cooldown window is still open
    ///
    /// The call that first observes an expired window clears the flag, so
    /// expiry needs no background task.
    pub fn is_active(&self) -> bool {
        let mut ends_at = self.lock();
        match *ends_at {
            Some(t) if Instant::now() < t => true,
            Some(_) => {
                debug!("cooldown window elapsed, resuming remote calls");
                *ends_at = None;
                false
            }
            None => false,
        }
    }

    /// Time left in the window, if one is open
    pub fn remaining(&self) -> Option<Duration> {
        let ends_at = self.lock();
        ends_at.and_then(|t| t.checked_duration_since(Instant::now()))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        // A poisoned lock only means another thread panicked mid-update;
        // the Option inside is still usable.
        self.ends_at.lock().unwrap_or_else(|e| e.into_inner())
    }
}

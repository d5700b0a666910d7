//! Per-key cooldown guard.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rejects a key that was accepted less than `cooldown` ago.
#[derive(Debug)]
pub struct CooldownGuard {
    cooldown: Duration,
    last_accepted: Mutex<HashMap<String, Instant>>,
}

impl CooldownGuard {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_accepted: Mutex::new(HashMap::new()),
        }
    }

    /// Accept `key` now, or return how long the caller still has to wait.
    pub fn try_acquire(&self, key: &str) -> Result<(), Duration> {
        self.try_acquire_at(key, Instant::now())
    }

    fn try_acquire_at(&self, key: &str, now: Instant) -> Result<(), Duration> {
        let mut last = self
            .last_accepted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(previous) = last.get(key) {
            let elapsed = now.saturating_duration_since(*previous);
            if elapsed < self.cooldown {
                return Err(self.cooldown - elapsed);
            }
        }

        // Drop entries that can no longer block anything
        let cooldown = self.cooldown;
        last.retain(|_, at| now.saturating_duration_since(*at) < cooldown);
        last.insert(key.to_string(), now);
        Ok(())
    }
}

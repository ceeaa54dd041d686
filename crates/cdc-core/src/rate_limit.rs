//! Per-host token bucket, resolving spec.md §9's rate-limiting Open
//! Question. Default: one request per 500ms per host. `acquire` blocks the
//! calling thread until a slot is free, which is acceptable in the blocking
//! pipeline model (SPEC_FULL.md §1).

use std::collections::HashMap;
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    interval: Duration,
    last_request: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: Mutex::new(HashMap::new()),
        }
    }

    pub fn default_interval() -> Duration {
        Duration::from_millis(500)
    }

    /// Block until a request to `host` is allowed under this limiter's
    /// interval, then reserve the slot.
    pub fn acquire(&self, host: &str) {
        loop {
            let wait = {
                let mut guard = self.last_request.lock().unwrap();
                match guard.get(host) {
                    Some(&last) if last.elapsed() < self.interval => {
                        Some(self.interval - last.elapsed())
                    }
                    _ => {
                        guard.insert(host.to_string(), Instant::now());
                        None
                    }
                }
            };
            match wait {
                None => return,
                Some(d) => thread::sleep(d),
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Self::default_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_for_same_host_waits() {
        let limiter = RateLimiter::new(Duration::from_millis(30));
        let start = Instant::now();
        limiter.acquire("example.com");
        limiter.acquire("example.com");
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn different_hosts_do_not_block_each_other() {
        let limiter = RateLimiter::new(Duration::from_secs(10));
        let start = Instant::now();
        limiter.acquire("a.example.com");
        limiter.acquire("b.example.com");
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}

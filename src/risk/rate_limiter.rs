//! Token-bucket rate limiter over a sliding time window, backed by a
//! timestamp deque protected by a mutex.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        info!(max_requests, window_s = window.as_secs_f64(), "rate limiter initialized");
        Self { max_requests, window, timestamps: Mutex::new(VecDeque::new()) }
    }

    fn evict_expired(&self, timestamps: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&front) = timestamps.front() {
            if now.duration_since(front) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Non-blocking: records and returns `true` if a slot is free, else
    /// returns `false` without waiting.
    pub fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut timestamps = self.timestamps.lock().unwrap();
        self.evict_expired(&mut timestamps, now);

        if timestamps.len() < self.max_requests as usize {
            timestamps.push_back(now);
            true
        } else {
            false
        }
    }

    /// Blocks (async) up to `timeout` for a slot to free up.
    pub async fn acquire(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if self.try_acquire() {
                return true;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    warn!("rate limiter timeout exceeded");
                    return false;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    pub fn available(&self) -> u32 {
        let now = Instant::now();
        let mut timestamps = self.timestamps.lock().unwrap();
        self.evict_expired(&mut timestamps, now);
        self.max_requests - timestamps.len() as u32
    }

    pub fn reset(&self) {
        self.timestamps.lock().unwrap().clear();
        info!("rate limiter reset");
    }
}

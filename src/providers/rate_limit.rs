use crate::core::error::ConversionError;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_MAX_REQUESTS: usize = 100;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

struct Window {
    count: usize,
    resets_at: Instant,
}

/// Fixed-window request limit per user. A window opens on the first request
/// and admits `max_requests` until it expires.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Takes one slot for `user`, or fails with `ProviderUnavailable` once the
    /// current window is used up.
    pub async fn check(&self, user: &str) -> Result<(), ConversionError> {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        match windows.get_mut(user) {
            Some(window) if now < window.resets_at => {
                if window.count >= self.max_requests {
                    debug!(%user, "Rate limit reached");
                    return Err(ConversionError::ProviderUnavailable(format!(
                        "Rate limit of {} requests per {}s reached, try again shortly",
                        self.max_requests,
                        self.window.as_secs()
                    )));
                }
                window.count += 1;
            }
            _ => {
                windows.insert(
                    user.to_string(),
                    Window {
                        count: 1,
                        resets_at: now + self.window,
                    },
                );
            }
        }
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

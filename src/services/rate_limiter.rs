use std::sync::Arc;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// Time source for the limiter. Production uses the tokio clock; tests drive a
/// manual one.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

struct Window {
    started_at: Instant,
    calls: u32,
}

/// Fixed-window rate limiter for the financial-data API.
///
/// Alpha Vantage's free tier allows 5 requests per minute. The window state sits
/// behind an async mutex that stays held while a caller waits for rollover, so
/// concurrent callers queue up behind it and never exceed `max_calls` per window.
pub struct RateLimiter {
    max_calls: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
    state: Mutex<Window>,
}

impl RateLimiter {
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use stock_screener_backend::services::rate_limiter::RateLimiter;
    ///
    /// // Alpha Vantage free tier
    /// let limiter = RateLimiter::new(5, Duration::from_secs(60));
    /// ```
    pub fn new(max_calls: u32, window: Duration) -> Self {
        Self::with_clock(max_calls, window, Arc::new(SystemClock))
    }

    pub fn with_clock(max_calls: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let started_at = clock.now();
        Self {
            max_calls: max_calls.max(1),
            window,
            clock,
            state: Mutex::new(Window { started_at, calls: 0 }),
        }
    }

    /// Wait until a call is allowed in the current window and count it.
    ///
    /// Returns how long the caller was held back.
    pub async fn acquire(&self) -> Duration {
        let mut state = self.state.lock().await;

        let now = self.clock.now();
        if now.duration_since(state.started_at) > self.window {
            state.started_at = now;
            state.calls = 0;
        }

        let mut waited = Duration::ZERO;
        if state.calls >= self.max_calls {
            let elapsed = now.duration_since(state.started_at);
            waited = self.window.saturating_sub(elapsed);
            if !waited.is_zero() {
                tracing::info!(
                    "Rate limit reached, sleeping for {:.2} seconds",
                    waited.as_secs_f64()
                );
                self.clock.sleep(waited).await;
            }
            state.started_at = self.clock.now();
            state.calls = 0;
        }

        state.calls += 1;
        waited
    }

    /// Calls still available in the current window (for monitoring).
    pub async fn remaining(&self) -> u32 {
        let state = self.state.lock().await;
        if self.clock.now().duration_since(state.started_at) > self.window {
            return self.max_calls;
        }
        self.max_calls.saturating_sub(state.calls)
    }
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use aicif_common::error::env_parse;
use tokio::sync::Mutex;

use crate::error::ProxyError;

/// Token bucket shared by every proxied request. Holds at most `rps` tokens.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    state: Arc<Mutex<State>>,
}

#[derive(Debug)]
struct State {
    tokens: f64,
    last: Instant,
}

impl RateLimiter {
    pub fn new(rps: u32) -> Self {
        Self {
            rps,
            state: Arc::new(Mutex::new(State {
                tokens: rps as f64,
                last: Instant::now(),
            })),
        }
    }

    /// `RATE_LIMIT_RPS` unset or 0 disables limiting.
    pub fn from_env() -> Result<Option<Self>, ProxyError> {
        Ok(env_parse::<u32>("RATE_LIMIT_RPS")?
            .filter(|&n| n > 0)
            .map(Self::new))
    }

    pub fn rps(&self) -> u32 {
        self.rps
    }

    pub async fn check(&self) -> Result<(), ProxyError> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let elapsed = now.duration_since(state.last);
        state.last = now;

        let capacity = self.rps as f64;
        let refill = (elapsed.as_secs_f64() * capacity).min(capacity);
        state.tokens = (state.tokens + refill).min(capacity);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            return Ok(());
        }

        Err(ProxyError::RateLimited {
            rps: self.rps,
            retry_after: Duration::from_secs_f64((1.0 - state.tokens) / capacity),
        })
    }
}

//! Fixed-window request rate limiting keyed by client IP.
//!
//! The key is the socket peer address. Forwarding headers are only consulted when
//! `TRUST_PROXY` is set.
//!
//! Counters live behind [`CounterStore`]: [`MemoryCounterStore`] for a single process,
//! [`RedisCounterStore`] when several instances must share one budget.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use dashmap::DashMap;
use fred::clients::Client as RedisClient;
use fred::interfaces::KeysInterface;

use crate::auth::extract_client_ip;
use crate::error::AppError;
use crate::state::AppState;

/// Per-key request counters that expire after a window.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Returns the count after incrementing.
    async fn incr(&self, key: &str, window_secs: u64) -> anyhow::Result<u64>;
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    count: u64,
    expires_at: u64,
}

/// In-process store. Expired slots are dropped by [`MemoryCounterStore::sweep`].
#[derive(Default)]
pub struct MemoryCounterStore {
    slots: DashMap<String, Slot>,
}

impl MemoryCounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every slot whose window has passed.
    pub fn sweep(&self) {
        let now = unix_now();
        self.slots.retain(|_, slot| slot.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn incr(&self, key: &str, window_secs: u64) -> anyhow::Result<u64> {
        let now = unix_now();
        let mut slot = self.slots.entry(key.to_string()).or_insert(Slot {
            count: 0,
            expires_at: now + window_secs,
        });
        if slot.expires_at <= now {
            slot.count = 0;
            slot.expires_at = now + window_secs;
        }
        slot.count += 1;
        Ok(slot.count)
    }
}

/// Redis-backed store shared by every instance pointing at the same server.
pub struct RedisCounterStore {
    redis: Arc<RedisClient>,
}

impl RedisCounterStore {
    pub const fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn incr(&self, key: &str, window_secs: u64) -> anyhow::Result<u64> {
        let key = format!("rate_limit:{key}");
        let count: u64 = self.redis.incr(key.clone()).await?;

        // Set expiry on first increment
        if count == 1 {
            #[allow(clippy::cast_possible_wrap)]
            self.redis
                .expire::<(), _>(key, window_secs as i64, None)
                .await?;
        }
        Ok(count)
    }
}

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u64 },
    Limited { retry_after: u64 },
}

/// Fixed-window limiter over a pluggable counter store.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    max_requests: u64,
    window_secs: u64,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, max_requests: u64, window_secs: u64) -> Self {
        Self {
            store,
            max_requests,
            window_secs: window_secs.max(1),
        }
    }

    pub fn in_memory(max_requests: u64, window_secs: u64) -> Self {
        Self::new(Arc::new(MemoryCounterStore::new()), max_requests, window_secs)
    }

    /// Count one request from `client` and decide whether it may proceed.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter store is unreachable.
    pub async fn check(&self, client: &str) -> anyhow::Result<Decision> {
        let now = unix_now();
        let window = now / self.window_secs;
        let key = format!("{client}:{window}");
        let count = self.store.incr(&key, self.window_secs).await?;

        if count > self.max_requests {
            let retry_after = (window + 1) * self.window_secs - now;
            return Ok(Decision::Limited {
                retry_after: retry_after.max(1),
            });
        }
        Ok(Decision::Allowed {
            remaining: self.max_requests - count,
        })
    }
}

/// Periodically drop expired in-memory slots.
pub fn spawn_sweeper(store: Arc<MemoryCounterStore>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            store.sweep();
            tracing::debug!(tracked = store.len(), "Swept rate limit counters");
        }
    });
}

/// Middleware applying the shared limiter. A failing store lets the request through.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client = client_key(req.headers(), peer, state.config.trust_proxy);

    match state.rate_limiter.check(&client).await {
        Ok(Decision::Limited { retry_after }) => {
            tracing::warn!(client = %client, retry_after, "Rate limit exceeded");
            AppError::TooManyRequests { retry_after }.into_response()
        }
        Ok(Decision::Allowed { .. }) => next.run(req).await,
        Err(err) => {
            tracing::warn!("Rate limit store unavailable: {err}");
            next.run(req).await
        }
    }
}

/// Forwarded address when the proxy is trusted, else the peer IP, else `"unknown"`.
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    trust_proxy
        .then(|| extract_client_ip(headers))
        .flatten()
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_up_to_the_limit() {
        let limiter = RateLimiter::in_memory(2, 60);
        assert!(matches!(
            limiter.check("1.2.3.4").await.ok(),
            Some(Decision::Allowed { remaining: 1 })
        ));
        assert!(matches!(
            limiter.check("1.2.3.4").await.ok(),
            Some(Decision::Allowed { remaining: 0 })
        ));
        assert!(matches!(
            limiter.check("1.2.3.4").await.ok(),
            Some(Decision::Limited { .. })
        ));
    }

    #[tokio::test]
    async fn clients_are_counted_separately() {
        let limiter = RateLimiter::in_memory(1, 60);
        assert!(matches!(
            limiter.check("a").await.ok(),
            Some(Decision::Allowed { .. })
        ));
        assert!(matches!(
            limiter.check("b").await.ok(),
            Some(Decision::Allowed { .. })
        ));
    }

    #[test]
    fn forwarding_headers_need_a_trusted_proxy() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            axum::http::HeaderValue::from_static("203.0.113.7"),
        );
        let peer = Some(SocketAddr::from(([10, 0, 0, 2], 51_000)));

        assert_eq!(client_key(&headers, peer, false), "10.0.0.2");
        assert_eq!(client_key(&headers, peer, true), "203.0.113.7");
        assert_eq!(client_key(&HeaderMap::new(), peer, true), "10.0.0.2");
        assert_eq!(client_key(&headers, None, false), "unknown");
    }

    #[tokio::test]
    async fn sweep_drops_expired_slots() {
        let store = MemoryCounterStore::new();
        store.slots.insert(
            "old".to_string(),
            Slot {
                count: 3,
                expires_at: 0,
            },
        );
        store.incr("fresh", 60).await.unwrap_or_default();
        store.sweep();
        assert_eq!(store.len(), 1);
    }
}

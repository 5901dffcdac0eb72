//! Per-client rate limiting
//!
//! A token bucket per client key, refilled continuously at the configured
//! rate with a burst allowance of twice that rate. Clients are keyed on the
//! socket peer address; forwarding headers are only honoured when the
//! server sits behind a trusted proxy.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Weak},
    time::{Duration, Instant},
};
use tokio::sync::RwLock;

use crate::error::ApiError;

/// How often idle buckets are swept
pub const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Buckets untouched for this long are dropped by the sweep
pub const BUCKET_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

type Buckets = RwLock<HashMap<String, TokenBucket>>;

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(max_tokens: f64) -> Self {
        Self {
            tokens: max_tokens,
            last_update: Instant::now(),
        }
    }

    fn try_consume(&mut self, tokens_per_second: f64, max_tokens: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        self.tokens = (self.tokens + elapsed * tokens_per_second).min(max_tokens);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Rate limiter state, cheap to clone
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Buckets>,
    tokens_per_second: f64,
    max_tokens: f64,
    trust_proxy_headers: bool,
}

impl RateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        let rps = f64::from(requests_per_second.max(1));
        Self {
            buckets: Arc::new(RwLock::new(HashMap::new())),
            tokens_per_second: rps,
            max_tokens: rps * 2.0,
            trust_proxy_headers: false,
        }
    }

    /// Key clients on `x-forwarded-for` / `x-real-ip` instead of the peer address
    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Check if a request from `key` is allowed, consuming a token if so
    pub async fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.write().await;

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.max_tokens));

        bucket.try_consume(self.tokens_per_second, self.max_tokens)
    }

    /// Drop buckets idle for longer than `max_age`
    pub async fn cleanup(&self, max_age: Duration) {
        sweep(&self.buckets, max_age).await;
    }

    pub async fn tracked_clients(&self) -> usize {
        self.buckets.read().await.len()
    }

    /// Sweep idle buckets every `every` on the current runtime.
    ///
    /// The task holds only a weak reference and exits once every clone of
    /// the limiter has been dropped.
    pub fn spawn_cleanup(&self, every: Duration, max_age: Duration) -> tokio::task::JoinHandle<()> {
        let buckets: Weak<Buckets> = Arc::downgrade(&self.buckets);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(buckets) = buckets.upgrade() else {
                    break;
                };
                let removed = sweep(&buckets, max_age).await;
                if removed > 0 {
                    tracing::debug!(removed, "Dropped idle rate limit buckets");
                }
            }
        })
    }

    /// Bucket key for a request
    pub fn client_key<B>(&self, request: &Request<B>) -> String {
        let forwarded = if self.trust_proxy_headers {
            client_ip(request)
        } else {
            None
        };

        forwarded
            .or_else(|| peer_ip(request))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

async fn sweep(buckets: &Buckets, max_age: Duration) -> usize {
    let mut buckets = buckets.write().await;
    let before = buckets.len();
    let now = Instant::now();

    buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < max_age);
    before - buckets.len()
}

/// Rate limiting middleware, for use with `axum::middleware::from_fn_with_state`
pub async fn rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client_key = limiter.client_key(&request);

    if !limiter.check(&client_key).await {
        tracing::warn!(client = %client_key, "Rate limit exceeded");
        let mut response = ApiError::TooManyRequests.into_response();
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
        return response;
    }

    next.run(request).await
}

/// Socket peer address, present when served with connect info
pub fn peer_ip<B>(request: &Request<B>) -> Option<String> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

/// Client IP from `x-forwarded-for` (first hop) or `x-real-ip`
pub fn client_ip<B>(request: &Request<B>) -> Option<String> {
    let headers = request.headers();

    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_burst_then_deny() {
        let limiter = RateLimiter::new(5);

        // Burst capacity is 2x the rate
        for _ in 0..10 {
            assert!(limiter.check("test-client").await);
        }
        assert!(!limiter.check("test-client").await);
    }

    #[tokio::test]
    async fn test_clients_have_separate_buckets() {
        let limiter = RateLimiter::new(1);

        assert!(limiter.check("client-a").await);
        assert!(limiter.check("client-a").await);
        assert!(!limiter.check("client-a").await);
        assert!(limiter.check("client-b").await);
    }

    fn request_from(peer: &str, forwarded_for: &str) -> Request<Body> {
        let mut request = axum::http::Request::builder()
            .uri("/")
            .header("x-forwarded-for", forwarded_for)
            .body(Body::empty())
            .unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_shares_peer_bucket() {
        use axum::{routing::get, Router};
        use tower::ServiceExt;

        let limiter = RateLimiter::new(1);
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(
                limiter.clone(),
                rate_limit,
            ));

        let mut allowed = 0;
        for i in 0..500 {
            let forwarded_for = format!("10.1.{}.{}", i / 256, i % 256);
            let request = request_from("203.0.113.7:40000", &forwarded_for);
            let response = app.clone().oneshot(request).await.unwrap();
            if response.status().is_success() {
                allowed += 1;
            } else {
                assert_eq!(response.status(), axum::http::StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "1");
            }
        }

        // Burst allowance only, one bucket for the one peer
        assert!(allowed < 10, "{} requests allowed", allowed);
        assert_eq!(limiter.tracked_clients().await, 1);
    }

    #[test]
    fn test_client_key_honours_proxy_headers_only_when_trusted() {
        let request = request_from("203.0.113.7:40000", "10.0.0.1");

        assert_eq!(RateLimiter::new(1).client_key(&request), "203.0.113.7");
        assert_eq!(
            RateLimiter::new(1).trust_proxy_headers(true).client_key(&request),
            "10.0.0.1"
        );

        let bare = axum::http::Request::builder().body(()).unwrap();
        assert_eq!(RateLimiter::new(1).client_key(&bare), "unknown");
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_cleanup_bounds_bucket_count() {
        let limiter = RateLimiter::new(5);
        let handle = limiter.spawn_cleanup(Duration::from_secs(1), Duration::ZERO);

        for i in 0..100 {
            limiter.check(&format!("client-{}", i)).await;
        }
        assert_eq!(limiter.tracked_clients().await, 100);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(limiter.tracked_clients().await, 0);

        drop(limiter);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn test_cleanup_drops_idle_buckets() {
        let limiter = RateLimiter::new(5);
        limiter.check("idle").await;
        assert_eq!(limiter.tracked_clients().await, 1);

        limiter.cleanup(Duration::ZERO).await;
        assert_eq!(limiter.tracked_clients().await, 0);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let request = axum::http::Request::builder()
            .header("x-forwarded-for", "10.0.0.1, 10.0.0.2")
            .header("x-real-ip", "10.0.0.9")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&request).as_deref(), Some("10.0.0.1"));

        let request = axum::http::Request::builder()
            .header("x-real-ip", "10.0.0.9")
            .body(())
            .unwrap();
        assert_eq!(client_ip(&request).as_deref(), Some("10.0.0.9"));
    }
}

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::response::IntoResponse;
use dashmap::DashMap;
use tower::{Layer, Service};
use tracing::warn;

const LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Headers set by the fronting proxy, most specific first.
const CLIENT_IP_HEADERS: [&str; 2] = ["Fly-Client-IP", "X-Real-IP"];

#[derive(Clone)]
pub struct RateLimiter<S> {
    inner: S,
    limits: Limits,
}

#[derive(Clone)]
struct Limits {
    buckets: Arc<DashMap<String, Bucket>>,
    dropped_since_log: Arc<AtomicU64>,
    last_log: Arc<Mutex<Instant>>,
    rate_per_sec: f64,
    burst: f64,
}

#[derive(Debug, Clone)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Per-client token bucket. Buckets are shared by every route the layer wraps.
#[derive(Clone)]
pub struct RateLimiterLayer {
    limits: Limits,
}

impl RateLimiterLayer {
    pub fn new(rate_per_sec: u32, burst: u32) -> Self {
        Self {
            limits: Limits {
                buckets: Arc::new(DashMap::new()),
                dropped_since_log: Arc::new(AtomicU64::new(0)),
                last_log: Arc::new(Mutex::new(Instant::now())),
                rate_per_sec: rate_per_sec as f64,
                burst: burst as f64,
            },
        }
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimiter {
            inner,
            limits: self.limits.clone(),
        }
    }
}

impl<S, ReqBody> Service<Request<ReqBody>> for RateLimiter<S>
where
    S: Service<Request<ReqBody>, Response = Response<Body>> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        if let Some(client) = client_id(&req)
            && !self.limits.check_and_consume(&client, Instant::now())
        {
            self.limits.dropped_since_log.fetch_add(1, Ordering::Relaxed);
            self.limits.log_drops_if_needed();
            return Box::pin(async move {
                Ok((StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response())
            });
        }

        let fut = self.inner.call(req);
        Box::pin(fut)
    }
}

fn client_id<B>(req: &Request<B>) -> Option<String> {
    CLIENT_IP_HEADERS.iter().find_map(|name| {
        req.headers()
            .get(*name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string)
    })
}

impl Limits {
    fn check_and_consume(&self, client: &str, now: Instant) -> bool {
        let mut entry = self
            .buckets
            .entry(client.to_string())
            .or_insert(Bucket {
                tokens: self.burst,
                last_refill: now,
            });
        let elapsed = now
            .saturating_duration_since(entry.last_refill)
            .as_secs_f64();
        if elapsed > 0.0 {
            entry.tokens = (entry.tokens + elapsed * self.rate_per_sec).min(self.burst);
            entry.last_refill = now;
        }
        if entry.tokens >= 1.0 {
            entry.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn log_drops_if_needed(&self) {
        let now = Instant::now();
        let Ok(mut last) = self.last_log.lock() else {
            return;
        };
        if now.saturating_duration_since(*last) >= LOG_INTERVAL {
            let dropped = self.dropped_since_log.swap(0, Ordering::Relaxed);
            if dropped > 0 {
                warn!("rate limiter dropped {dropped} requests in the last minute");
            }
            *last = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_then_refill() {
        let layer = RateLimiterLayer::new(2, 3);
        let start = Instant::now();
        for _ in 0..3 {
            assert!(layer.limits.check_and_consume("10.0.0.1", start));
        }
        assert!(!layer.limits.check_and_consume("10.0.0.1", start));
        // Other clients keep their own bucket.
        assert!(layer.limits.check_and_consume("10.0.0.2", start));
        // Half a second at 2 req/s buys one more request.
        let later = start + Duration::from_millis(500);
        assert!(layer.limits.check_and_consume("10.0.0.1", later));
        assert!(!layer.limits.check_and_consume("10.0.0.1", later));
    }

    #[test]
    fn reads_proxy_headers() {
        let req = Request::builder()
            .header("X-Real-IP", " 192.0.2.7 ")
            .body(())
            .unwrap();
        assert_eq!(client_id(&req).as_deref(), Some("192.0.2.7"));
        let req = Request::builder().body(()).unwrap();
        assert_eq!(client_id(&req), None);
    }
}

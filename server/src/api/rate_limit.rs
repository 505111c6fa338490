use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use common::dto::ErrorResponse;
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Sliding-window request counter keyed by client address
#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Records the request and returns whether it fits in the window.
    pub async fn check_request(&self, client: String) -> bool {
        let mut requests = self.requests.lock().await;
        let now = Instant::now();

        let request_times = requests.entry(client.clone()).or_default();
        request_times.retain(|&time| now.duration_since(time) < self.window);

        if request_times.len() < self.max_requests {
            request_times.push(now);
            true
        } else {
            warn!("Registration rate limit exceeded for client: {}", client);
            false
        }
    }

    pub async fn cleanup(&self) {
        let mut requests = self.requests.lock().await;
        let now = Instant::now();

        requests.retain(|_, times| {
            times.retain(|&time| now.duration_since(time) < self.window);
            !times.is_empty()
        });
    }
}

/// Proxy headers win over the peer address; a request that carries neither
/// (only possible when the router is driven without a socket) shares one bucket.
fn client_key(request: &Request) -> String {
    let headers = request.headers();
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    if let Some(ip) = forwarded.or(real_ip) {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_key(&request);

    if !limiter.check_request(client).await {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Too many requests. Please try again later.".to_string(),
            }),
        )
            .into_response();
    }

    next.run(request).await
}

/// Creates a limiter and spawns its periodic cleanup, which stops when `shutdown` is cancelled.
/// Must run inside a Tokio runtime.
pub fn rate_limit_layer(max_requests: usize, window_seconds: u64, shutdown: CancellationToken) -> RateLimiter {
    let limiter = RateLimiter::new(max_requests, Duration::from_secs(window_seconds));

    let cleanup_limiter = limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = interval.tick() => cleanup_limiter.cleanup().await,
            }
        }
        debug!("Rate limiter cleanup stopped");
    });

    limiter
}

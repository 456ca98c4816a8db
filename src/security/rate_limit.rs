//! Per-client fixed-window rate limiting.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::RateLimitRule;
use crate::http::response::http_date;
use crate::observability::metrics;

/// Retry hints are capped at one year.
const MAX_RETRY_AFTER_SECS: u64 = 365 * 24 * 60 * 60;

/// Upper bound on the housekeeping interval.
const MAX_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Outcome of a rate limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admit,
    /// Over the limit; the current window ends after `reset_after`.
    Reject { reset_after: Duration },
}

/// Request count for one client in the current window.
struct Window {
    started: Instant,
    count: u32,
}

/// One configured limit and the per-client windows it tracks.
struct FixedWindow {
    limit: u32,
    period: Duration,
    windows: DashMap<IpAddr, Window>,
}

impl FixedWindow {
    fn new(rule: &RateLimitRule) -> Self {
        Self {
            limit: rule.limit,
            period: Duration::from_secs(rule.period_secs),
            windows: DashMap::new(),
        }
    }

    fn hit(&self, ip: IpAddr, now: Instant) -> Admission {
        // The entry guard holds the shard lock, so increments are never lost.
        let mut window = self.windows.entry(ip).or_insert_with(|| Window {
            started: now,
            count: 0,
        });

        if now.saturating_duration_since(window.started) >= self.period {
            window.started = now;
            window.count = 0;
        }

        window.count = window.count.saturating_add(1);

        if window.count > self.limit {
            let reset_after = window
                .started
                .checked_add(self.period)
                .map_or(Duration::MAX, |end| end.saturating_duration_since(now));
            Admission::Reject { reset_after }
        } else {
            Admission::Admit
        }
    }

    fn purge(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, window| now.saturating_duration_since(window.started) < self.period);
        before - self.windows.len()
    }
}

/// Rate limiter keyed by client IP, with any number of stacked limits.
pub struct RateLimiter {
    rules: Vec<FixedWindow>,
}

impl RateLimiter {
    pub fn new(rules: &[RateLimitRule]) -> Self {
        Self {
            rules: rules.iter().map(FixedWindow::new).collect(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.rules.is_empty()
    }

    pub fn check(&self, ip: IpAddr) -> Admission {
        self.check_at(ip, Instant::now())
    }

    /// Count a request from `ip` at `now` against every limit, in order.
    ///
    /// The first limit that rejects decides; later limits are not charged.
    pub fn check_at(&self, ip: IpAddr, now: Instant) -> Admission {
        for rule in &self.rules {
            if let rejected @ Admission::Reject { .. } = rule.hit(ip, now) {
                return rejected;
            }
        }
        Admission::Admit
    }

    /// Drop windows that have fully elapsed. Returns how many were removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        self.rules.iter().map(|rule| rule.purge(now)).sum()
    }

    /// Shortest configured window.
    pub fn shortest_period(&self) -> Option<Duration> {
        self.rules.iter().map(|rule| rule.period).min()
    }

    /// How often elapsed windows are purged: the shortest window, at most an hour.
    pub fn purge_interval(&self) -> Option<Duration> {
        self.shortest_period()
            .map(|period| period.min(MAX_PURGE_INTERVAL))
    }
}

/// Middleware function for per-IP rate limiting.
pub async fn rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(limiter): State<Arc<RateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check(addr.ip()) {
        Admission::Admit => next.run(request).await,
        Admission::Reject { reset_after } => {
            tracing::warn!(
                client = %addr.ip(),
                reset_after_secs = reset_after.as_secs_f64(),
                "Rate limit exceeded"
            );
            metrics::record_rate_limited();
            too_many_requests(reset_after)
        }
    }
}

fn too_many_requests(reset_after: Duration) -> Response {
    // HTTP dates have one second resolution; round up so clients never retry early.
    let whole_secs = reset_after
        .as_secs()
        .saturating_add(u64::from(reset_after.subsec_nanos() > 0))
        .min(MAX_RETRY_AFTER_SECS);
    let reset_at = SystemTime::now() + Duration::from_secs(whole_secs);

    let mut response = (StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").into_response();
    if let Ok(value) = HeaderValue::from_str(&http_date(reset_at)) {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}

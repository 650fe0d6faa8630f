//! Per-client sliding-window admission control.
//!
//! Every identity owns a queue of admission timestamps. A check purges the
//! entries that fell out of the trailing window, then admits only while the
//! remaining count is below the policy maximum. Denied attempts are never
//! recorded.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::RateLimitConfig;
use crate::http::error::ApiError;
use crate::observability::metrics;
use crate::security::client_ip::resolve_identity;

/// Immutable window/quota pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window: Duration,
    pub max_requests: usize,
}

impl RateLimitPolicy {
    pub fn new(window: Duration, max_requests: usize) -> Self {
        Self { window, max_requests }
    }
}

impl From<&RateLimitConfig> for RateLimitPolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self::new(config.window(), config.max_requests as usize)
    }
}

/// Returned when an identity has used up its quota for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rate limit exceeded, retry after {}s", .retry_after.as_secs())]
pub struct AdmissionDenied {
    pub retry_after: Duration,
}

/// Admitted request timestamps for one client, oldest first.
#[derive(Debug, Default)]
struct ClientWindow {
    admitted: VecDeque<Instant>,
}

impl ClientWindow {
    /// Drop entries at least `window` old. A request exactly `window` old is expired.
    fn purge(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.admitted.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }

    fn try_admit(&mut self, now: Instant, policy: &RateLimitPolicy) -> bool {
        self.purge(now, policy.window);
        if self.admitted.len() >= policy.max_requests {
            return false;
        }
        self.admitted.push_back(now);
        true
    }

    fn last_admitted(&self) -> Option<Instant> {
        self.admitted.back().copied()
    }

    /// True when the newest admission is at least `idle_for` old.
    fn is_idle(&self, now: Instant, idle_for: Duration) -> bool {
        match self.last_admitted() {
            Some(last) => now.saturating_duration_since(last) >= idle_for,
            None => true,
        }
    }
}

/// Sliding-window rate limiter keyed by client identity.
///
/// The window map is sharded, so a check only contends with checks whose
/// identities hash to the same shard. The map is bounded: [`sweep`] evicts
/// identities that stayed empty past a grace period, and inserting a new
/// identity at capacity evicts the least recently admitted one.
///
/// [`sweep`]: AdmissionController::sweep
#[derive(Debug)]
pub struct AdmissionController {
    windows: DashMap<String, ClientWindow>,
    policy: RateLimitPolicy,
    idle_grace: Duration,
    max_tracked: usize,
}

impl AdmissionController {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self::with_limits(policy, Duration::from_secs(300), 100_000)
    }

    pub fn with_limits(policy: RateLimitPolicy, idle_grace: Duration, max_tracked: usize) -> Self {
        Self {
            windows: DashMap::new(),
            policy,
            idle_grace,
            max_tracked: max_tracked.max(1),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::with_limits(
            RateLimitPolicy::from(config),
            Duration::from_secs(config.idle_grace_secs),
            config.max_tracked_clients,
        )
    }


    /// Admit or deny a request from `identity` at the current time.
    pub fn allow(&self, identity: &str) -> bool {
        self.allow_at(identity, Instant::now())
    }

    /// Like [`allow`](Self::allow), reporting denial with a retry-after hint.
    pub fn check(&self, identity: &str) -> Result<(), AdmissionDenied> {
        if self.allow(identity) {
            Ok(())
        } else {
            Err(AdmissionDenied {
                retry_after: self.policy.window,
            })
        }
    }

    /// Admission decision at an explicit instant.
    pub fn allow_at(&self, identity: &str, now: Instant) -> bool {
        if let Some(mut window) = self.windows.get_mut(identity) {
            return window.try_admit(now, &self.policy);
        }

        if self.windows.len() >= self.max_tracked {
            self.make_room(now);
        }

        let admitted = self
            .windows
            .entry(identity.to_owned())
            .or_default()
            .try_admit(now, &self.policy);
        metrics::record_tracked_clients(self.windows.len());
        admitted
    }

    /// Number of identities currently holding a window.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    /// Timestamps still inside the window for `identity`, as of `now`.
    pub fn recorded_at(&self, identity: &str, now: Instant) -> usize {
        self.windows
            .get(identity)
            .map(|w| {
                w.admitted
                    .iter()
                    .filter(|&&t| now.saturating_duration_since(t) < self.policy.window)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Evict identities whose window has been empty for at least the grace period.
    /// Returns the number of evicted identities.
    pub fn sweep(&self, now: Instant) -> usize {
        let idle_for = self.policy.window.saturating_add(self.idle_grace);
        let evicted = self.evict_idle(now, idle_for);
        metrics::record_tracked_clients(self.windows.len());
        evicted
    }

    fn evict_idle(&self, now: Instant, idle_for: Duration) -> usize {
        let mut evicted = 0;
        self.windows.retain(|_, window| {
            let keep = !window.is_idle(now, idle_for);
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            metrics::record_clients_evicted(evicted);
        }
        evicted
    }

    /// Free at least one slot: drop fully expired windows first, then the
    /// identity with the oldest most-recent admission.
    fn make_room(&self, now: Instant) {
        if self.evict_idle(now, self.policy.window) > 0 && self.windows.len() < self.max_tracked {
            return;
        }

        let victim = self
            .windows
            .iter()
            .min_by_key(|entry| entry.value().last_admitted())
            .map(|entry| entry.key().clone());

        if let Some(identity) = victim {
            self.windows.remove(&identity);
            metrics::record_clients_evicted(1);
            tracing::debug!(client = %identity, "Evicted least recently admitted client window");
        }
        metrics::record_tracked_clients(self.windows.len());
    }

    /// Run [`sweep`](Self::sweep) every `every` until `shutdown` fires.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration, shutdown: CancellationToken) -> JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = time::interval(every);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = controller.sweep(Instant::now());
                        if evicted > 0 {
                            tracing::debug!(
                                evicted,
                                tracked = controller.tracked_clients(),
                                "Swept idle client windows"
                            );
                        }
                    }
                    _ = shutdown.cancelled() => {
                        tracing::debug!("Rate limit sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

/// State for the rate limiting middleware.
#[derive(Clone)]
pub struct RateLimitState {
    pub controller: Arc<AdmissionController>,
    pub trust_forwarded_for: bool,
}

/// Middleware rejecting requests over quota with 429 and `Retry-After`.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identity = resolve_identity(request.headers(), peer, state.trust_forwarded_for);

    match state.controller.check(&identity) {
        Ok(()) => next.run(request).await,
        Err(denied) => {
            tracing::warn!(client = %identity, path = %request.uri().path(), "Rate limit exceeded");
            metrics::record_rate_limited();
            ApiError::RateLimited(denied).into_response()
        }
    }
}

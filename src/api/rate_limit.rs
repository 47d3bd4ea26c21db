//! Per-client rate limiting

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    DefaultKeyedRateLimiter, Quota, RateLimiter,
};
use tracing::warn;

use crate::error::ApiError;

/// Allows each client IP `max_requests` per `window`.
///
/// The quota refills continuously at `window / max_requests` per request
/// with a burst of `max_requests`.
pub struct ClientRateLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    clock: DefaultClock,
}

impl ClientRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let burst = NonZeroU32::new(max_requests).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(window / burst.get())
            .unwrap_or_else(|| Quota::per_second(burst))
            .allow_burst(burst);

        Self {
            limiter: RateLimiter::keyed(quota),
            clock: DefaultClock::default(),
        }
    }

    /// Takes one request from the client's quota, or returns how long to wait.
    pub fn check(&self, client: IpAddr) -> Result<(), Duration> {
        self.limiter
            .check_key(&client)
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Forgets clients whose quota has fully refilled.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

/// Middleware rejecting clients over their quota with 429.
///
/// Clients are keyed by peer address; without connection info (e.g. in-process
/// calls) all requests share the unspecified address.
pub async fn rate_limit(
    State(limiter): State<Arc<ClientRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    match limiter.check(client) {
        Ok(()) => next.run(request).await,
        Err(wait) => {
            warn!(%client, path = %request.uri().path(), "Rate limit exceeded");
            ApiError::RateLimited {
                retry_after_secs: wait.as_secs().max(1),
            }
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT_A: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const CLIENT_B: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    #[test]
    fn test_allows_up_to_quota() {
        let limiter = ClientRateLimiter::new(3, Duration::from_secs(900));

        assert!(limiter.check(CLIENT_A).is_ok());
        assert!(limiter.check(CLIENT_A).is_ok());
        assert!(limiter.check(CLIENT_A).is_ok());

        let wait = limiter.check(CLIENT_A).unwrap_err();
        assert!(wait > Duration::ZERO);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = ClientRateLimiter::new(1, Duration::from_secs(900));

        assert!(limiter.check(CLIENT_A).is_ok());
        assert!(limiter.check(CLIENT_A).is_err());
        assert!(limiter.check(CLIENT_B).is_ok());
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_zero_max_still_admits_one() {
        let limiter = ClientRateLimiter::new(0, Duration::from_secs(60));
        assert!(limiter.check(CLIENT_A).is_ok());
    }
}

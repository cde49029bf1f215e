use governor::{
    Quota, RateLimiter as GovernorRateLimiter,
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
};
use nonzero_ext::nonzero;
use std::{num::NonZeroU32, time::Duration};

// The site starts refusing clients well before these numbers on a long
// crawl; both are overridable from the environment.
pub const DEFAULT_REQ_PER_SEC: NonZeroU32 = nonzero!(10u32);
pub const DEFAULT_MS_BETWEEN_REQ: u64 = 50;

type SpecificGovernorRateLimiter =
    GovernorRateLimiter<NotKeyed, InMemoryState, QuantaClock, NoOpMiddleware<QuantaInstant>>;

pub struct RateLimiter {
    req_per_sec: SpecificGovernorRateLimiter,
    // None when no minimum gap is configured.
    ms_between_req: Option<SpecificGovernorRateLimiter>,
}

impl RateLimiter {
    pub fn new(req_per_sec: NonZeroU32, between_req: Duration) -> Self {
        // Limit to X total req/sec on average.
        let req_per_sec = GovernorRateLimiter::direct(Quota::per_second(req_per_sec));

        // No two requests closer than Y ms.
        let ms_between_req = Quota::with_period(between_req).map(GovernorRateLimiter::direct);

        RateLimiter {
            req_per_sec,
            ms_between_req,
        }
    }

    pub async fn wait_until_ready(&self) {
        // The per-second quota goes first so a burst of callers that already
        // cleared the gap check cannot all cross it at once.
        self.req_per_sec.until_ready().await;
        if let Some(ms_between_req) = &self.ms_between_req {
            ms_between_req.until_ready().await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(
            DEFAULT_REQ_PER_SEC,
            Duration::from_millis(DEFAULT_MS_BETWEEN_REQ),
        )
    }
}

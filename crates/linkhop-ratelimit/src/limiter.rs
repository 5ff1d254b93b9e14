use crate::store::{window_millis, WindowStore};
use jiff::Timestamp;
use linkhop_core::{Clock, SystemClock};
use rand::Rng;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

/// Namespace for window keys, distinct from cached links.
pub const KEY_PREFIX: &str = "lh:rl:";

/// The class of endpoint a request is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    Redirect,
    Create,
}

impl EndpointClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Redirect => "redirect",
            EndpointClass::Create => "create",
        }
    }
}

impl Display for EndpointClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many requests a single identity may make per window.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct RateLimitPolicy {
    #[builder(default = 100)]
    pub limit: u64,
    #[builder(default = Duration::from_secs(3600))]
    pub window: Duration,
}

/// Remaining budget for an identity, surfaced as response headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quota {
    pub limit: u64,
    pub remaining: u64,
    /// When the oldest live token leaves the window.
    pub reset_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// The request may proceed. The quota is `None` when the limiter failed
    /// open and has no window data.
    Allowed(Option<Quota>),
    Denied { retry_after: Duration, quota: Quota },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed(_))
    }

    pub fn quota(&self) -> Option<&Quota> {
        match self {
            Admission::Allowed(quota) => quota.as_ref(),
            Admission::Denied { quota, .. } => Some(quota),
        }
    }
}

/// Sliding-window rate limiter over a [`WindowStore`].
///
/// Any store error or timeout admits the request and logs a warning.
pub struct RateLimiter<S> {
    store: S,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

impl<S: WindowStore> RateLimiter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            timeout: Duration::from_millis(200),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Deadline for one store call before failing open.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Charges one request by `identity` against `class` under `policy`.
    pub async fn admit(
        &self,
        identity: &str,
        class: EndpointClass,
        policy: &RateLimitPolicy,
    ) -> Admission {
        let now_ms = self.clock.now().as_millisecond();
        let key = format!("{KEY_PREFIX}{class}:{identity}");
        // equal timestamps must still be distinct set members
        let member = format!("{now_ms}-{:08x}", rand::thread_rng().gen::<u32>());

        let call = self
            .store
            .record(&key, now_ms, policy.window, policy.limit, &member);
        let outcome = match timeout(self.timeout, call).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(%class, identity, error = %e, "rate limiter store failed, failing open");
                return Admission::Allowed(None);
            }
            Err(_) => {
                warn!(%class, identity, "rate limiter store timed out, failing open");
                return Admission::Allowed(None);
            }
        };

        let reset_ms = outcome
            .oldest_ms
            .unwrap_or(now_ms)
            .saturating_add(window_millis(policy.window));
        let quota = Quota {
            limit: policy.limit,
            remaining: policy.limit.saturating_sub(outcome.count),
            reset_at: Timestamp::from_millisecond(reset_ms).unwrap_or(Timestamp::MAX),
        };

        if outcome.admitted {
            Admission::Allowed(Some(quota))
        } else {
            debug!(%class, identity, count = outcome.count, "rate limit exceeded");
            Admission::Denied {
                retry_after: policy.window,
                quota,
            }
        }
    }
}

impl<S> std::fmt::Debug for RateLimiter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

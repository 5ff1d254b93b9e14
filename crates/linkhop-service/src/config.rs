use linkhop_cache::HierarchyConfig;
use linkhop_ratelimit::RateLimitPolicy;
use std::time::Duration;
use typed_builder::TypedBuilder;

/// Tunables for [`ResolutionService`](crate::ResolutionService).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ServiceConfig {
    /// Length of generated codes before any collision growth.
    #[builder(default = 6)]
    pub code_length: usize,
    /// Hard cap on collision growth. `None` grows until the longest valid code.
    #[builder(default)]
    pub max_code_length: Option<usize>,
    /// Cache lifetime for a link.
    #[builder(default = Duration::from_secs(3600))]
    pub link_ttl: Duration,
    #[builder(default = 100)]
    pub local_capacity: usize,
    #[builder(default = RateLimitPolicy::builder().limit(100).window(Duration::from_secs(3600)).build())]
    pub create_policy: RateLimitPolicy,
    #[builder(default = RateLimitPolicy::builder().limit(1000).window(Duration::from_secs(60)).build())]
    pub redirect_policy: RateLimitPolicy,
    #[builder(default = Duration::from_millis(200))]
    pub distributed_timeout: Duration,
    #[builder(default = Duration::from_secs(2))]
    pub store_timeout: Duration,
    #[builder(default = Duration::from_millis(200))]
    pub rate_limit_timeout: Duration,
}

impl ServiceConfig {
    pub fn hierarchy(&self) -> HierarchyConfig {
        HierarchyConfig::builder()
            .local_capacity(self.local_capacity)
            .link_ttl(self.link_ttl)
            .distributed_timeout(self.distributed_timeout)
            .store_timeout(self.store_timeout)
            .build()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

use crate::click::{ClickEvent, ClickSink, NoopClickSink};
use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::resolver::{ClientContext, CreateLink, Created, LinkResolver, Resolution};
use async_trait::async_trait;
use jiff::Timestamp;
use linkhop_cache::{CacheHierarchy, LocalCacheStats, TierHealth};
use linkhop_core::repository::Result as StoreResult;
use linkhop_core::{Clock, LinkCache, LinkRecord, Repository, ShortCode, StorageError, SystemClock};
use linkhop_generator::{Generator, UniqueCodeGenerator};
use linkhop_ratelimit::{
    Admission, EndpointClass, Quota, RateLimitPolicy, RateLimiter, WindowStore,
};
use std::future::Future;
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Inserts retried when a freshly generated code loses a race with a
/// concurrent insert.
const INSERT_ATTEMPTS: usize = 3;

/// Orchestrates rate limiting, the cache hierarchy and code generation
/// around a durable store.
///
/// # Type Parameters
///
/// * `R` - The durable store
/// * `D` - The distributed cache tier
/// * `W` - The rate-limit window store
/// * `G` - The candidate code generator
pub struct ResolutionService<R, D, W, G> {
    store: Arc<R>,
    cache: CacheHierarchy<D, Arc<R>>,
    limiter: RateLimiter<W>,
    codes: UniqueCodeGenerator<G, Arc<R>>,
    clicks: Arc<dyn ClickSink>,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl<R, D, W, G> ResolutionService<R, D, W, G>
where
    R: Repository,
    D: LinkCache,
    W: WindowStore,
    G: Generator,
{
    pub fn new(
        store: R,
        distributed: D,
        window_store: W,
        generator: G,
        config: ServiceConfig,
    ) -> Self {
        Self::with_clock(
            store,
            distributed,
            window_store,
            generator,
            config,
            Arc::new(SystemClock),
        )
    }

    /// Creates a service whose expiry checks and rate windows follow `clock`.
    pub fn with_clock(
        store: R,
        distributed: D,
        window_store: W,
        generator: G,
        config: ServiceConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = Arc::new(store);
        let cache = CacheHierarchy::with_clock(
            distributed,
            Arc::clone(&store),
            config.hierarchy(),
            Arc::clone(&clock),
        );
        let limiter = RateLimiter::new(window_store)
            .with_clock(Arc::clone(&clock))
            .with_timeout(config.rate_limit_timeout);
        let codes = UniqueCodeGenerator::new(generator, Arc::clone(&store))
            .with_max_length(config.max_code_length)
            .with_check_timeout(config.store_timeout);

        Self {
            store,
            cache,
            limiter,
            codes,
            clicks: Arc::new(NoopClickSink),
            clock,
            config,
        }
    }

    /// Routes click events of successful resolutions to `sink`.
    pub fn with_click_sink(mut self, sink: Arc<dyn ClickSink>) -> Self {
        self.clicks = sink;
        self
    }

    async fn admit(
        &self,
        client: &ClientContext,
        class: EndpointClass,
        policy: &RateLimitPolicy,
    ) -> Result<Option<Quota>> {
        match self.limiter.admit(&client.identity, class, policy).await {
            Admission::Allowed(quota) => Ok(quota),
            Admission::Denied { retry_after, quota } => {
                Err(ServiceError::RateLimited { retry_after, quota })
            }
        }
    }

    /// Runs a store call under the configured deadline.
    async fn bounded<T>(
        &self,
        operation: &str,
        call: impl Future<Output = StoreResult<T>>,
    ) -> StoreResult<T> {
        match timeout(self.config.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(format!(
                "{operation} exceeded {:?}",
                self.config.store_timeout
            ))),
        }
    }

    async fn insert_alias(
        &self,
        alias: String,
        target: String,
        now: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Result<LinkRecord> {
        let code = ShortCode::alias(alias).map_err(|e| ServiceError::Validation(e.to_string()))?;

        if self.bounded("alias lookup", self.store.exists(&code)).await? {
            return Err(ServiceError::AliasTaken(code.to_string()));
        }

        let record = LinkRecord::new(code, target, now, expires_at);
        match self.bounded("insert", self.store.insert(record.clone())).await {
            Ok(()) => Ok(record),
            // lost a race with a concurrent create
            Err(StorageError::Conflict(code)) => Err(ServiceError::AliasTaken(code)),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert_generated(
        &self,
        target: String,
        now: Timestamp,
        expires_at: Option<Timestamp>,
    ) -> Result<LinkRecord> {
        for attempt in 1..=INSERT_ATTEMPTS {
            let code = self.codes.generate(self.config.code_length).await?;
            let record = LinkRecord::new(code, target.clone(), now, expires_at);

            match self.bounded("insert", self.store.insert(record.clone())).await {
                Ok(()) => return Ok(record),
                Err(StorageError::Conflict(code)) => {
                    debug!(code = %code, attempt, "generated code was taken concurrently, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(attempts = INSERT_ATTEMPTS, "could not insert a generated code");
        Err(ServiceError::Unavailable(format!(
            "no generated code could be inserted after {INSERT_ATTEMPTS} attempts"
        )))
    }

    fn lookup_code(code: &str) -> Result<ShortCode> {
        ShortCode::new(code).map_err(|_| ServiceError::NotFound(code.to_string()))
    }
}

/// Accepts absolute `http`/`https` URLs with a host.
fn validate_target(target: &str) -> Result<String> {
    let target = target.trim();
    if target.is_empty() {
        return Err(ServiceError::Validation(
            "target URL cannot be empty".to_string(),
        ));
    }

    let parsed = Url::parse(target).map_err(|e| {
        ServiceError::Validation(format!("target is not a valid absolute URL: {e}"))
    })?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ServiceError::Validation(format!(
                "target URL scheme must be http or https, got {other}"
            )))
        }
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(ServiceError::Validation(
            "target URL must have a host".to_string(),
        ));
    }

    Ok(target.to_string())
}

#[async_trait]
impl<R, D, W, G> LinkResolver for ResolutionService<R, D, W, G>
where
    R: Repository,
    D: LinkCache,
    W: WindowStore,
    G: Generator,
{
    #[instrument(skip(self, client), fields(client = %client.identity))]
    async fn resolve(&self, code: &str, client: &ClientContext) -> Result<Resolution> {
        let quota = self
            .admit(client, EndpointClass::Redirect, &self.config.redirect_policy)
            .await?;

        let code = Self::lookup_code(code)?;
        let entry = self
            .cache
            .get(&code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(code.to_string()))?;

        self.clicks.record(ClickEvent {
            code: code.clone(),
            at: self.clock.now(),
            client: client.identity.clone(),
            user_agent: client.user_agent.clone(),
            referer: client.referer.clone(),
        });

        debug!(code = %code, target = %entry.target, "resolved");
        Ok(Resolution {
            target: entry.target,
            quota,
        })
    }

    #[instrument(
        skip(self, request, client),
        fields(client = %client.identity, alias = ?request.alias)
    )]
    async fn create(&self, request: CreateLink, client: &ClientContext) -> Result<Created> {
        let quota = self
            .admit(client, EndpointClass::Create, &self.config.create_policy)
            .await?;

        let target = validate_target(&request.target)?;
        let now = self.clock.now();
        if request.expires_at.is_some_and(|expires_at| expires_at <= now) {
            return Err(ServiceError::Validation(
                "expiresAt must be in the future".to_string(),
            ));
        }

        let record = match request.alias {
            Some(alias) => {
                self.insert_alias(alias, target, now, request.expires_at)
                    .await?
            }
            None => self.insert_generated(target, now, request.expires_at).await?,
        };

        self.cache
            .put(&record.code, &record.projection(), self.config.link_ttl)
            .await;

        info!(code = %record.code, "created link");
        Ok(Created { record, quota })
    }

    #[instrument(skip(self))]
    async fn deactivate(&self, code: &str) -> Result<()> {
        let code = Self::lookup_code(code)?;

        let found = self
            .bounded("deactivate", self.store.set_active(&code, false))
            .await?;
        if !found {
            return Err(ServiceError::NotFound(code.to_string()));
        }

        self.cache.invalidate(&code).await;
        info!(code = %code, "deactivated link");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_expiry(&self, code: &str, expires_at: Option<Timestamp>) -> Result<LinkRecord> {
        let code = Self::lookup_code(code)?;

        let record = self
            .bounded("set expiry", self.store.set_expiry(&code, expires_at))
            .await?
            .ok_or_else(|| ServiceError::NotFound(code.to_string()))?;

        self.cache.invalidate(&code).await;
        info!(code = %code, expires_at = ?expires_at, "updated link expiry");
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn lookup(&self, code: &str) -> Result<LinkRecord> {
        let code = Self::lookup_code(code)?;

        self.bounded("lookup", self.store.get(&code))
            .await?
            .ok_or_else(|| ServiceError::NotFound(code.to_string()))
    }

    async fn invalidate(&self, code: &str) {
        if let Ok(code) = ShortCode::new(code) {
            self.cache.invalidate(&code).await;
        }
    }

    fn cache_stats(&self) -> LocalCacheStats {
        self.cache.local_stats()
    }

    async fn health(&self) -> TierHealth {
        self.cache.health().await
    }
}

impl<R, D, W, G> std::fmt::Debug for ResolutionService<R, D, W, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionService")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

use clap::{Parser, ValueEnum};
use linkhop_ratelimit::RateLimitPolicy;
use linkhop_service::ServiceConfig;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "LINKHOP_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "LINKHOP_PUBLIC_BASE_URL";
pub const TRUST_FORWARDED_FOR_ENV: &str = "LINKHOP_TRUST_FORWARDED_FOR";
pub const STORAGE_BACKEND_ENV: &str = "LINKHOP_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "LINKHOP_MYSQL_DSN";
pub const MYSQL_ENSURE_SCHEMA_ENV: &str = "LINKHOP_MYSQL_ENSURE_SCHEMA";
pub const CACHE_BACKEND_ENV: &str = "LINKHOP_CACHE_BACKEND";
pub const REDIS_URL_ENV: &str = "LINKHOP_REDIS_URL";
pub const SHARED_CACHE_CAPACITY_ENV: &str = "LINKHOP_SHARED_CACHE_CAPACITY";
pub const LOCAL_CACHE_CAPACITY_ENV: &str = "LINKHOP_LOCAL_CACHE_CAPACITY";
pub const LINK_TTL_SECS_ENV: &str = "LINKHOP_LINK_TTL_SECS";
pub const CODE_LENGTH_ENV: &str = "LINKHOP_CODE_LENGTH";
pub const MAX_CODE_LENGTH_ENV: &str = "LINKHOP_MAX_CODE_LENGTH";
pub const CREATE_LIMIT_ENV: &str = "LINKHOP_CREATE_LIMIT";
pub const CREATE_WINDOW_SECS_ENV: &str = "LINKHOP_CREATE_WINDOW_SECS";
pub const REDIRECT_LIMIT_ENV: &str = "LINKHOP_REDIRECT_LIMIT";
pub const REDIRECT_WINDOW_SECS_ENV: &str = "LINKHOP_REDIRECT_WINDOW_SECS";
pub const DISTRIBUTED_TIMEOUT_MS_ENV: &str = "LINKHOP_DISTRIBUTED_TIMEOUT_MS";
pub const STORE_TIMEOUT_MS_ENV: &str = "LINKHOP_STORE_TIMEOUT_MS";
pub const RATE_LIMIT_TIMEOUT_MS_ENV: &str = "LINKHOP_RATE_LIMIT_TIMEOUT_MS";
pub const CLICK_BUFFER_ENV: &str = "LINKHOP_CLICK_BUFFER";
pub const WINDOW_SWEEP_SECS_ENV: &str = "LINKHOP_WINDOW_SWEEP_SECS";
pub const LOG_FORMAT_ENV: &str = "LINKHOP_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

/// Backend of the shared cache tier. Rate-limit windows live there too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackendArg {
    #[value(name = "memory")]
    Memory,
    #[value(name = "redis")]
    Redis,
}

impl Display for CacheBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackendArg::Memory => write!(f, "memory"),
            CacheBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "pretty")]
    Pretty,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatArg::Pretty => write!(f, "pretty"),
            LogFormatArg::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "linkhop")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix of the `shortURL` returned on creation.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    #[arg(long, env = TRUST_FORWARDED_FOR_ENV)]
    pub trust_forwarded_for: bool,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    /// Create the links table on startup if it is missing.
    #[arg(long, env = MYSQL_ENSURE_SCHEMA_ENV)]
    pub mysql_ensure_schema: bool,

    #[arg(
        long,
        env = CACHE_BACKEND_ENV,
        value_enum,
        default_value_t = CacheBackendArg::Memory
    )]
    pub cache: CacheBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("cache", "redis"))]
    pub redis_url: Option<String>,

    /// Entry bound of the in-process shared tier when `--cache memory`.
    #[arg(long, env = SHARED_CACHE_CAPACITY_ENV, default_value_t = 10_000)]
    pub shared_cache_capacity: u64,

    #[arg(long, env = LOCAL_CACHE_CAPACITY_ENV, default_value_t = 100)]
    pub local_cache_capacity: usize,

    #[arg(long, env = LINK_TTL_SECS_ENV, default_value_t = 3600)]
    pub link_ttl_secs: u64,

    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = 6)]
    pub code_length: usize,

    #[arg(long, env = MAX_CODE_LENGTH_ENV)]
    pub max_code_length: Option<usize>,

    #[arg(long, env = CREATE_LIMIT_ENV, default_value_t = 100)]
    pub create_limit: u64,

    #[arg(long, env = CREATE_WINDOW_SECS_ENV, default_value_t = 3600)]
    pub create_window_secs: u64,

    #[arg(long, env = REDIRECT_LIMIT_ENV, default_value_t = 1000)]
    pub redirect_limit: u64,

    #[arg(long, env = REDIRECT_WINDOW_SECS_ENV, default_value_t = 60)]
    pub redirect_window_secs: u64,

    #[arg(long, env = DISTRIBUTED_TIMEOUT_MS_ENV, default_value_t = 200)]
    pub distributed_timeout_ms: u64,

    #[arg(long, env = STORE_TIMEOUT_MS_ENV, default_value_t = 2000)]
    pub store_timeout_ms: u64,

    #[arg(long, env = RATE_LIMIT_TIMEOUT_MS_ENV, default_value_t = 200)]
    pub rate_limit_timeout_ms: u64,

    /// Click events buffered before new ones are dropped.
    #[arg(long, env = CLICK_BUFFER_ENV, default_value_t = 1024)]
    pub click_buffer: usize,

    /// How often idle in-process rate-limit windows are reclaimed.
    #[arg(long, env = WINDOW_SWEEP_SECS_ENV, default_value_t = 60)]
    pub window_sweep_secs: u64,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    pub log_format: LogFormatArg,
}

impl CLI {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig::builder()
            .code_length(self.code_length)
            .max_code_length(self.max_code_length)
            .link_ttl(Duration::from_secs(self.link_ttl_secs))
            .local_capacity(self.local_cache_capacity)
            .create_policy(
                RateLimitPolicy::builder()
                    .limit(self.create_limit)
                    .window(Duration::from_secs(self.create_window_secs))
                    .build(),
            )
            .redirect_policy(
                RateLimitPolicy::builder()
                    .limit(self.redirect_limit)
                    .window(Duration::from_secs(self.redirect_window_secs))
                    .build(),
            )
            .distributed_timeout(Duration::from_millis(self.distributed_timeout_ms))
            .store_timeout(Duration::from_millis(self.store_timeout_ms))
            .rate_limit_timeout(Duration::from_millis(self.rate_limit_timeout_ms))
            .build()
    }
}

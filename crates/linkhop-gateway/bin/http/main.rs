mod cli;
mod telemetry;

use crate::cli::{CacheBackendArg, StorageBackendArg, CLI};
use anyhow::Context;
use clap::Parser;
use jiff::Timestamp;
use linkhop_cache::{MokaLinkCache, RedisLinkCache};
use linkhop_gateway::{App, AppState};
use linkhop_generator::TimestampGenerator;
use linkhop_ratelimit::{MemoryWindowStore, RedisWindowStore};
use linkhop_service::{drain_clicks, ChannelClickSink, ClickSink, LinkResolver, ResolutionService};
use linkhop_storage::{InMemoryRepository, MySqlRepository, Repository};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::try_parse()?;
    telemetry::init(config.log_format)?;

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        cache_backend = %config.cache,
        public_base_url = %config.public_base_url,
        "starting linkhop gateway"
    );

    let (sink, clicks) = ChannelClickSink::new(config.click_buffer);
    tokio::spawn(drain_clicks(clicks));
    let sink: Arc<dyn ClickSink> = Arc::new(sink);

    let resolver = match config.storage {
        StorageBackendArg::InMemory => {
            build_resolver(InMemoryRepository::new(), &config, sink).await?
        }
        StorageBackendArg::Mysql => {
            let mysql_dsn = config
                .mysql_dsn
                .as_deref()
                .context("mysql dsn is required when storage backend is mysql")?;
            let repository = MySqlRepository::connect(mysql_dsn).await?;
            if config.mysql_ensure_schema {
                repository.ensure_schema().await?;
            }
            build_resolver(repository, &config, sink).await?
        }
    };

    let state = AppState::new(resolver, config.public_base_url.clone())
        .with_trusted_proxy(config.trust_forwarded_for);
    run_server(config.listen_addr, state).await
}

async fn build_resolver<R: Repository>(
    repository: R,
    config: &CLI,
    sink: Arc<dyn ClickSink>,
) -> anyhow::Result<Arc<dyn LinkResolver>> {
    let service_config = config.service_config();
    let generator = TimestampGenerator::new();

    let resolver: Arc<dyn LinkResolver> = match config.cache {
        CacheBackendArg::Memory => {
            let windows = Arc::new(MemoryWindowStore::new());
            spawn_window_sweeper(
                Arc::clone(&windows),
                Duration::from_secs(config.window_sweep_secs.max(1)),
            );
            let service = ResolutionService::new(
                repository,
                MokaLinkCache::with_capacity(config.shared_cache_capacity),
                windows,
                generator,
                service_config,
            );
            Arc::new(service.with_click_sink(sink))
        }
        CacheBackendArg::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .context("redis url is required when cache backend is redis")?;
            let conn = redis::Client::open(redis_url)?
                .get_multiplexed_async_connection()
                .await?;
            let service = ResolutionService::new(
                repository,
                RedisLinkCache::new(conn.clone()),
                RedisWindowStore::new(conn),
                generator,
                service_config,
            );
            Arc::new(service.with_click_sink(sink))
        }
    };
    Ok(resolver)
}

fn spawn_window_sweeper(windows: Arc<MemoryWindowStore>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            windows.sweep(Timestamp::now().as_millisecond());
        }
    });
}

async fn run_server(listen_addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("failed to bind {listen_addr}"))?;
    info!(listen_addr = %listener.local_addr()?, "linkhop gateway listening");

    axum::serve(
        listener,
        App::router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("linkhop gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

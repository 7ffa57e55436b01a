use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use incident_backend::{
    AppState,
    cache::{IncidentCacheOperations, RedisWebhookQueue},
    config::Config,
    database::{LocationCheckRepository, PgIncidentRepository, init_schema},
    middleware::{RateLimiter, rate_limit},
    router::create_router,
    services::{AdminService, LocationService, SnapshotRefresher, StatsService},
    workers::{
        LocationChecker, ReqwestTransport, RetryPolicy, SnapshotRefreshTask, TaskRegistry,
        WebhookSender,
    },
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'incident_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");
    init_schema(&pool)
        .await
        .expect("Failed to initialise database schema");

    // 设置 Redis 客户端
    let redis_client = Arc::new(
        redis::Client::open(config.redis_url.clone()).expect("Failed to create Redis client"),
    );

    let incidents = Arc::new(PgIncidentRepository::new(pool.clone()));
    let checks = Arc::new(LocationCheckRepository::new(pool.clone()));
    let cache = Arc::new(IncidentCacheOperations::new(redis_client.clone()));
    let queue = Arc::new(RedisWebhookQueue::new(redis_client.clone()));

    // 启动前先写一次快照，失败交给定时刷新
    let refresher = Arc::new(SnapshotRefresher::new(
        incidents.clone(),
        cache.clone(),
        config.cache_ttl(),
    ));
    match refresher.refresh().await {
        Ok(active) => tracing::info!(active, "Initial incident snapshot loaded"),
        Err(e) => tracing::warn!(error = %e, "Initial incident snapshot failed"),
    }

    // 后台任务
    let token = CancellationToken::new();
    let mut registry = TaskRegistry::new(token.clone());

    if config.webhook_disabled || config.webhook_url.is_empty() {
        tracing::warn!("Webhook sender disabled, notifications will accumulate in the queue");
    } else {
        let transport = ReqwestTransport::new(config.webhook_timeout())
            .expect("Failed to build webhook HTTP client");
        let policy = RetryPolicy {
            max_attempts: config.webhook_max_attempts.max(1),
            ..RetryPolicy::default()
        };
        let sender = WebhookSender::new(queue.clone(), Arc::new(transport), &config.webhook_url)
            .with_policy(policy);
        registry.spawn("webhook-sender", sender.run(token.clone()));
    }

    let (checker, checker_handle) = LocationChecker::new(
        cache.clone(),
        config.worker_pool_size,
        config.worker_queue_capacity,
        token.clone(),
    );
    checker.spawn(&mut registry);

    registry.spawn(
        "snapshot-refresh",
        SnapshotRefreshTask::new(refresher.clone(), config.refresh_interval()).run(token.clone()),
    );

    // 设置应用状态
    let state = AppState {
        config: config.clone(),
        location: Arc::new(LocationService::new(cache.clone(), checks.clone(), queue)),
        admin: Arc::new(AdminService::new(incidents, refresher)),
        stats: Arc::new(StatsService::new(checks)),
        checker: checker_handle,
    };

    // 设置限流器
    let rate_limiter = Arc::new(RateLimiter::new(redis_client, config.clone()));
    let router = create_router(state).layer(axum::middleware::from_fn_with_state(
        rate_limiter,
        rate_limit,
    ));

    // 根据编译模式决定是否添加CORS
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(token))
    .await
    .expect("Failed to start server");

    // 先停后台任务，再释放连接
    registry.shutdown().await;
    pool.close().await;
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => {},
    }

    tracing::info!("Shutdown signal received");
    token.cancel();
}

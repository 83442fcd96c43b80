use std::sync::Arc;
use std::time::Duration;

use session_service::config::Config;
use session_service::domain::access::cache::AccessCache;
use session_service::domain::access::service::AccessService;
use session_service::domain::auth::service::AuthService;
use session_service::domain::cache::Cache;
use session_service::domain::clock::Clock;
use session_service::domain::clock::SystemClock;
use session_service::domain::mail::ports::Mailer;
use session_service::domain::token::reaper::TokenReaper;
use session_service::domain::token::store::TokenStore;
use session_service::inbound::http::router::create_router;
use session_service::outbound::cache::NullCache;
use session_service::outbound::cache::RedisCache;
use session_service::outbound::mailer::LogMailer;
use session_service::outbound::mailer::SmtpMailer;
use session_service::outbound::repositories::PostgresAccessRepository;
use session_service::outbound::repositories::PostgresTokenRepository;
use session_service::outbound::repositories::PostgresUserRepository;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "session-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        environment = %config.server.environment,
        http_port = config.server.http_port,
        cache_enabled = config.cache.url.is_some(),
        mail_enabled = config.mail.enabled,
        reaper_period_secs = config.reaper.period_secs,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let cache = connect_cache(&config).await;
    let mailer: Arc<dyn Mailer> = if config.mail.enabled {
        Arc::new(SmtpMailer::new(&config.mail)?)
    } else {
        tracing::warn!("Mail delivery disabled, outgoing mail is only logged");
        Arc::new(LogMailer)
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let token_repository = Arc::new(PostgresTokenRepository::new(pg_pool.clone()));
    let access_repository = Arc::new(PostgresAccessRepository::new(pg_pool));

    let token_store = Arc::new(TokenStore::new(token_repository, clock));
    let access_service = Arc::new(AccessService::new(
        access_repository,
        AccessCache::new(cache, config.cache.ttl()),
    ));

    let background = TaskTracker::new();
    let auth_service = Arc::new(AuthService::new(
        user_repository,
        Arc::clone(&token_store),
        access_service,
        mailer,
        config.tokens.ttls(),
        background.clone(),
    ));

    let shutdown = CancellationToken::new();
    let reaper = TokenReaper::new(Arc::clone(&token_store), config.reaper.period());
    let reaper_handle = tokio::spawn(reaper.run(shutdown.clone()));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(
        auth_service,
        config.server.environment.clone(),
        Duration::from_secs(config.server.request_timeout_secs),
    );

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("Http server stopped");

    shutdown.cancel();
    if let Err(e) = reaper_handle.await {
        tracing::error!(error = %e, "Token reaper task failed");
    }

    background.close();
    tracing::info!(pending = background.len(), "Waiting for background tasks");
    background.wait().await;

    tracing::info!("Service stopped");
    Ok(())
}

async fn connect_cache(config: &Config) -> Arc<dyn Cache> {
    let Some(url) = config.cache.url.as_deref() else {
        tracing::warn!("No cache configured, roles and permissions are read from the database");
        return Arc::new(NullCache);
    };

    match RedisCache::connect(url, config.cache.operation_timeout()).await {
        Ok(cache) => {
            tracing::info!(cache = "redis", "Cache connected");
            Arc::new(cache)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Cache unavailable, continuing without it");
            Arc::new(NullCache)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}

use std::sync::Arc;
use std::time::Duration;

use account_service::config::Config;
use account_service::domain::auth::service::AuthService;
use account_service::domain::user::service::UserService;
use account_service::inbound::http::router::create_router;
use account_service::inbound::http::router::RouterConfig;
use account_service::outbound::email::HttpEmailSender;
use account_service::outbound::repositories::PostgresCredentialRepository;
use account_service::outbound::repositories::PostgresSessionRepository;
use account_service::outbound::repositories::PostgresUserRepository;
use account_service::outbound::repositories::PostgresVerificationRepository;
use auth::JwtHandler;
use auth::SessionCookie;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "account_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "account-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;
    let app_url = Url::parse(&config.auth.app_url)?;

    tracing::info!(
        base_url = %config.app.base_url,
        app_url = %app_url,
        environment = %config.app.environment,
        http_port = config.server.http_port,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = config.database.max_connections,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let user_repository = Arc::new(PostgresUserRepository::new(pg_pool.clone()));
    let session_repository = Arc::new(PostgresSessionRepository::new(pg_pool.clone()));
    let credential_repository = Arc::new(PostgresCredentialRepository::new(pg_pool.clone()));
    let verification_repository = Arc::new(PostgresVerificationRepository::new(pg_pool.clone()));
    let email_sender = Arc::new(HttpEmailSender::new(&config.email)?);

    let public_url = config.app.base_url.trim_end_matches('/').to_string();
    let settings = config.auth_settings();
    let session_cookie = SessionCookie::new(
        &config.auth.cookie_prefix,
        config.secure_cookies(),
        settings.session_expires_in.num_seconds(),
    );

    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&user_repository),
        session_repository,
        credential_repository,
        verification_repository,
        email_sender,
        JwtHandler::new(config.auth.secret.as_bytes(), public_url.clone()),
        settings,
    ));
    let user_service = Arc::new(UserService::new(user_repository));

    let purge_service = Arc::clone(&auth_service);
    let purge_interval = Duration::from_secs(config.auth.cleanup_interval_seconds.max(1));
    let purge_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = purge_service.purge_expired().await {
                tracing::error!(error = %e, "Failed to purge expired records");
            }
        }
    });
    tracing::info!(
        interval_secs = purge_interval.as_secs(),
        "Expired record purge scheduled"
    );

    let http_application = create_router(
        user_service,
        auth_service,
        RouterConfig {
            public_url,
            app_url,
            session_cookie,
            extra_origins: config.cors.allowed_origins.clone(),
            production: config.app.is_production(),
        },
    );

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    axum::serve(http_listener, http_application)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    purge_task.abort();
    pg_pool.close().await;
    tracing::info!("Server exited successfully");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

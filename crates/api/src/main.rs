use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atrium_api::background::session_cleanup;
use atrium_api::config::{LogFormat, ServerConfig};
use atrium_api::notifications::NotificationRouter;
use atrium_api::policy::PermissionGate;
use atrium_api::rate_limit::LoginRateLimiter;
use atrium_api::router::build_app_router;
use atrium_api::state::AppState;
use atrium_api::{bootstrap, ws};
use atrium_events::{EventBus, EventRelay};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "atrium_api=debug,atrium_events=debug,tower_http=debug".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = atrium_db::create_pool(&database_url, config.db_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!(max_connections = config.db_max_connections, "Database connection pool created");

    atrium_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    atrium_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Bootstrap admin ---
    match &config.bootstrap_admin {
        Some(admin) => {
            let created = bootstrap::ensure_super_admin(&pool, admin)
                .await
                .unwrap_or_else(|e| panic!("Bootstrap admin failed: {e}"));
            if created {
                tracing::info!(email = %admin.email, "Bootstrap super admin created");
            }
        }
        None => tracing::debug!("No bootstrap admin configured"),
    }

    let cancel = CancellationToken::new();

    // --- WebSocket manager ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), cancel.clone());

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let relay = EventRelay::new(pool.clone(), Arc::clone(&event_bus));

    // Spawn notification router (stores notifications and pushes them over WebSocket).
    let notification_router = NotificationRouter::new(pool.clone(), Arc::clone(&ws_manager));
    let router_handle = tokio::spawn(notification_router.run(event_bus.subscribe(), cancel.clone()));

    // Spawn expired-session cleanup.
    let cleanup_handle = tokio::spawn(session_cleanup::run(
        pool.clone(),
        Duration::from_secs(config.session_cleanup_interval_secs),
        cancel.clone(),
    ));

    tracing::info!("Background services started (notification router, heartbeat, session cleanup)");

    // --- App state ---
    let config = Arc::new(config);
    let state = AppState {
        gate: PermissionGate::new(pool.clone()),
        pool,
        config: Arc::clone(&config),
        ws_manager: Arc::clone(&ws_manager),
        events: relay,
        login_limiter: Arc::new(LoginRateLimiter::per_minute(config.login_rate_limit_per_min)),
        started_at: Instant::now(),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let wait = Duration::from_secs(config.shutdown_timeout_secs);
    let _ = tokio::time::timeout(wait, router_handle).await;
    let _ = tokio::time::timeout(wait, cleanup_handle).await;
    let _ = tokio::time::timeout(wait, heartbeat_handle).await;
    tracing::info!("Background services stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

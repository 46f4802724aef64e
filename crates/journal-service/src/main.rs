//! Binary entry point for the journal backend.
//!
//! Startup order matters: tracing first, then config, then the metrics
//! recorder (before anything records), then the database pool and
//! migrations, and finally the HTTP server with graceful shutdown.

use journal_service::config::Config;
use journal_service::observability::metrics::init_metrics_recorder;
use journal_service::routes::{self, AppState};
use journal_service::services::Summarizer;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "journal_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting journal service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        bind_address = %config.bind_address,
        jwks_url = %config.jwks_url,
        dev_bypass_enabled = config.dev_bypass_enabled,
        "Configuration loaded"
    );

    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        e
    })?;

    let db_pool = connect_database(&config.database_url).await?;

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| {
            error!("Failed to run database migrations: {}", e);
            e
        })?;
    info!("Database ready, migrations applied");

    let summarizer = Arc::new(Summarizer::new(
        config.llm_api_key.clone(),
        config.llm_api_url.clone(),
        config.llm_model.clone(),
        config.llm_max_tokens,
    ));

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address {:?}: {}", config.bind_address, e);
        e
    })?;

    let state = Arc::new(AppState {
        pool: db_pool,
        config,
        summarizer,
    });
    let app = routes::build_routes(state, metrics_handle);

    info!("Journal service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Journal service shutdown complete");

    Ok(())
}

/// Builds the Postgres pool with a server-side statement timeout so no
/// query can hang a connection indefinitely.
async fn connect_database(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let url = add_query_timeout(database_url, 5);

    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {}", e);
            e
        })
}

/// Resolves when SIGINT or SIGTERM arrives and the drain period has
/// elapsed. The drain keeps the listener open long enough for load
/// balancers to stop routing to this instance.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown"),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    let drain_secs: u64 = std::env::var("JOURNAL_DRAIN_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);

    if drain_secs > 0 {
        warn!("Draining connections for {} seconds", drain_secs);
        tokio::time::sleep(Duration::from_secs(drain_secs)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (JOURNAL_DRAIN_SECONDS=0)");
    }
}

/// Appends a Postgres statement_timeout to the connection URL.
fn add_query_timeout(url: &str, timeout_secs: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}options=-c%20statement_timeout%3D{}s",
        url, separator, timeout_secs
    )
}

// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use recofeed::config::Config;
use recofeed::routes;
use recofeed::state::AppState;
use recofeed::storage::LocalObjectStore;
use recofeed::store::{MemoryStore, PgStore, Store};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CONNECT_ATTEMPTS: u32 = 5;
const CONNECT_BACKOFF: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() {
    dotenv().ok();
    let config = Config::from_env();

    // Dropping the guard stops the file writer; keep it for the process lifetime.
    let _log_guard = init_tracing(&config.rust_log);

    let store: Arc<dyn Store> = match &config.database_url {
        Some(database_url) => {
            let pool = connect_with_retry(database_url).await;

            tracing::info!("Applying migrations");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run database migrations");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set; using the in-memory store. Data is lost on exit.");
            Arc::new(MemoryStore::new())
        }
    };

    let objects = LocalObjectStore::new(&config.storage_root, &config.storage_bucket);
    tracing::info!(
        root = %config.storage_root.display(),
        bucket = %config.storage_bucket,
        "Object store ready"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = routes::create_router(AppState {
        store,
        objects: Arc::new(objects),
        config,
    });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    tracing::info!("recofeed listening on {}", addr);

    axum::serve(listener, app).await.expect("Server error");
}

/// Logs to stdout and to a daily-rotated `logs/recofeed.log`.
fn init_tracing(filter: &str) -> WorkerGuard {
    let (file_writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily("logs", "recofeed.log"));

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(fmt::layer().with_writer(std::io::stdout).with_target(false))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    guard
}

/// Postgres may still be starting when the service boots (compose, CI).
async fn connect_with_retry(database_url: &str) -> PgPool {
    let options = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(3));

    let mut attempt = 1;
    loop {
        match options.clone().connect(database_url).await {
            Ok(pool) => {
                tracing::info!(attempt, "Connected to Postgres");
                return pool;
            }
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                tracing::warn!(attempt, "Postgres unavailable ({}), retrying", e);
                tokio::time::sleep(CONNECT_BACKOFF).await;
                attempt += 1;
            }
            Err(e) => panic!("Could not reach Postgres after {} attempts: {}", CONNECT_ATTEMPTS, e),
        }
    }
}

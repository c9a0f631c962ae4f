use jansou_api::AppState;
use jansou_api::config::AppConfig;
use jansou_api::db;
use jansou_api::events::EventHub;
use jansou_api::routes::build_router;
use tokio::time::{Duration, sleep};

const CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jansou_api=debug,tower_http=debug".parse().unwrap()),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!("starting server on {}", config.listen_addr);

    let pool = db::connect(&config.database_url)
        .await
        .expect("failed to connect to database");
    db::migrate(&pool).await.expect("failed to run migrations");

    let events = EventHub::new();

    {
        let cleanup_pool = pool.clone();
        let cleanup_events = events.clone();
        tokio::spawn(async move {
            loop {
                match db::rooms::delete_expired_rooms(&cleanup_pool).await {
                    Ok(deleted) => tracing::info!(deleted, "expired room cleanup finished"),
                    Err(e) => tracing::warn!(error = %e, "expired room cleanup failed"),
                }
                match db::sessions::delete_expired_sessions(&cleanup_pool).await {
                    Ok(deleted) => tracing::info!(deleted, "expired session cleanup finished"),
                    Err(e) => tracing::warn!(error = %e, "expired session cleanup failed"),
                }
                let pruned = cleanup_events.prune();
                tracing::debug!(pruned, "idle event topics pruned");
                sleep(CLEANUP_INTERVAL).await;
            }
        });
    }

    let state = AppState {
        pool,
        config: config.clone(),
        events,
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind");
    tracing::info!("listening on {}", config.listen_addr);
    axum::serve(listener, app).await.expect("server error");
}

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use buildgate_gateway::app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "buildgate_gateway=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path > BUILDGATE_CONFIG env > ~/.buildgate/buildgate.toml
    let config_path = std::env::var("BUILDGATE_CONFIG").ok();
    let config = buildgate_core::config::BuildgateConfig::load(config_path.as_deref())
        .unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            buildgate_core::config::BuildgateConfig::default()
        });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    let store = buildgate_scheduler::ScheduleStore::new(db)?;

    // The engine gets its own connection so the poll loop never contends
    // with request handlers on the store mutex.
    let engine_store =
        buildgate_scheduler::ScheduleStore::new(rusqlite::Connection::open(db_path)?)?;
    let trigger = buildgate_scheduler::HttpTrigger::new(config.trigger.timeout_secs)?;
    let engine = buildgate_scheduler::SchedulerEngine::new(
        engine_store,
        Box::new(trigger),
        config.trigger.method,
        config.trigger.url.clone(),
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move { engine.run(shutdown_rx).await });

    let state = Arc::new(app::AppState { config, store });
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Buildgate gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    // signal the engine to stop
    let _ = shutdown_tx.send(true);
    Ok(())
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

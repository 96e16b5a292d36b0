// SWIFT Code Directory - Web Server
// REST API with Axum, seeded once from the CSV export on first start

use anyhow::{Context, Result};
use swift_directory::http::{build_router, AppState};
use swift_directory::{init_logging, initialize, CodeResolver, CsvRecordSource, DirectoryConfig, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging("info,tower_http=debug");

    let config = DirectoryConfig::from_env().context("Failed to read configuration")?;

    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("Failed to open database {:?}", config.database_path))?;
    tracing::info!(path = ?config.database_path, "database opened");

    // Runs to completion before the listener is bound
    let source = CsvRecordSource::new(&config.seed_path);
    initialize(&store, &source).context("Initial import failed")?;

    let app = build_router(AppState::new(CodeResolver::new(store)));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    tracing::info!("SWIFT directory listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

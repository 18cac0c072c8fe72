use std::sync::Arc;

use clap::Parser;
use issue_tracker_core::db::{MemoryStore, SqliteStore};
use issue_tracker_core::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use issue_tracker::api;
use issue_tracker::config::{Cli, ServeArgs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| {
                "issue_tracker=debug,issue_tracker_core=debug,tower_http=debug".into()
            }),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse().into_serve_args();
    serve(args).await
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let db = if args.in_memory {
        tracing::warn!("Using in-memory store; data will not survive a restart");
        Database::new(Arc::new(MemoryStore::new()))
    } else {
        let path = args.database_path()?;
        let store = SqliteStore::open(&path)?;
        store.migrate()?;
        tracing::info!("Opened document store at {}", path.display());
        Database::new(Arc::new(store))
    };

    if args.imgbb_api_key.is_none() {
        tracing::warn!("IMGBB_API_KEY not set; screenshot uploads will fail");
    }
    let app = api::create_router(db, Arc::new(args.image_host()));

    let listener = tokio::net::TcpListener::bind((args.host.as_str(), args.port)).await?;
    tracing::info!(
        "Issue tracker listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app).await?;

    Ok(())
}

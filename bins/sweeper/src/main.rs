//! Balance-expiration sweep job.
//!
//! Run from cron (or any scheduler): finds refund credits past the retention
//! window and posts their reversals. Safe to re-run; every posting is
//! idempotent.

use chrono::Utc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catarse_db::{connect, PostingRepository};
use catarse_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catarse=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Run the sweep
    let engine = PostingRepository::new(db);
    let expired = engine.expire_due(Utc::now()).await?;
    info!(expired, "Expiration sweep complete");

    Ok(())
}

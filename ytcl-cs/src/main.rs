//! ytcl-cs (Consensus Server) - Crowd-consensus channel labeling service
//!
//! Accepts weighted per-user votes on whether YouTube channels are
//! AI-generated, maintains the consensus classification, feeds voters a
//! queue of unlabeled channels, and answers classification lookups for the
//! host client.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use ytcl_common::api::auth::load_api_token;
use ytcl_common::config;
use ytcl_common::db::init::init_database;
use ytcl_common::db::settings::get_setting;
use ytcl_cs::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "ytcl-cs", about = "YTCL consensus server")]
struct Args {
    /// Data folder holding the database and fallback dataset
    /// (defaults: YTCL_DATA env, config file, then the OS data directory)
    #[arg(long)]
    data_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting YTCL Consensus Server (ytcl-cs) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let data_folder = config::resolve_data_folder(args.data_folder.as_deref());
    config::ensure_data_folder(&data_folder)?;
    info!("Data folder: {}", data_folder.display());

    let db_path = config::database_path(&data_folder);
    let pool = init_database(&db_path).await?;
    info!("✓ Database ready: {}", db_path.display());

    let api_token = load_api_token(&pool).await?;
    if api_token.is_empty() {
        info!("API authentication disabled (empty labeler token)");
    } else {
        info!("✓ Loaded shared token for API authentication");
    }

    let fallback_path = config::fallback_dataset_path(&data_folder);
    let state = AppState::new(pool.clone(), api_token, fallback_path).await?;
    let app = build_router(state);

    let bind_address = get_setting::<String>(&pool, "http_bind_address")
        .await?
        .unwrap_or_else(|| "127.0.0.1:5730".to_string());

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("ytcl-cs listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

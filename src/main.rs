use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use estate_admin::auth::provider_from_config;
use estate_admin::config::{AppConfig, StoreBackend};
use estate_admin::database::DatabaseManager;
use estate_admin::{app, AppState};

#[derive(Parser, Debug)]
#[command(name = "estate-admin", version, about = "Real-estate back office API and admin login")]
struct Args {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Table store backend: postgres, rest or memory (overrides STORE_BACKEND)")]
    store: Option<StoreBackend>,

    #[arg(long, help = "Apply database migrations before serving (postgres backend)")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DATABASE_URL, SUPABASE_URL etc. are picked up
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("estate_admin=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(backend) = args.store {
        config.store.backend = backend;
    }
    tracing::info!(
        "Starting estate-admin in {:?} mode with the {} store",
        config.environment,
        config.store.backend
    );

    let store = DatabaseManager::connect(&config.store, args.migrate)
        .await
        .context("failed to open the table store")?;
    let auth = provider_from_config(
        &config.admin,
        Duration::from_secs(config.store.connection_timeout),
    )
    .context("failed to configure the auth service")?;

    let bind_addr = format!("{}:{}", config.server.bind_addr, config.server.port);
    let state = AppState::new(config, store, auth);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}

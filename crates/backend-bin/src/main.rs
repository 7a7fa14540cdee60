use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use backend_lib::{
    config::{Settings, DEFAULT_CONFIG_PATH},
    create_router, db, AppState,
};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const INSECURE_DEFAULT_SECRET: &str = "change-me-in-production";

/// How often limiter windows and revoked tokens are swept
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// GuitarTab Pro API server
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, env = "GUITARTAB_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override the configured bind address
    #[arg(short, long)]
    bind: Option<SocketAddr>,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let registry = tracing_subscriber::registry().with(filter);
    if settings.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(bind) = cli.bind {
        settings.bind_addr = bind;
    }

    init_tracing(&settings);
    if settings.auth.jwt_secret == INSECURE_DEFAULT_SECRET {
        tracing::warn!("auth.jwt_secret is the built-in default; set GUITARTAB_AUTH__JWT_SECRET");
    }

    let pool = db::connect(&settings.database_url)
        .await
        .with_context(|| format!("opening {}", settings.database_url))?;

    let addr = settings.bind_addr;
    let state = Arc::new(AppState::new(pool, settings));

    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            sweeper.purge_expired();
        }
    });

    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
}

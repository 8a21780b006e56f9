//! Activity enrollment REST server
//!
//! Loads configuration, initializes logging, runs migrations when a database
//! is configured and serves the activity enrollment REST API.

use activity_enrollment::{Config, EnrollmentModule};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "enrollment-server", version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides `bind_addr`
    #[arg(short, long)]
    bind: Option<String>,

    /// Database URL, overrides `database_url`
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(url) = cli.database_url {
        config.database_url = Some(url);
    }

    init_tracing(&config);

    let module = EnrollmentModule::new(config.clone());
    module.init().await.context("initializing enrollment module")?;

    spawn_notification_relay(&module)?;

    let app = module.register_rest(axum::Router::new())?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    tracing::info!("Enrollment API listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Enrollment API stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    if config.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Forward notifiable audit entries to the guardian-notification log target.
///
/// Delivery is best effort; the audit log stays authoritative.
fn spawn_notification_relay(module: &EnrollmentModule) -> anyhow::Result<()> {
    let mut feed = module.service()?.subscribe();

    tokio::spawn(async move {
        loop {
            match feed.recv().await {
                Ok(entry) if entry.action.is_notifiable() => {
                    tracing::info!(
                        target: "enrollment::notifications",
                        action = %entry.action,
                        target_id = %entry.target_id,
                        school_id = %entry.school_id,
                        details = %entry.details,
                        "guardian notification"
                    );
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notification relay lagged behind audit feed");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deployment_gatekeeper::config::{AppConfig, Overrides};
use deployment_gatekeeper::webhooks::{self, deployment_review::ReviewPipeline};

/// Approves or rejects pending GitHub deployments against an allow-list.
#[derive(Parser, Debug)]
#[command(name = "deployment-gatekeeper", version)]
struct Args {
    /// Optional config file, layered under environment variables.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides SERVER_HOST).
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides SERVER_PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deployment_gatekeeper=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Starting deployment gatekeeper");

    let overrides = Overrides {
        server_host: args.host,
        server_port: args.port,
    };
    let config = match AppConfig::load(args.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            error!("Refusing to start without complete configuration: {}", e);
            return Err(e.into());
        }
    };
    info!("Configuration loaded: {:?}", config);

    let pipeline = ReviewPipeline::from_config(&config).map_err(|e| {
        error!("Failed to initialise GitHub App identity: {}", e);
        e
    })?;
    let app = webhooks::router(Arc::new(pipeline));

    let addr = format!("{}:{}", config.server_host, config.server_port)
        .parse::<SocketAddr>()
        .map_err(|e| format!("Invalid listen address {}:{}: {}", config.server_host, config.server_port, e))?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

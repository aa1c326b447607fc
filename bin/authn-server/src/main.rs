//! Authentication Server
//!
//! Serves the role-gated REST endpoints behind HTTP Basic authentication.
//!
//! ## Configuration
//!
//! Read from `AUTHN_CONFIG`, or the first of `config.toml`, `authn.toml`,
//! `./config/config.toml`, `./config/authn.toml`, `/etc/authn/config.toml`.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `AUTHN_HTTP_HOST` | `0.0.0.0` | Bind address |
//! | `AUTHN_HTTP_PORT` | `8080` | HTTP port |
//! | `AUTHN_STORE_BACKEND` | `memory` | `memory` or `mongodb` |
//! | `AUTHN_MONGODB_URI` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `AUTHN_MONGODB_DATABASE` | `authentication` | MongoDB database name |
//! | `AUTHN_SEED_ENABLED` | `true` | Provision seed users at startup |
//! | `RUST_LOG` | `info` | Log level |
//! | `LOG_FORMAT` | `text` | `text` or `json` |

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

use authn_config::ConfigLoader;
use authn_server::{build_router, build_state};

#[tokio::main]
async fn main() -> Result<()> {
    authn_common::init_logging("authn-server");

    info!("Starting Authentication Server");

    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;

    let state = build_state(&config).await?;
    let app = build_router(state);

    let addr = format!("{}:{}", config.http.host, config.http.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("API server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Authentication Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::Router;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

use crate::{
    admission_review::{AdmissionCodec, ReviewCodec},
    api::{self, state::ApiServerState},
    config::Config,
    webhook::Webhook,
};

/// Serves one webhook behind the admission review endpoint.
pub struct AdmissionServer {
    config: Config,
    state: Arc<ApiServerState>,
}

impl AdmissionServer {
    /// Creates a server that understands every AdmissionReview version known
    /// by [`AdmissionCodec`].
    pub fn new(config: Config, webhook: Arc<dyn Webhook>) -> Self {
        Self::with_codec(config, Arc::new(AdmissionCodec::default()), webhook)
    }

    pub fn with_codec(
        config: Config,
        codec: Arc<dyn ReviewCodec>,
        webhook: Arc<dyn Webhook>,
    ) -> Self {
        let state = Arc::new(ApiServerState {
            codec,
            webhook,
            max_body_size: config.max_body_size,
        });

        Self { config, state }
    }

    pub fn router(&self) -> Router {
        api::router(self.state.clone(), &self.config.webhook_path)
    }

    /// Listens on the configured address until SIGINT or SIGTERM is received.
    pub async fn run(self) -> Result<()> {
        let router = self.router();
        let listener = TcpListener::bind(self.config.addr)
            .await
            .map_err(|e| anyhow!("cannot bind to {}: {}", self.config.addr, e))?;

        info!(
            address = self.config.addr.to_string().as_str(),
            webhook_path = self.config.webhook_path.as_str(),
            "started HTTP server"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = e.to_string().as_str(), "cannot listen for Ctrl+C");
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
                error!(error = e.to_string().as_str(), "cannot listen for SIGTERM");
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

    info!("shutdown signal received");
}

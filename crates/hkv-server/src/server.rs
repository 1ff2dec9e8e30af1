use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use hkv_store::{Context, KvCore};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::AppState;
use crate::router::build_router;

/// hkv RPC server.
pub struct HkvServer {
    config: ServerConfig,
    core: Arc<dyn KvCore>,
    shutdown: CancellationToken,
}

impl HkvServer {
    pub fn new(config: ServerConfig, core: Arc<dyn KvCore>) -> Self {
        Self {
            config,
            core,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        let root = Context::with_cancel(self.shutdown.clone());
        let state = AppState::new(Arc::clone(&self.core), &self.config, root);
        build_router(state, self.config.max_message_size)
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    ///
    /// Request contexts are cancelled when `shutdown` resolves, so draining
    /// requests stop at their next core call and give back any held lock.
    pub async fn serve_until<F>(self, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let token = self.shutdown.clone();
        let shutdown = async move {
            shutdown.await;
            tracing::info!("shutdown requested, cancelling in-flight requests");
            token.cancel();
        };
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            locked_overwrite = self.config.hash.lock_whole_overwrite,
            "hkv server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        self.serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

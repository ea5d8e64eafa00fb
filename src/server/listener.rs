//! TCP accept loop and shutdown handle.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::config::ServerConfig;
use super::connection::handle_connection;
use super::error::{ServerError, ServerResult};
use crate::catalog::SharedDatabase;
use crate::executor::QueryExecutor;

/// A bound, not yet accepting, server.
pub struct Server {
    listener: TcpListener,
    executor: QueryExecutor,
    config: ServerConfig,
}

impl Server {
    /// Bind the configured address.
    pub async fn bind(config: ServerConfig, database: SharedDatabase) -> ServerResult<Self> {
        let addr = config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self {
            listener,
            executor: QueryExecutor::new(database),
            config,
        })
    }

    /// Address actually bound; differs from the config when port 0 was used.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Start accepting on a background task.
    pub fn spawn(self) -> ServerResult<ServerHandle> {
        let local_addr = self.local_addr()?;
        let token = CancellationToken::new();
        let task = tokio::spawn(self.serve(token.clone()));
        Ok(ServerHandle {
            local_addr,
            token,
            task,
        })
    }

    /// Accept connections until `shutdown` is cancelled, then wait for every
    /// connection task to finish.
    pub async fn serve(self, shutdown: CancellationToken) -> ServerResult<()> {
        let local_addr = self.local_addr()?;
        info!(addr = %local_addr, "listening");

        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("shutdown requested, no longer accepting");
                    break;
                }

                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "connection task panicked");
                    }
                }

                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            if let Err(e) = stream.set_nodelay(true) {
                                debug!(%peer, error = %e, "failed to set TCP_NODELAY");
                            }
                            connections.spawn(handle_connection(
                                stream,
                                peer,
                                self.executor.clone(),
                                self.config.max_message_size,
                                shutdown.child_token(),
                            ));
                        }
                        Err(e) => error!(error = %e, "accept failed"),
                    }
                }
            }
        }

        drop(self.listener);
        debug!(open = connections.len(), "waiting for connections to close");
        while let Some(joined) = connections.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "connection task panicked");
            }
        }
        info!("server stopped");
        Ok(())
    }
}

/// Handle to a spawned server.
pub struct ServerHandle {
    local_addr: SocketAddr,
    token: CancellationToken,
    task: JoinHandle<ServerResult<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, close every connection and wait for all of them.
    pub async fn shutdown(self) -> ServerResult<()> {
        self.token.cancel();
        self.wait().await
    }

    /// Wait for the server to stop on its own token.
    pub async fn wait(self) -> ServerResult<()> {
        self.task
            .await
            .map_err(|e| ServerError::Task(e.to_string()))?
    }
}

//! Listener and accept loop
//!
//! Owns the TCP listener, starts the federator, and spawns one handler task
//! per accepted socket. Admission is checked against the federator's live
//! membership count; sockets over the limit are closed on the spot.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::federator::{Federator, FederatorHandle};
use crate::handler::handle_connection;

/// The chat server
pub struct ChatServer {
    listener: TcpListener,
    federator: FederatorHandle,
    config: Arc<Config>,
}

impl ChatServer {
    /// Bind the listen address and start the federator
    ///
    /// Failing to bind is the only fatal error in the server.
    pub async fn bind(config: Config) -> Result<Self, AppError> {
        let listener = TcpListener::bind(config.listen).await?;

        let (federator, handle) = Federator::new(config.max_connections);
        tokio::spawn(federator.run());

        Ok(Self {
            listener,
            federator: handle,
            config: Arc::new(config),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the running federator
    pub fn federator(&self) -> &FederatorHandle {
        &self.federator
    }

    /// Accept connections until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()> + Send,
    {
        let ChatServer {
            listener,
            federator,
            config,
        } = self;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => admit(stream, addr, &federator, &config),
                        Err(e) => warn!("Failed to accept connection: {}", e),
                    }
                }
            }
        }
    }

    /// Accept connections until Ctrl-C
    pub async fn run_until_ctrl_c(self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to install Ctrl-C handler: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }
}

/// Spawn a handler for `stream`, or drop it if membership is full
fn admit(stream: TcpStream, addr: SocketAddr, federator: &FederatorHandle, config: &Arc<Config>) {
    let members = federator.member_count();
    if members >= config.max_connections {
        warn!(
            "Could not accept connection #{} from {}: server full",
            members, addr
        );
        return;
    }

    let federator = federator.clone();
    let config = Arc::clone(config);
    tokio::spawn(async move {
        if let Err(e) = handle_connection(stream, federator, &config).await {
            warn!("Connection from {} closed: {}", addr, e);
        }
    });
}

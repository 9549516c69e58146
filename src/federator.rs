//! Federator actor implementation
//!
//! The single task that owns the membership set. Every join, leave and chat
//! line flows through it, so membership needs no locks: handlers talk to it
//! over two bounded mpsc channels and it alone mutates the set.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::JOIN_CHANNEL_CAPACITY;
use crate::connection::Connection;
use crate::error::{AppError, JoinRejection};
use crate::message::{join_notice, leave_notice};
use crate::types::ConnectionId;

/// A connection asking to enter the membership set
#[derive(Debug)]
pub struct JoinRequest {
    /// The registered connection
    pub connection: Connection,
    /// Receives the outcome once the federator has decided
    pub verdict: oneshot::Sender<Result<(), JoinRejection>>,
}

/// Events sent from session tasks to the federator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A fully formatted line to broadcast (without trailing newline)
    Message(String),
    /// A session ended
    Leave {
        id: ConnectionId,
        name: String,
        /// Whether to broadcast `← name` after removal
        announce: bool,
    },
}

/// Cloneable handle used by the accept loop and session tasks
#[derive(Debug, Clone)]
pub struct FederatorHandle {
    joins: mpsc::Sender<JoinRequest>,
    events: mpsc::Sender<ChatEvent>,
    live: Arc<AtomicUsize>,
}

impl FederatorHandle {
    /// Submit a connection and wait for the federator's verdict
    ///
    /// On rejection the federator has already written the notice and
    /// closed the connection.
    pub async fn join(&self, connection: Connection) -> Result<(), AppError> {
        let (verdict, outcome) = oneshot::channel();
        self.joins
            .send(JoinRequest {
                connection,
                verdict,
            })
            .await
            .map_err(|_| AppError::FederatorClosed)?;

        outcome
            .await
            .map_err(|_| AppError::FederatorClosed)?
            .map_err(AppError::from)
    }

    /// Queue a formatted line for broadcast
    ///
    /// Waits if the event channel is full.
    pub async fn chat(&self, line: String) -> Result<(), AppError> {
        self.send(ChatEvent::Message(line)).await
    }

    /// Report that a session ended
    pub async fn leave(&self, id: ConnectionId, name: String, announce: bool) -> Result<(), AppError> {
        self.send(ChatEvent::Leave { id, name, announce }).await
    }

    /// Current membership size as last published by the federator
    pub fn member_count(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    async fn send(&self, event: ChatEvent) -> Result<(), AppError> {
        self.events
            .send(event)
            .await
            .map_err(|_| AppError::FederatorClosed)
    }
}

/// The membership owner and broadcaster
///
/// Members are kept in join order; broadcasts visit them in that order.
pub struct Federator {
    /// Active connections, insertion-ordered, names pairwise distinct
    members: Vec<Connection>,
    /// Join request receiver
    joins: mpsc::Receiver<JoinRequest>,
    /// Chat and leave event receiver
    events: mpsc::Receiver<ChatEvent>,
    /// Mirror of `members.len()` readable from other tasks
    live: Arc<AtomicUsize>,
    /// Upper bound on `members.len()`
    max_connections: usize,
}

impl Federator {
    /// Create a federator and its handle
    ///
    /// The event channel holds `max_connections` events.
    pub fn new(max_connections: usize) -> (Self, FederatorHandle) {
        let (join_tx, join_rx) = mpsc::channel(JOIN_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(max_connections.max(1));
        let live = Arc::new(AtomicUsize::new(0));

        let federator = Self {
            members: Vec::new(),
            joins: join_rx,
            events: event_rx,
            live: Arc::clone(&live),
            max_connections,
        };
        let handle = FederatorHandle {
            joins: join_tx,
            events: event_tx,
            live,
        };
        (federator, handle)
    }

    /// Run the federator event loop
    ///
    /// Waits on both channels at once. When both are ready either may be
    /// serviced first. Ends once every handle has been dropped.
    pub async fn run(mut self) {
        info!("Federator started");

        loop {
            tokio::select! {
                Some(request) = self.joins.recv() => {
                    self.handle_join(request).await;
                }
                Some(event) = self.events.recv() => {
                    self.handle_event(event).await;
                }
                else => break,
            }
        }

        info!("Federator shutting down");
    }

    /// Handle a join request
    async fn handle_join(&mut self, request: JoinRequest) {
        let JoinRequest {
            connection,
            verdict,
        } = request;

        if let Some(rejection) = self.admission(&connection) {
            warn!("Rejecting '{}' ({}): {}", connection.name, connection.id, rejection);
            if let Err(e) = connection.send(rejection.notice()).await {
                debug!("Could not deliver rejection to {}: {}", connection.id, e);
            }
            connection.close().await;
            let _ = verdict.send(Err(rejection));
            return;
        }

        info!("'{}' joined ({})", connection.name, connection.id);
        let announcement = join_notice(&connection.name);
        self.members.push(connection);
        self.publish_count();
        let _ = verdict.send(Ok(()));

        self.broadcast(&announcement).await;
    }

    /// Handle a chat or leave event
    async fn handle_event(&mut self, event: ChatEvent) {
        match event {
            ChatEvent::Message(line) => self.broadcast(&line).await,
            ChatEvent::Leave { id, name, announce } => {
                if self.remove(id) {
                    info!("'{}' left ({})", name, id);
                }
                if announce {
                    self.broadcast(&leave_notice(&name)).await;
                }
            }
        }
    }

    /// Decide whether a connection may join
    fn admission(&self, connection: &Connection) -> Option<JoinRejection> {
        if self.members.iter().any(|m| m.name == connection.name) {
            Some(JoinRejection::UsernameTaken)
        } else if self.members.len() >= self.max_connections {
            Some(JoinRejection::ServerFull)
        } else {
            None
        }
    }

    /// Write `line` plus a newline to every member, evicting failures
    ///
    /// A failed write only affects that member; the fan-out continues.
    async fn broadcast(&mut self, line: &str) {
        debug!("msg: {}", line);
        let framed = format!("{}\n", line);

        let mut failed = Vec::new();
        for member in &self.members {
            if let Err(e) = member.send(&framed).await {
                warn!("Client write failure, dropping '{}': {}", member.name, e);
                failed.push(member.id);
            }
        }

        if !failed.is_empty() {
            self.members.retain(|m| !failed.contains(&m.id));
            self.publish_count();
        }
    }

    /// Remove a member by identity; returns whether it was present
    fn remove(&mut self, id: ConnectionId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m.id != id);
        let removed = self.members.len() != before;
        if removed {
            self.publish_count();
        }
        removed
    }

    fn publish_count(&self) {
        self.live.store(self.members.len(), Ordering::Release);
        debug!("Total members: {}", self.members.len());
    }
}

//! Line-oriented TCP Chat Server Library
//!
//! Clients connect with any line-based tool (netcat, telnet), pick a unique
//! username, and every line they send is broadcast to everyone connected.
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Federator` is the central actor owning the membership set
//! - Each connection has a `handler` task: registration, join, session loop
//! - No locks around membership - all changes go through message passing
//! - Socket writes go through a per-connection `LineWriter`, one lock per line
//!
//! # Wire protocol
//! ```text
//! S: What is your username?:
//! C: alice
//! S: → alice
//! C: hello
//! S: alice → hello
//! C: !quit
//! S (to others): ← alice
//! ```
//!
//! # Example
//! ```ignore
//! use line_chat::{ChatServer, Config};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = ChatServer::bind(Config::default()).await.unwrap();
//!     server.run_until_ctrl_c().await;
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod federator;
pub mod framer;
pub mod handler;
pub mod message;
pub mod registration;
pub mod server;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use config::Config;
pub use connection::{Connection, LineWriter};
pub use error::{AppError, JoinRejection};
pub use federator::{ChatEvent, Federator, FederatorHandle};
pub use handler::handle_connection;
pub use server::ChatServer;
pub use session::SessionEnd;
pub use types::ConnectionId;

//! Process-wide configuration
//!
//! Parsed once from command-line flags and shared read-only with every task.

use std::net::SocketAddr;

use clap::Parser;

/// Capacity of the federator's join channel
pub const JOIN_CHANNEL_CAPACITY: usize = 20;

/// Server configuration, fixed for the lifetime of the process
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Address to listen on. `:PORT` binds every interface.
    #[arg(short = 'p', long = "listen", default_value = ":9090", value_parser = parse_listen_addr)]
    pub listen: SocketAddr,

    /// Maximum concurrent chat connections
    #[arg(short = 'm', long = "max-connections", default_value_t = 100, value_parser = parse_positive)]
    pub max_connections: usize,

    /// Maximum bytes taken from a single message read
    #[arg(short = 's', long = "max-message-size", default_value_t = 256, value_parser = parse_positive)]
    pub max_message_size: usize,

    /// Maximum bytes taken from a username read
    #[arg(short = 'u', long = "max-username-size", default_value_t = 25, value_parser = parse_positive)]
    pub max_username_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 9090)),
            max_connections: 100,
            max_message_size: 256,
            max_username_size: 25,
        }
    }
}

/// Parse a listen address, treating a bare `:PORT` as all interfaces
pub fn parse_listen_addr(value: &str) -> Result<SocketAddr, String> {
    let candidate = match value.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{}", port),
        None => value.to_string(),
    };
    candidate
        .parse()
        .map_err(|e| format!("invalid listen address '{}': {}", value, e))
}

fn parse_positive(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

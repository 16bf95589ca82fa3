//! Server and client configuration
//!
//! Plain values handed to the drivers at startup. Nothing here is read from
//! the environment; the binaries build these from their command lines.

use crate::http::{DEFAULT_DOCUMENT, DEFAULT_PORT};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind
    pub bind_address: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Root of the file store
    pub root: PathBuf,
    /// Document served for GET "/"
    pub default_document: String,
    /// Per-connection read timeout; `None` blocks indefinitely
    pub read_timeout: Option<Duration>,
}

impl ServerConfig {
    /// Configuration serving `root` with every other value defaulted
    pub fn new(root: impl Into<PathBuf>) -> Self {
        ServerConfig {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Socket address to listen on
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            root: PathBuf::from("."),
            default_document: DEFAULT_DOCUMENT.to_string(),
            read_timeout: None,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server host name or address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Directory POST uploads are read from
    pub work_dir: PathBuf,
    /// Read timeout while waiting for the response
    pub read_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Configuration targeting `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        ClientConfig {
            host: host.into(),
            port,
            work_dir: PathBuf::from("."),
            read_timeout: None,
        }
    }
}

/// Parse a port argument, falling back to the default when it is invalid
pub fn port_or_default(arg: Option<&str>) -> u16 {
    match arg {
        None => DEFAULT_PORT,
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) => port,
            Err(_) => {
                tracing::warn!(
                    port = raw,
                    fallback = DEFAULT_PORT,
                    "Invalid port specified, falling back to default"
                );
                DEFAULT_PORT
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::new("/srv/www");
        assert_eq!(config.port, 5000);
        assert_eq!(config.default_document, "index.html");
        assert_eq!(config.root, PathBuf::from("/srv/www"));
        assert_eq!(config.read_timeout, None);
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:5000");
    }

    #[test]
    fn test_client_defaults() {
        let config = ClientConfig::new("localhost", 8080);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert_eq!(config.work_dir, PathBuf::from("."));
    }

    #[test]
    fn test_port_or_default() {
        assert_eq!(port_or_default(None), 5000);
        assert_eq!(port_or_default(Some("8080")), 8080);
        assert_eq!(port_or_default(Some("eighty")), 5000);
        assert_eq!(port_or_default(Some("70000")), 5000);
    }
}

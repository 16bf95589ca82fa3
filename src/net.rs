//! Listener bootstrap and accept loop
//!
//! The server accepts connections on a blocking listener and hands each one
//! to its own worker thread. Workers share nothing mutable: each gets a
//! clone of the read-only configuration and file store. A failing
//! connection is logged and dropped; the accept loop keeps running.

use crate::config::ServerConfig;
use crate::http::session::FdSessionOps;
use crate::http::{Error, HttpServer, Status};
use crate::store::FileStore;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Pending connection queue length
const LISTEN_BACKLOG: i32 = 128;

/// Pause after the first failed accept
const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);

/// Longest pause between accept attempts while accepting keeps failing
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Pause before the next accept after `failures` consecutive failures
///
/// Doubles from `ACCEPT_BACKOFF_MIN` up to `ACCEPT_BACKOFF_MAX`. Errors such
/// as EMFILE persist until some worker closes its connection.
fn accept_backoff(failures: u32) -> Duration {
    let shift = failures.saturating_sub(1).min(16);
    ACCEPT_BACKOFF_MIN
        .saturating_mul(1 << shift)
        .min(ACCEPT_BACKOFF_MAX)
}

/// Create a listening socket bound to `addr`
pub fn bind(addr: SocketAddr) -> io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(LISTEN_BACKLOG)?;
    Ok(socket.into())
}

/// File server: listener plus the shared read-only state
pub struct Server {
    listener: TcpListener,
    config: Arc<ServerConfig>,
    store: FileStore,
}

impl Server {
    /// Bind the configured address
    pub fn bind(config: ServerConfig) -> io::Result<Self> {
        let listener = bind(config.listen_addr())?;
        Ok(Self::from_listener(listener, config))
    }

    /// Serve on an already bound listener
    pub fn from_listener(listener: TcpListener, config: ServerConfig) -> Self {
        let store = FileStore::new(config.root.clone());
        Server {
            listener,
            config: Arc::new(config),
            store,
        }
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, one worker per connection
    pub fn run(&self) -> io::Result<()> {
        tracing::info!(
            address = %self.local_addr()?,
            root = %self.config.root.display(),
            "Http server listening"
        );

        let mut failures = 0u32;
        loop {
            // Workers are detached; they close their own connection
            match self.accept_one() {
                Ok(_) => failures = 0,
                Err(e) => {
                    failures = failures.saturating_add(1);
                    let delay = accept_backoff(failures);
                    tracing::warn!(
                        error = %e,
                        failures,
                        retry_in_ms = delay.as_millis() as u64,
                        "Failed to accept connection"
                    );
                    thread::sleep(delay);
                }
            }
        }
    }

    /// Accept `count` connections, then wait for their workers to finish
    pub fn run_for(&self, count: usize) -> Vec<Option<Status>> {
        let workers: Vec<_> = (0..count)
            .filter_map(|_| match self.accept_one() {
                Ok(worker) => worker,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to accept connection");
                    None
                }
            })
            .collect();

        workers
            .into_iter()
            .map(|worker| worker.join().ok().flatten())
            .collect()
    }

    /// Accept one connection and spawn its worker
    ///
    /// Fails only when `accept` itself fails. Returns `Ok(None)` when the
    /// worker thread could not be spawned; the connection is dropped.
    fn accept_one(&self) -> io::Result<Option<JoinHandle<Option<Status>>>> {
        let (stream, peer) = self.listener.accept()?;

        tracing::info!(%peer, "Client connected");

        let config = Arc::clone(&self.config);
        let store = self.store.clone();
        let spawned = thread::Builder::new()
            .name(format!("barehttp-{}", peer))
            .spawn(move || handle_connection(stream, peer, &config, store));

        match spawned {
            Ok(handle) => Ok(Some(handle)),
            Err(e) => {
                tracing::error!(%peer, error = %e, "Failed to spawn worker");
                Ok(None)
            }
        }
    }
}

/// Run one exchange on an accepted connection
///
/// Returns the status sent, or `None` if the connection was closed without
/// a response.
pub fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    config: &ServerConfig,
    store: FileStore,
) -> Option<Status> {
    let mut server = HttpServer::new(FdSessionOps::new(stream), store)
        .with_default_document(config.default_document.clone());
    server.set_timeout(config.read_timeout);

    match server.serve() {
        Ok(status) => Some(status),
        Err(Error::ConnectionClosed) => {
            tracing::debug!(%peer, "Client closed the connection before sending a request");
            None
        }
        Err(e) if e.is_protocol() => {
            tracing::warn!(%peer, error = %e, "Malformed request, closing connection");
            None
        }
        Err(e) => {
            tracing::warn!(%peer, error = %e, "Error processing client request");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_bind_ephemeral_port() {
        let listener = bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_accept_backoff_grows_and_caps() {
        assert_eq!(accept_backoff(1), Duration::from_millis(10));
        assert_eq!(accept_backoff(2), Duration::from_millis(20));
        assert_eq!(accept_backoff(4), Duration::from_millis(80));
        assert_eq!(accept_backoff(8), Duration::from_secs(1));
        assert_eq!(accept_backoff(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_run_for_serves_connections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), b"hi").unwrap();

        let listener = bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let server = Server::from_listener(listener, ServerConfig::new(dir.path()));

        let client = thread::spawn(move || {
            let mut ok = TcpStream::connect(addr).unwrap();
            ok.write_all(b"GET / HTTP/1.1\r\n\r\n").unwrap();
            let mut buf = Vec::new();
            ok.read_to_end(&mut buf).unwrap();

            // Connect and hang up without a request
            drop(TcpStream::connect(addr).unwrap());
            buf
        });

        let statuses = server.run_for(2);
        assert_eq!(client.join().unwrap(), b"HTTP/1.1 200 OK\r\n\r\nhi");
        assert_eq!(statuses, vec![Some(Status::OK), None]);
    }
}

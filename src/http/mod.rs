//! Minimal HTTP/1.1 protocol engine
//!
//! This module provides the pieces shared by the barehttp client and server:
//! message framing, request parsing, and the two protocol drivers.
//!
//! # Architecture
//!
//! The HTTP layer talks to the network through a session operations
//! abstraction, so the drivers never own socket setup:
//!
//! - `SessionOps` trait defines operations (wait_readable, read, write, close)
//! - `HttpSession` wraps a `SessionOps` and applies an optional read timeout
//! - `HttpServer` and `HttpClient` run one request/response exchange each
//!
//! Bodies are framed only by `Content-Length`. There is no chunked encoding
//! and no keep-alive: every connection carries exactly one exchange.
//!
//! # Examples
//!
//! ```no_run
//! use barehttp::http::HttpClient;
//! use barehttp::http::session::FdSessionOps;
//! use std::net::TcpStream;
//!
//! let stream = TcpStream::connect("127.0.0.1:5000").unwrap();
//! let mut client = HttpClient::new(FdSessionOps::new(stream));
//!
//! let response = client.get("/index.html").unwrap();
//! assert_eq!(response.status().code(), 200);
//! ```

pub mod client;
pub mod headers;
pub mod message;
pub mod parser;
pub mod server;
pub mod session;

pub use client::HttpClient;
pub use headers::Headers;
pub use message::{HttpRequest, HttpResponse, Method, Status, Version};
pub use parser::{RequestParser, ResponseParser};
pub use server::HttpServer;
pub use session::{HttpSession, SessionOps};

/// Result type for HTTP operations
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP operation errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid HTTP version: {0}")]
    InvalidVersion(String),

    #[error("Unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    #[error("Invalid HTTP status: {0}")]
    InvalidStatus(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Missing Content-Length header")]
    MissingContentLength,

    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    #[error("Short body: expected {expected} bytes, received {received}")]
    ShortBody { expected: usize, received: usize },

    #[error("Incomplete message: stream ended before the header section")]
    Incomplete,

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("File store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Timeout")]
    Timeout,

    #[error("Connection closed")]
    ConnectionClosed,
}

impl Error {
    /// Whether this is a protocol parse failure.
    ///
    /// The server answers these by closing the connection without a response.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Error::Parse(_)
                | Error::InvalidVersion(_)
                | Error::InvalidStatus(_)
                | Error::InvalidHeader(_)
                | Error::MissingContentLength
                | Error::InvalidContentLength(_)
                | Error::ShortBody { .. }
                | Error::Incomplete
                | Error::InvalidTarget(_)
        )
    }
}

/// Maximum number of distinct headers kept per message
///
/// `Content-Length` is always kept, even past the cap.
pub const MAX_HEADERS: usize = 64;

/// Longest request, status or header line accepted, in bytes
pub const MAX_LINE_LEN: usize = 8192;

/// Default port the server listens on
pub const DEFAULT_PORT: u16 = 5000;

/// Document served when a GET targets "/"
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// The only header whose value carries meaning
pub const CONTENT_LENGTH: &str = "Content-Length";

/// CRLF line ending
pub const CRLF: &str = "\r\n";

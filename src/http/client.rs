//! HTTP client protocol driver
//!
//! A client sends exactly one request per connection and then reads the
//! response until the server closes the stream. The response is surfaced
//! either line by line (`display_response`) or as a parsed message
//! (`receive_response`).

use super::{
    HttpRequest, HttpResponse, HttpSession, Method, ResponseParser, Result, SessionOps,
    CONTENT_LENGTH,
};
use crate::config::ClientConfig;
use crate::http::session::FdSessionOps;
use std::fs;
use std::io::Write;
use std::net::TcpStream;
use std::path::PathBuf;
use std::time::Duration;

/// HTTP client
pub struct HttpClient<S: SessionOps> {
    session: HttpSession<S>,
    parser: ResponseParser,
}

impl<S: SessionOps> HttpClient<S> {
    /// Create a new HTTP client with a session
    pub fn new(session: S) -> Self {
        HttpClient {
            session: HttpSession::new(session),
            parser: ResponseParser::new(),
        }
    }

    /// Set the read timeout
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.session.set_timeout(timeout);
    }

    /// Send an HTTP request
    pub fn send_request(&mut self, request: &HttpRequest) -> Result<()> {
        self.session.write_all(&request.to_wire())
    }

    /// Receive the response as a parsed message
    ///
    /// Reads until end-of-stream unless the response declares a
    /// `Content-Length`.
    pub fn receive_response(&mut self) -> Result<HttpResponse> {
        self.parser.reset();
        let mut temp = [0u8; 4096];

        loop {
            let n = self.session.read(&mut temp)?;

            if n == 0 {
                return self.parser.finish();
            }

            if let Some(response) = self.parser.parse(&temp[..n])? {
                return Ok(response);
            }
        }
    }

    /// Copy the response to `out` line by line until the stream closes
    ///
    /// Each line is written with a trailing newline and without its CR.
    /// Returns the number of lines written.
    pub fn display_response<W: Write>(&mut self, mut out: W) -> Result<usize> {
        let mut pending: Vec<u8> = Vec::new();
        let mut lines = 0;
        let mut temp = [0u8; 4096];

        loop {
            let n = self.session.read(&mut temp)?;
            if n == 0 {
                break;
            }
            pending.extend_from_slice(&temp[..n]);

            while let Some(lf) = pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = pending.drain(..=lf).collect();
                write_line(&mut out, &line[..lf])?;
                lines += 1;
            }
        }

        if !pending.is_empty() {
            write_line(&mut out, &pending)?;
            lines += 1;
        }

        out.flush()?;
        Ok(lines)
    }

    /// Send a GET request and receive the response
    pub fn get(&mut self, target: &str) -> Result<HttpResponse> {
        self.send_request(&build_request(Method::Get, target, None))?;
        self.receive_response()
    }

    /// Send a POST request with body and receive the response
    pub fn post(&mut self, target: &str, body: Vec<u8>) -> Result<HttpResponse> {
        self.send_request(&build_request(Method::Post, target, Some(body)))?;
        self.receive_response()
    }

    /// Close the connection
    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }
}

fn write_line<W: Write>(out: &mut W, line: &[u8]) -> Result<()> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    out.write_all(line)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// Build the request a client sends
///
/// GET carries no headers. POST carries the body and a `Content-Length`
/// equal to its exact byte count.
pub fn build_request(method: Method, target: &str, body: Option<Vec<u8>>) -> HttpRequest {
    let builder = HttpRequest::builder()
        .method(method)
        .target(normalize_target(target));

    match (method, body) {
        (Method::Post, body) => {
            let body = body.unwrap_or_default();
            builder
                .header(CONTENT_LENGTH, body.len().to_string())
                .body(body)
                .build()
        }
        (Method::Get, _) => builder.build(),
    }
}

/// Prefix a target with "/" when it lacks one
pub fn normalize_target(target: &str) -> String {
    if target.starts_with('/') {
        target.to_string()
    } else {
        format!("/{}", target)
    }
}

/// Run one client exchange end to end and write the response lines to `out`
///
/// The method and, for POST, the local file are checked before connecting,
/// so an unsupported method or unreadable file never puts bytes on the
/// wire. The connection is closed afterwards whatever the outcome.
pub fn run<W: Write>(config: &ClientConfig, method: &str, file_name: &str, out: W) -> Result<usize> {
    let method = Method::parse_ignore_case(method)?;

    let body = match method {
        Method::Get => None,
        Method::Post => {
            let path: PathBuf = config.work_dir.join(file_name.trim_start_matches('/'));
            Some(fs::read(&path)?)
        }
    };
    let request = build_request(method, file_name, body);

    let stream = TcpStream::connect((config.host.as_str(), config.port))?;
    tracing::debug!(host = %config.host, port = config.port, "Connected");

    let mut client = HttpClient::new(FdSessionOps::new(stream));
    client.set_timeout(config.read_timeout);

    let result = client
        .send_request(&request)
        .and_then(|_| client.display_response(out));

    if let Err(e) = client.close() {
        tracing::debug!(error = %e, "Error closing connection");
    }

    result
}

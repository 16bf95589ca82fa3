//! HTTP message types
//!
//! This module defines requests, responses and their wire encoding.
//! A request line serializes as `METHOD SP TARGET SP VERSION CRLF`, a status
//! line as `VERSION SP CODE SP REASON CRLF`. The header section always ends
//! with a bare CRLF, and body bytes follow it with no further delimiter.

use super::{Error, Headers, Result, CRLF};
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;
use std::str::FromStr;

/// HTTP methods understood by this implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Convert method to its wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }

    /// Parse a method token ignoring ASCII case
    ///
    /// Used on the client side, where the method comes from the user.
    pub fn parse_ignore_case(s: &str) -> Result<Self> {
        s.to_ascii_uppercase().parse()
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            _ => Err(Error::UnsupportedMethod(s.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Version {
    Http10,
    #[default]
    Http11,
}

impl Version {
    /// Convert version to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "HTTP/1.0" => Ok(Version::Http10),
            "HTTP/1.1" => Ok(Version::Http11),
            _ => Err(Error::InvalidVersion(s.to_string())),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP status code
///
/// Only the five statuses the server can produce are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status {
    code: u16,
}

impl Status {
    pub const OK: Status = Status { code: 200 };
    pub const CREATED: Status = Status { code: 201 };
    pub const NOT_FOUND: Status = Status { code: 404 };
    pub const METHOD_NOT_ALLOWED: Status = Status { code: 405 };
    pub const CONFLICT: Status = Status { code: 409 };

    /// Create a status from its numeric code
    pub fn new(code: u16) -> Result<Self> {
        match code {
            200 | 201 | 404 | 405 | 409 => Ok(Status { code }),
            _ => Err(Error::InvalidStatus(format!("Unsupported status code: {}", code))),
        }
    }

    /// Get the status code
    pub fn code(&self) -> u16 {
        self.code
    }

    /// Get the canonical reason phrase for this status code
    pub fn reason_phrase(&self) -> &'static str {
        match self.code {
            200 => "OK",
            201 => "Created",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.reason_phrase())
    }
}

/// HTTP request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: Method,
    target: String,
    version: Version,
    headers: Headers,
    body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Create a new HTTP request with no headers and no body
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        HttpRequest {
            method,
            target: target.into(),
            version: Version::default(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Create a builder for constructing requests
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Get the request method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Get the request target, e.g. "/index.html"
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get the headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the body, if one was sent
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Encode the request line: `METHOD SP TARGET SP VERSION CRLF`
    pub fn encode_request_line(&self, buf: &mut BytesMut) {
        buf.put_slice(self.method.as_str().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.target.as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.version.as_str().as_bytes());
        buf.put_slice(CRLF.as_bytes());
    }

    /// Convert the request to wire format
    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(
            64 + self.target.len() + self.body.as_ref().map_or(0, Vec::len),
        );

        self.encode_request_line(&mut buf);
        self.headers.write_to(&mut buf);
        buf.put_slice(CRLF.as_bytes());

        if let Some(body) = &self.body {
            buf.put_slice(body);
        }

        buf.freeze()
    }
}

/// Builder for HTTP requests
#[derive(Debug, Default)]
pub struct HttpRequestBuilder {
    method: Option<Method>,
    target: Option<String>,
    version: Option<Version>,
    headers: Headers,
    body: Option<Vec<u8>>,
}

impl HttpRequestBuilder {
    /// Set the HTTP method
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the target
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the HTTP version
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace all headers
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Set the body
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Build the request
    pub fn build(self) -> HttpRequest {
        HttpRequest {
            method: self.method.unwrap_or(Method::Get),
            target: self.target.unwrap_or_else(|| "/".to_string()),
            version: self.version.unwrap_or_default(),
            headers: self.headers,
            body: self.body,
        }
    }
}

/// HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    version: Version,
    status: Status,
    reason: String,
    headers: Headers,
    body: Option<Vec<u8>>,
}

impl HttpResponse {
    /// Create a bodiless response carrying only a status line
    pub fn new(status: Status) -> Self {
        HttpResponse {
            version: Version::default(),
            status,
            reason: status.reason_phrase().to_string(),
            headers: Headers::new(),
            body: None,
        }
    }

    /// Create a builder for constructing responses
    pub fn builder() -> HttpResponseBuilder {
        HttpResponseBuilder::default()
    }

    /// Get the HTTP version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Get the status code
    pub fn status(&self) -> Status {
        self.status
    }

    /// Get the reason phrase
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Get the headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Get the body, if any
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Encode the status line: `VERSION SP CODE SP REASON CRLF`
    pub fn encode_status_line(&self, buf: &mut BytesMut) {
        buf.put_slice(self.version.as_str().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.status.code().to_string().as_bytes());
        buf.put_u8(b' ');
        buf.put_slice(self.reason.as_bytes());
        buf.put_slice(CRLF.as_bytes());
    }

    /// Convert the response to wire format
    pub fn to_wire(&self) -> Bytes {
        let mut buf =
            BytesMut::with_capacity(64 + self.body.as_ref().map_or(0, Vec::len));

        self.encode_status_line(&mut buf);
        self.headers.write_to(&mut buf);
        buf.put_slice(CRLF.as_bytes());

        if let Some(body) = &self.body {
            buf.put_slice(body);
        }

        buf.freeze()
    }
}

/// Builder for HTTP responses
#[derive(Debug, Default)]
pub struct HttpResponseBuilder {
    version: Option<Version>,
    status: Option<Status>,
    reason: Option<String>,
    headers: Headers,
    body: Option<Vec<u8>>,
}

impl HttpResponseBuilder {
    /// Set the HTTP version
    pub fn version(mut self, version: Version) -> Self {
        self.version = Some(version);
        self
    }

    /// Set the status code
    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the reason phrase
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace all headers
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Set the body
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Build the response
    pub fn build(self) -> HttpResponse {
        let status = self.status.unwrap_or(Status::OK);
        let reason = self
            .reason
            .unwrap_or_else(|| status.reason_phrase().to_string());
        HttpResponse {
            version: self.version.unwrap_or_default(),
            status,
            reason,
            headers: self.headers,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_from_str() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("POST".parse::<Method>().unwrap(), Method::Post);
        assert!(matches!(
            "get".parse::<Method>(),
            Err(Error::UnsupportedMethod(m)) if m == "get"
        ));
        assert!("DELETE".parse::<Method>().is_err());
    }

    #[test]
    fn test_method_ignore_case() {
        assert_eq!(Method::parse_ignore_case("get").unwrap(), Method::Get);
        assert_eq!(Method::parse_ignore_case("PoSt").unwrap(), Method::Post);
        assert!(Method::parse_ignore_case("put").is_err());
    }

    #[test]
    fn test_version_from_str() {
        assert_eq!("HTTP/1.0".parse::<Version>().unwrap(), Version::Http10);
        assert_eq!("HTTP/1.1".parse::<Version>().unwrap(), Version::Http11);
        assert!("HTTP/2.0".parse::<Version>().is_err());
    }

    #[test]
    fn test_status() {
        let status = Status::new(201).unwrap();
        assert_eq!(status, Status::CREATED);
        assert_eq!(status.reason_phrase(), "Created");
        assert!(Status::new(500).is_err());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::OK.to_string(), "200 OK");
        assert_eq!(Status::CREATED.to_string(), "201 Created");
        assert_eq!(Status::NOT_FOUND.to_string(), "404 Not Found");
        assert_eq!(
            Status::METHOD_NOT_ALLOWED.to_string(),
            "405 Method Not Allowed"
        );
        assert_eq!(Status::CONFLICT.to_string(), "409 Conflict");
    }

    #[test]
    fn test_request_builder() {
        let req = HttpRequest::builder()
            .method(Method::Post)
            .target("/test")
            .header("Content-Length", "5")
            .body(b"Hello".to_vec())
            .build();

        assert_eq!(req.method(), Method::Post);
        assert_eq!(req.target(), "/test");
        assert_eq!(req.body(), Some(&b"Hello"[..]));
        assert_eq!(req.headers().get("Content-Length"), Some("5"));
    }

    #[test]
    fn test_get_request_to_wire() {
        let req = HttpRequest::new(Method::Get, "/index.html");
        assert_eq!(&req.to_wire()[..], b"GET /index.html HTTP/1.1\r\n\r\n");
    }

    #[test]
    fn test_post_request_to_wire() {
        let req = HttpRequest::builder()
            .method(Method::Post)
            .target("/new.txt")
            .header("Content-Length", "4")
            .body(b"data".to_vec())
            .build();

        assert_eq!(
            &req.to_wire()[..],
            b"POST /new.txt HTTP/1.1\r\nContent-Length: 4\r\n\r\ndata"
        );
    }

    #[test]
    fn test_bodiless_response_to_wire() {
        let resp = HttpResponse::new(Status::NOT_FOUND);
        assert_eq!(&resp.to_wire()[..], b"HTTP/1.1 404 Not Found\r\n\r\n");
    }

    #[test]
    fn test_response_with_body_to_wire() {
        let resp = HttpResponse::builder()
            .status(Status::OK)
            .body(b"hi".to_vec())
            .build();

        assert_eq!(&resp.to_wire()[..], b"HTTP/1.1 200 OK\r\n\r\nhi");
    }
}

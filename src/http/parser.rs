//! HTTP message parsing
//!
//! Both parsers are push-based: bytes are fed in as they arrive from the
//! connection, and the parser reports a complete message once it has one.
//! End-of-stream is signalled separately through `finish`, which is where
//! short reads and truncated header sections surface as errors.

use super::{Error, Headers, HttpRequest, HttpResponse, Method, Result, Status, Version, MAX_LINE_LEN};
use bytes::{Buf, BytesMut};

/// Find the end of the next line in a buffer
///
/// Returns `(line_len, consumed)`; the line excludes the LF and any CR
/// directly before it.
fn find_line(buf: &[u8]) -> Option<(usize, usize)> {
    let lf = buf.iter().position(|&b| b == b'\n')?;
    let line_len = if lf > 0 && buf[lf - 1] == b'\r' { lf - 1 } else { lf };
    Some((line_len, lf + 1))
}

/// Pop the next complete line off the front of the buffer
///
/// Fails once a line grows past `MAX_LINE_LEN`, whether or not its LF has
/// arrived yet.
fn take_line(buf: &mut BytesMut) -> Result<Option<String>> {
    let Some((line_len, consumed)) = find_line(buf) else {
        if buf.len() > MAX_LINE_LEN {
            return Err(line_too_long());
        }
        return Ok(None);
    };
    if line_len > MAX_LINE_LEN {
        return Err(line_too_long());
    }

    let line = String::from_utf8_lossy(&buf[..line_len]).into_owned();
    buf.advance(consumed);
    Ok(Some(line))
}

fn line_too_long() -> Error {
    Error::Parse(format!("Line exceeds {} bytes", MAX_LINE_LEN))
}

/// Parse HTTP request line
///
/// Format: METHOD SP TARGET SP VERSION
/// Example: GET /index.html HTTP/1.1
///
/// The method is classified first. Anything other than GET or POST fails
/// with `Error::UnsupportedMethod` before the target or version are looked
/// at, so `OPTIONS *` and `DELETE /x HTTP/2.0` are rejected the same way.
pub fn parse_request_line(line: &str) -> Result<(Method, String, Version)> {
    let mut parts = line.splitn(3, ' ');
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Err(Error::Parse(format!("Invalid request line: {:?}", line)));
    };
    if method.is_empty() || target.is_empty() {
        return Err(Error::Parse(format!("Invalid request line: {:?}", line)));
    }

    let method: Method = method.parse()?;
    if !target.starts_with('/') {
        return Err(Error::InvalidTarget(target.to_string()));
    }
    let Some(version) = parts.next() else {
        return Err(Error::Parse(format!("Missing version in request line: {:?}", line)));
    };

    Ok((method, target.to_string(), version.parse()?))
}

/// Parse HTTP response status line
///
/// Format: VERSION SP CODE SP REASON
/// Example: HTTP/1.1 404 Not Found
pub fn parse_status_line(line: &str) -> Result<(Version, Status, String)> {
    let Some((version, rest)) = line.split_once(' ') else {
        return Err(Error::Parse(format!("Invalid status line: {:?}", line)));
    };

    let version: Version = version.parse()?;
    let (code, reason) = match rest.split_once(' ') {
        Some((code, reason)) => (code, Some(reason)),
        None => (rest, None),
    };

    let status_code = code
        .parse::<u16>()
        .map_err(|_| Error::Parse(format!("Invalid status code: {}", code)))?;
    let status = Status::new(status_code)?;
    let reason = reason
        .map(str::to_string)
        .unwrap_or_else(|| status.reason_phrase().to_string());

    Ok((version, status, reason))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ParserState {
    StartLine,
    Headers,
    Body,
    Complete,
}

/// HTTP request parser
///
/// Reads exactly one request: the request line, the header section up to
/// the blank line, and for POST exactly `Content-Length` raw bytes. Bytes
/// after the request are left in the buffer and ignored.
pub struct RequestParser {
    state: ParserState,
    buffer: BytesMut,
    method: Option<Method>,
    target: Option<String>,
    version: Option<Version>,
    headers: Headers,
    content_length: usize,
}

impl RequestParser {
    /// Create a new request parser
    pub fn new() -> Self {
        RequestParser {
            state: ParserState::StartLine,
            buffer: BytesMut::with_capacity(4096),
            method: None,
            target: None,
            version: None,
            headers: Headers::new(),
            content_length: 0,
        }
    }

    /// Feed data to the parser
    ///
    /// Returns Ok(Some(request)) when a complete request is parsed,
    /// Ok(None) if more data is needed, or Err on parse error. A request
    /// with a method other than GET or POST fails with
    /// `Error::UnsupportedMethod` as soon as its request line is read.
    pub fn parse(&mut self, data: &[u8]) -> Result<Option<HttpRequest>> {
        self.buffer.extend_from_slice(data);

        loop {
            match self.state {
                ParserState::StartLine => {
                    let Some(line) = take_line(&mut self.buffer)? else {
                        return Ok(None);
                    };
                    let (method, target, version) = match parse_request_line(&line) {
                        Ok(parts) => parts,
                        Err(err) => {
                            self.state = ParserState::Complete;
                            return Err(err);
                        }
                    };
                    self.method = Some(method);
                    self.target = Some(target);
                    self.version = Some(version);
                    self.state = ParserState::Headers;
                }
                ParserState::Headers => {
                    let Some(line) = take_line(&mut self.buffer)? else {
                        return Ok(None);
                    };
                    if line.is_empty() {
                        if let Some(request) = self.end_of_headers()? {
                            return Ok(Some(request));
                        }
                        continue;
                    }
                    self.header_line(&line)?;
                }
                ParserState::Body => {
                    if self.buffer.len() < self.content_length {
                        return Ok(None);
                    }
                    let body = self.buffer.split_to(self.content_length).to_vec();
                    self.state = ParserState::Complete;
                    return Ok(Some(self.build(Method::Post, Some(body))));
                }
                ParserState::Complete => return Ok(None),
            }
        }
    }

    /// Record one header line
    ///
    /// POST needs its `Content-Length`, so a malformed line fails there.
    /// GET reads no header values and skips lines it cannot split.
    fn header_line(&mut self, line: &str) -> Result<()> {
        match Headers::parse_header_line(line) {
            Ok((name, value)) => self.headers.insert(name, value),
            Err(err) if self.method == Some(Method::Post) => return Err(err),
            Err(err) => tracing::debug!(error = %err, "Skipping malformed header line"),
        }
        Ok(())
    }

    /// Decide what follows the header section
    fn end_of_headers(&mut self) -> Result<Option<HttpRequest>> {
        let method = self
            .method
            .ok_or_else(|| Error::Parse("Header section without a request line".to_string()))?;
        match method {
            Method::Get => {
                self.state = ParserState::Complete;
                Ok(Some(self.build(Method::Get, None)))
            }
            Method::Post => {
                self.content_length = self
                    .headers
                    .content_length()?
                    .ok_or(Error::MissingContentLength)?;
                self.state = ParserState::Body;
                Ok(None)
            }
        }
    }

    /// Signal end-of-stream
    ///
    /// Fails unless a complete request has already been returned.
    pub fn finish(&self) -> Result<()> {
        match self.state {
            ParserState::Complete => Ok(()),
            ParserState::StartLine if self.buffer.is_empty() => Err(Error::ConnectionClosed),
            ParserState::StartLine | ParserState::Headers => Err(Error::Incomplete),
            ParserState::Body => Err(Error::ShortBody {
                expected: self.content_length,
                received: self.buffer.len(),
            }),
        }
    }

    /// Whether a request (or a method rejection) has been produced
    pub fn is_complete(&self) -> bool {
        self.state == ParserState::Complete
    }

    fn build(&mut self, method: Method, body: Option<Vec<u8>>) -> HttpRequest {
        let mut builder = HttpRequest::builder()
            .method(method)
            .target(self.target.take().unwrap_or_default())
            .version(self.version.unwrap_or_default())
            .headers(std::mem::take(&mut self.headers));
        if let Some(body) = body {
            builder = builder.body(body);
        }
        builder.build()
    }
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP response parser
///
/// The body is bounded by `Content-Length` when the response carries one;
/// otherwise it is everything up to end-of-stream.
pub struct ResponseParser {
    state: ParserState,
    buffer: BytesMut,
    version: Option<Version>,
    status: Option<Status>,
    reason: Option<String>,
    headers: Headers,
    content_length: Option<usize>,
}

impl ResponseParser {
    /// Create a new response parser
    pub fn new() -> Self {
        ResponseParser {
            state: ParserState::StartLine,
            buffer: BytesMut::with_capacity(4096),
            version: None,
            status: None,
            reason: None,
            headers: Headers::new(),
            content_length: None,
        }
    }

    /// Feed data to the parser
    ///
    /// Returns Ok(Some(response)) only for length-framed responses; an
    /// unframed body completes in `finish`.
    pub fn parse(&mut self, data: &[u8]) -> Result<Option<HttpResponse>> {
        self.buffer.extend_from_slice(data);

        loop {
            match self.state {
                ParserState::StartLine => {
                    let Some(line) = take_line(&mut self.buffer)? else {
                        return Ok(None);
                    };
                    let (version, status, reason) = parse_status_line(&line)?;
                    self.version = Some(version);
                    self.status = Some(status);
                    self.reason = Some(reason);
                    self.state = ParserState::Headers;
                }
                ParserState::Headers => {
                    let Some(line) = take_line(&mut self.buffer)? else {
                        return Ok(None);
                    };
                    if line.is_empty() {
                        self.content_length = self.headers.content_length()?;
                        self.state = ParserState::Body;
                        continue;
                    }
                    let (name, value) = Headers::parse_header_line(&line)?;
                    self.headers.insert(name, value);
                }
                ParserState::Body => {
                    let Some(length) = self.content_length else {
                        return Ok(None);
                    };
                    if self.buffer.len() < length {
                        return Ok(None);
                    }
                    let body = self.buffer.split_to(length).to_vec();
                    self.state = ParserState::Complete;
                    return Ok(Some(self.build(body)));
                }
                ParserState::Complete => return Ok(None),
            }
        }
    }

    /// Signal end-of-stream and produce the response read so far
    ///
    /// Without a `Content-Length` the body is whatever remained in the
    /// stream.
    pub fn finish(&mut self) -> Result<HttpResponse> {
        match self.state {
            ParserState::Body => match self.content_length {
                Some(expected) => Err(Error::ShortBody {
                    expected,
                    received: self.buffer.len(),
                }),
                None => {
                    let body = self.buffer.split().to_vec();
                    self.state = ParserState::Complete;
                    Ok(self.build(body))
                }
            },
            ParserState::StartLine if self.buffer.is_empty() => Err(Error::ConnectionClosed),
            ParserState::StartLine | ParserState::Headers => Err(Error::Incomplete),
            ParserState::Complete => Err(Error::Parse("Response already consumed".to_string())),
        }
    }

    /// Reset the parser for reuse
    pub fn reset(&mut self) {
        self.state = ParserState::StartLine;
        self.buffer.clear();
        self.version = None;
        self.status = None;
        self.reason = None;
        self.headers.clear();
        self.content_length = None;
    }

    fn build(&mut self, body: Vec<u8>) -> HttpResponse {
        let status = self.status.unwrap_or(Status::OK);
        let mut builder = HttpResponse::builder()
            .version(self.version.unwrap_or_default())
            .status(status)
            .reason(
                self.reason
                    .take()
                    .unwrap_or_else(|| status.reason_phrase().to_string()),
            )
            .headers(std::mem::take(&mut self.headers));
        if !body.is_empty() {
            builder = builder.body(body);
        }
        builder.build()
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

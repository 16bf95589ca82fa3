//! HTTP server protocol driver
//!
//! One `HttpServer` handles exactly one connection: it reads a single
//! request, dispatches it against the file store, writes the response and
//! closes the connection, whether the exchange succeeded or not.

use super::{
    Error, HttpRequest, HttpResponse, HttpSession, Method, RequestParser, Result, SessionOps,
    Status, DEFAULT_DOCUMENT,
};
use crate::store::{FileStore, StoreError};
use std::time::Duration;

/// Server side of a single exchange
pub struct HttpServer<S: SessionOps> {
    session: HttpSession<S>,
    parser: RequestParser,
    store: FileStore,
    default_document: String,
}

impl<S: SessionOps> HttpServer<S> {
    /// Create a server for one connection, serving from `store`
    pub fn new(session: S, store: FileStore) -> Self {
        HttpServer {
            session: HttpSession::new(session),
            parser: RequestParser::new(),
            store,
            default_document: DEFAULT_DOCUMENT.to_string(),
        }
    }

    /// Document served when a GET targets "/"
    pub fn with_default_document(mut self, name: impl Into<String>) -> Self {
        self.default_document = name.into();
        self
    }

    /// Set the read timeout
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.session.set_timeout(timeout);
    }

    /// Run the whole exchange and close the connection
    ///
    /// Returns the status that was sent. Protocol failures and connection
    /// failures are returned as errors after the connection is closed; in
    /// that case no response was written.
    pub fn serve(mut self) -> Result<Status> {
        let result = self.exchange();

        if let Err(e) = self.close() {
            tracing::debug!(error = %e, "Error closing connection");
        }

        result
    }

    fn exchange(&mut self) -> Result<Status> {
        let response = match self.receive_request() {
            Ok(request) => self.dispatch(&request)?,
            Err(Error::UnsupportedMethod(method)) => {
                tracing::info!(%method, "Method not allowed");
                HttpResponse::new(Status::METHOD_NOT_ALLOWED)
            }
            Err(e) => return Err(e),
        };

        self.send_response(&response)?;
        Ok(response.status())
    }

    /// Receive exactly one request
    ///
    /// Fails with `Error::UnsupportedMethod` for methods other than GET and
    /// POST as soon as the request line is read. Their target, version and
    /// header lines are never checked.
    pub fn receive_request(&mut self) -> Result<HttpRequest> {
        self.parser = RequestParser::new();
        let mut temp = [0u8; 4096];

        loop {
            let n = self.session.read(&mut temp)?;

            if n == 0 {
                self.parser.finish()?;
                return Err(Error::ConnectionClosed);
            }

            if let Some(request) = self.parser.parse(&temp[..n])? {
                tracing::info!(
                    method = %request.method(),
                    target = request.target(),
                    "Request received"
                );
                return Ok(request);
            }
        }
    }

    /// Decide the response for a request
    ///
    /// Only I/O failures of the file store surface as errors; absent and
    /// conflicting resources are ordinary responses.
    pub fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let response = match request.method() {
            Method::Get => self.do_get(request.target())?,
            Method::Post => self.do_post(request.target(), request.body().unwrap_or_default())?,
        };

        tracing::info!(
            method = %request.method(),
            target = request.target(),
            status = %response.status(),
            "Request dispatched"
        );
        Ok(response)
    }

    fn do_get(&self, target: &str) -> Result<HttpResponse> {
        let target = if target == "/" {
            format!("/{}", self.default_document)
        } else {
            target.to_string()
        };

        match self.store.read(&target) {
            Ok(contents) => Ok(HttpResponse::builder()
                .status(Status::OK)
                .body(contents)
                .build()),
            Err(StoreError::NotFound(_)) | Err(StoreError::OutsideRoot(_)) => {
                Ok(HttpResponse::new(Status::NOT_FOUND))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn do_post(&self, target: &str, body: &[u8]) -> Result<HttpResponse> {
        match self.store.create(target, body) {
            Ok(()) => Ok(HttpResponse::new(Status::CREATED)),
            Err(StoreError::AlreadyExists(_)) => Ok(HttpResponse::new(Status::CONFLICT)),
            Err(StoreError::NotFound(_)) | Err(StoreError::OutsideRoot(_)) => {
                Ok(HttpResponse::new(Status::NOT_FOUND))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Send an HTTP response
    pub fn send_response(&mut self, response: &HttpResponse) -> Result<()> {
        self.session.write_all(&response.to_wire())
    }

    /// Close the connection
    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }
}

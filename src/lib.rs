//! barehttp - a minimal HTTP/1.1 file server and client
//!
//! This crate provides the protocol engine (message framing, request
//! parsing, client and server drivers) together with the file store and
//! the listener that the two binaries are built from.

pub mod config;
pub mod http;
pub mod net;
pub mod store;

//! Gemini protocol implementation.
//!
//! A Gemini exchange is one request line from the client, one status line
//! from the server, an optional body, and then the connection is closed.
//! There are no headers, no keep-alive and no pipelining.
//!
//! # Architecture
//!
//! - **`connection`**: per-connection state machine
//! - **`parser`**: turns the request line into a [`request::Request`]
//! - **`request`**: the parsed resource identifier
//! - **`response`**: status codes and the response type with its builder
//! - **`writer`**: serializes responses and writes them to the client
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for one line (closed early → Closed)
//!        └──────┬──────┘
//!               ▼
//!        ┌──────────────────┐
//!        │   Validating     │ ← Parse, reject `..` and foreign hosts (59)
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Capsule registry, then static files
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← Status line + body, flush
//!        └──────┬───────────┘
//!               ▼
//!        ┌──────────────────┐
//!        │     Closed       │ ← Always shut down the stream
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gemlet::gemini::connection::Connection;
//!
//! let (client, server) = tokio::io::duplex(4096);
//! tokio::spawn(async move {
//!     let mut conn = Connection::new(server, Arc::new(dispatcher));
//!     if let Err(e) = conn.run().await {
//!         eprintln!("Connection error: {}", e);
//!     }
//! });
//! ```

pub mod request;
pub mod response;
pub mod parser;
pub mod connection;
pub mod writer;

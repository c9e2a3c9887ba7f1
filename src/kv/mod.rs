//! Key-value snapshot service.
//!
//! A tiny HTTP protocol for storing opaque string values under keys:
//!
//! - `GET /register` returns a fresh API token as plain text
//! - `POST /save/{key}?API_TOKEN=..` stores the request body
//! - `GET /load/{key}?API_TOKEN=..` returns the stored body, 404 if absent
//!
//! [`KvClient`] speaks it; [`server::router`] serves it from memory.

pub mod client;
pub mod server;

pub use client::{ClientError, KvClient};

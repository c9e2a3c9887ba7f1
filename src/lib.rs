//! # taskboard
//!
//! Servers and front-ends around [`taskboard_core`]: the REST API, the
//! interactive menu, snapshot persistence to a CSV file or a key-value
//! server, and that key-value server itself.

pub mod api;
pub mod board;
pub mod config;
pub mod kv;
pub mod menu;
pub mod persist;

pub use board::Board;

//! # Agricheck
//!
//! Application layer around `agricheck-core`: configuration, the SPARQL
//! client, page rendering, the HTTP server and the CLI.
//!
//! The binary in `main.rs` only sets up logging and dispatches to [`cli`].

pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod render;
pub mod source;

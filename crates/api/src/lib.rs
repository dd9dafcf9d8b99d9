//! HTTP server for the item search service.
//!
//! Exposes config, state, error handling, handlers and routes so the
//! integration tests and the binary entrypoint share them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod page;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;

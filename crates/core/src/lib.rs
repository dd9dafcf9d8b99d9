//! Domain logic for the item search service.
//!
//! Everything here is synchronous and database-free: configuration loading,
//! CSV ingestion, validation, search helpers, and backup management. The
//! `isdb-db` and `isdb-api` crates build on top of it.

pub mod backup;
pub mod coercion;
pub mod config;
pub mod error;
pub mod hashing;
pub mod ingest;
pub mod item;
pub mod search;
pub mod types;
pub mod validation;

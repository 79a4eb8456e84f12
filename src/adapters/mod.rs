//! Adapters: SQLite persistence, read-through caches and the HTTP API.

pub mod cache;
pub mod http;
pub mod sqlite;

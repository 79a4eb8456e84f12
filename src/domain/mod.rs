//! Domain layer for salesdesk
//!
//! Business models, repository ports and domain errors. Nothing in here
//! knows about HTTP or SQL.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};

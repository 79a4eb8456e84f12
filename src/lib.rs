//! Salesdesk - sales, inventory and client management backend
//!
//! A REST API over SQLite for clients, companies, products, invoices,
//! payments and GPS device tracking.
//!
//! # Architecture
//!
//! The crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and repository ports
//! - **Service Layer** (`services`): validation and business rules
//! - **Adapters** (`adapters`): SQLite repositories, read-through caches, HTTP API
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use adapters::http::{build_router, AppState, HttpConfig, HttpServer};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::Config;
pub use infrastructure::config::{ConfigError, ConfigLoader};

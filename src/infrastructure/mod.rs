//! Infrastructure layer module
//!
//! Configuration loading and logging setup used by the binary.

pub mod config;
pub mod logging;

//! Command-line interface.

pub mod commands;
pub mod types;

pub use types::{Cli, Commands, MigrateArgs, ServeArgs};

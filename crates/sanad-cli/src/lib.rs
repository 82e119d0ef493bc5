//! Sanad CLI library.
//!
//! This library provides the core functionality for the Sanad command-line interface,
//! including configuration management, command execution, audit logging and output
//! formatting.

pub mod audit;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use audit::JsonlAuditSink;
pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;

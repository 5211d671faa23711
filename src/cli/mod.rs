//! CLI module for the export-config-cli binary

pub mod commands;
pub mod error;
pub mod output;

pub use error::CliError;

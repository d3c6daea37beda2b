//! Focus tracker CLI library.
//!
//! This crate wires the core aggregation logic and the storage layer into a
//! running service: the polling tracker loop, the HTTP surface, and the
//! reporting/export commands.

mod cli;
pub mod commands;
mod config;
pub mod sensors;
pub mod server;
pub mod tracker;

pub use cli::{Cli, Commands, ExportFormat};
pub use config::Config;

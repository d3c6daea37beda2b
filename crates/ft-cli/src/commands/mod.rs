//! CLI subcommand implementations.

pub mod export;
pub mod report;
pub mod run;
pub mod trim;

//! htree CLI - terminal driver for the ingestion engine
//!
//! Subcommands:
//! - `run`: stream a fresh analysis from the agent
//! - `replay`: push a recorded body through the same pipeline offline
//! - `restart`: edit a node of a saved tree and resume from it
//! - `layout`: lay out a saved tree without any stream

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod output;

pub use config::CliConfig;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

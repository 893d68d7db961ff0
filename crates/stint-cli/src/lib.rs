//! Focus-session tracker CLI library.
//!
//! This crate provides the command-line interface for stint.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, TodoAction};
pub use config::Config;

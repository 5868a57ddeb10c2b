//! Command-line interface components
//!
//! Argument parsing and the handlers behind each subcommand.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands, GlobalArgs, ServeArgs};
pub use commands::{handle_fetch, handle_serve};

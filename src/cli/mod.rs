//! CLI module for conformist
//!
//! - Argument parsing (`args`)
//! - Runtime setup (`setup`)

pub mod args;
pub mod setup;

pub use args::{parse_args, Cli, Commands};
pub use setup::{exit_code_for, init_logging, SETUP_EXIT_CODE};

//! Command implementations behind the `conformist` binary.
//!
//! - **check**: evaluate a tree, print the report, optionally fix
//! - **rules**: print the resolved rule catalog
//! - **init**: write a starter configuration file

pub mod check;
pub mod init;
pub mod rules;

pub use check::{run_check, CheckConfig};
pub use init::init_config;
pub use rules::{list_rules, RulesConfig};

//! Convention compliance checks for Python project trees.
//!
//! A run loads a [`tree::ProjectTree`], evaluates the resolved rule catalog
//! over it and aggregates the findings into a [`report::Report`]. In fix modes
//! the report also carries the [`fix::FixPlan`] that was applied or would be.

pub mod cancel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod errors;
pub mod fix;
pub mod formatting;
pub mod matchers;
pub mod output;
pub mod patterns;
pub mod report;
pub mod rules;
pub mod run;
pub mod tree;

pub use crate::cancel::CancellationToken;
pub use crate::config::{load_config, ConformConfig};
pub use crate::core::{Category, Finding, FindingKind, FixDescriptor, Severity};
pub use crate::errors::{Error, Result};
pub use crate::fix::{FixPlan, Mutation, Outcome};
pub use crate::report::{Report, Status};
pub use crate::rules::{Catalog, ResolvedCatalog, RuleRegistry};
pub use crate::run::{Mode, RunContext, RunOptions};

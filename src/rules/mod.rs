//! Rule catalog, evaluator registry and the engine that runs them.

pub mod catalog;
mod checks;
pub mod engine;
pub mod registry;

pub use catalog::{Catalog, ResolvedCatalog, ResolvedRule, RuleDescriptor, RuleScope, CATALOG_VERSION};
pub use engine::Engine;
pub use registry::{Evaluator, RuleContext, RuleRegistry};

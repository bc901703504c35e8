//! Shipped evaluators, one module per category.

mod configuration;
mod data_model;
mod docstrings;
mod exceptions;
mod imports;
mod logging;
mod naming;
mod structure;
mod typing;

pub(crate) use structure::FILE_UNREADABLE;

use super::registry::RuleRegistry;

pub(crate) fn register_all(registry: &mut RuleRegistry) {
    structure::register(registry);
    typing::register(registry);
    data_model::register(registry);
    imports::register(registry);
    naming::register(registry);
    docstrings::register(registry);
    logging::register(registry);
    exceptions::register(registry);
    configuration::register(registry);
}

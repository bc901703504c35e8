use crate::core::Finding;
use crate::rules::registry::{RuleContext, RuleRegistry};

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register_fn("logging.print-call", print_call);
    registry.register_fn("logging.root-logger", root_logger);
    registry.register_fn("logging.eager-format", eager_format);
}

fn print_call(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    Ok(facts
        .logging
        .print_calls
        .iter()
        .map(|line| ctx.finding(Some(*line), "print() call; use a module logger"))
        .collect())
}

fn root_logger(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    Ok(facts
        .logging
        .root_logger_calls
        .iter()
        .map(|call| {
            ctx.finding(
                Some(call.line),
                format!(
                    "logging.{}() logs through the root logger; use logging.getLogger(__name__)",
                    call.method
                ),
            )
        })
        .collect())
}

fn eager_format(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    Ok(facts
        .logging
        .eager_format_calls
        .iter()
        .map(|call| {
            ctx.finding(
                Some(call.line),
                format!(
                    "{}() message is formatted eagerly; pass arguments for lazy %-formatting",
                    call.method
                ),
            )
        })
        .collect())
}

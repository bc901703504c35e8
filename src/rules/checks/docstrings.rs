use crate::core::Finding;
use crate::matchers::docstrings::DocTarget;
use crate::rules::registry::{RuleContext, RuleRegistry};

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register_fn("docstrings.missing", missing);
    registry.register_fn("docstrings.sections", sections);
}

fn target_name(target: DocTarget) -> &'static str {
    match target {
        DocTarget::Function => "function",
        DocTarget::Class => "class",
    }
}

fn missing(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    Ok(facts
        .docstrings
        .entries
        .iter()
        .filter(|e| e.public && !e.exempt && e.docstring_line.is_none())
        .map(|e| {
            ctx.finding(
                Some(e.line),
                format!("public {} '{}' has no docstring", target_name(e.target), e.name),
            )
        })
        .collect())
}

/// One finding per documented public function, listing every absent section.
fn sections(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    let mut findings = Vec::new();
    for entry in facts.docstrings.entries.iter().filter(|e| {
        e.target == DocTarget::Function && e.public && !e.exempt && e.docstring_line.is_some()
    }) {
        let absent = entry.required.missing_from(&entry.present);
        if absent.is_empty() {
            continue;
        }
        findings.push(ctx.finding(
            Some(entry.line),
            format!(
                "docstring of '{}' is missing sections: {}",
                entry.name,
                absent.join(", ")
            ),
        ));
    }
    Ok(findings)
}

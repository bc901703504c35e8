use crate::core::{Finding, FixDescriptor};
use crate::matchers::{ImportBucket, ImportFacts};
use crate::rules::registry::{RuleContext, RuleRegistry};

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register_fn("imports.order", order);
    registry.register_fn("imports.unused", unused);
    registry.register_fn("imports.wildcard", wildcard);
}

/// Whether re-sorting the leading block leaves no order violation behind:
/// every bucket in it may move, and later top-level imports are already in
/// order and not earlier than anything in the block.
fn reorder_resolves(facts: &ImportFacts, movable: &[ImportBucket]) -> bool {
    let leading = facts.leading_buckets();
    if leading.iter().any(|b| !movable.contains(b)) {
        return false;
    }
    let records: Vec<_> = facts.records.iter().filter(|r| r.leading).collect();
    if records.windows(2).any(|w| w[1].line <= w[0].end_line) {
        return false;
    }
    let mut floor = leading.iter().next_back().copied();
    for record in facts.records.iter().filter(|r| r.top_level && !r.leading) {
        if floor.is_some_and(|f| record.bucket < f) {
            return false;
        }
        floor = Some(record.bucket);
    }
    true
}

fn order(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    let file = ctx.file()?;
    let Some(violation) = &facts.imports.first_order_violation else {
        return Ok(Vec::new());
    };

    let mut message = format!(
        "{} import '{}' comes after {} imports",
        violation.bucket, violation.module, violation.after
    );
    if facts.imports.order_violations > 1 {
        message.push_str(&format!(
            " ({} misplaced imports in this file)",
            facts.imports.order_violations
        ));
    }
    let mut finding = ctx.finding(Some(violation.line), message);
    if violation.in_leading_block
        && reorder_resolves(&facts.imports, &ctx.catalog.fix.order_insensitive_buckets)
    {
        finding = finding.with_fix(FixDescriptor::ReorderImports {
            path: file.path().to_string(),
        });
    }
    Ok(vec![finding])
}

fn unused(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    Ok(facts
        .imports
        .unused
        .iter()
        .map(|u| {
            ctx.finding(
                Some(u.line),
                format!("'{}' imported from '{}' is never used", u.name, u.module),
            )
        })
        .collect())
}

fn wildcard(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    Ok(facts
        .imports
        .wildcards()
        .map(|r| ctx.finding(Some(r.line), format!("wildcard import from '{}'", r.module)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::harness::run_rule;
    use crate::core::FixDescriptor;
    use indoc::indoc;

    #[test]
    fn one_finding_per_file_with_a_fix() {
        let findings = run_rule(
            "imports.order",
            &[
                ("src/app/__init__.py", ""),
                (
                    "src/app/service.py",
                    indoc! {r#"
                        from app import models
                        import os
                        import sys
                    "#},
                ),
            ],
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(2));
        assert_eq!(
            findings[0].fix,
            Some(FixDescriptor::ReorderImports {
                path: "src/app/service.py".into()
            })
        );
        assert!(findings[0].message.contains("2 misplaced imports"));
    }

    #[test]
    fn violations_outside_the_leading_block_carry_no_fix() {
        let findings = run_rule(
            "imports.order",
            &[(
                "pkg/late.py",
                indoc! {r#"
                    import requests

                    VALUE = 1

                    import os
                "#},
            )],
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].fix, None);
    }

    #[test]
    fn imports_sharing_a_line_carry_no_fix() {
        let findings = run_rule(
            "imports.order",
            &[("pkg/joined.py", "import requests; import os\nx = (requests, os)\n")],
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(1));
        assert_eq!(findings[0].fix, None);
    }

    #[test]
    fn unused_and_wildcard_imports() {
        let source = "import os\nfrom json import *\n";
        assert_eq!(run_rule("imports.unused", &[("pkg/mod.py", source)]).len(), 1);
        assert_eq!(run_rule("imports.wildcard", &[("pkg/mod.py", source)]).len(), 1);
        assert!(run_rule("imports.unused", &[("pkg/__init__.py", source)]).is_empty());
    }
}

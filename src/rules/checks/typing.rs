use crate::core::Finding;
use crate::rules::registry::{RuleContext, RuleRegistry};

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register_fn("typing.missing-annotation", missing_annotation);
    registry.register_fn("typing.deprecated-spelling", deprecated_spelling);
}

fn missing_annotation(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    Ok(facts
        .annotations
        .functions
        .iter()
        .filter(|f| !f.is_complete())
        .map(|f| {
            let mut missing: Vec<String> = f
                .missing_params
                .iter()
                .map(|p| format!("parameter '{p}'"))
                .collect();
            if f.missing_return {
                missing.push("return type".to_string());
            }
            ctx.finding(
                Some(f.line),
                format!("function '{}' is missing annotations: {}", f.name, missing.join(", ")),
            )
        })
        .collect())
}

fn deprecated_spelling(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    Ok(facts
        .annotations
        .deprecated
        .iter()
        .map(|hit| {
            ctx.finding(
                Some(hit.line),
                format!("'{}[...]' is deprecated; use {}", hit.spelling, hit.replacement),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::harness::run_rule;
    use indoc::indoc;

    const SOURCE: &str = indoc! {r#"
        from typing import Optional

        def find(name, limit: int) -> Optional[str]:
            return None

        def ok(value: str) -> None:
            pass
    "#};

    #[test]
    fn reports_each_incomplete_function_once() {
        let findings = run_rule("typing.missing-annotation", &[("pkg/lookup.py", SOURCE)]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(3));
        assert!(findings[0].message.contains("parameter 'name'"));
    }

    #[test]
    fn suggests_modern_spellings() {
        let findings = run_rule("typing.deprecated-spelling", &[("pkg/lookup.py", SOURCE)]);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("X | None"));
    }

    #[test]
    fn test_files_are_excluded_from_annotation_checks() {
        let findings = run_rule("typing.missing-annotation", &[("tests/test_lookup.py", SOURCE)]);
        assert!(findings.is_empty());
    }
}

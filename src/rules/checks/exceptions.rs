use glob::{MatchOptions, Pattern};

use crate::core::Finding;
use crate::errors::Error;
use crate::rules::registry::{RuleContext, RuleRegistry};

/// Domain globs match one directory level per `*`.
const DOMAIN_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register_fn("exceptions.missing-file", missing_file);
    registry.register_fn("exceptions.base-error", base_error);
    registry.register_fn("exceptions.hierarchy", hierarchy);
    registry.register_fn("exceptions.bare-except", bare_except);
}

fn missing_file(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let domains = ctx
        .config
        .project
        .domain_globs
        .iter()
        .map(|g| Pattern::new(g).map_err(|e| Error::invalid_pattern(g, e)))
        .collect::<Result<Vec<_>, _>>()?;
    let file_name = &ctx.profile.markers.exceptions_file;

    Ok(ctx
        .tree
        .source_dirs()
        .into_iter()
        .filter(|dir| domains.iter().any(|p| p.matches_with(dir, DOMAIN_MATCH)))
        .filter(|dir| !ctx.tree.path_exists(&format!("{dir}/{file_name}")))
        .map(|dir| {
            ctx.finding_at(
                dir,
                None,
                format!("domain '{dir}' has no '{file_name}' declaring its errors"),
            )
        })
        .collect())
}

fn base_error(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    let exceptions = &facts.exceptions;
    if !exceptions.is_declaration_file {
        return Ok(Vec::new());
    }
    let suffix = &ctx.profile.markers.error_suffix;
    let roots = ctx.profile.markers.root_error_types.join(" or ");
    let candidates: Vec<_> = exceptions.base_candidates().collect();

    let mut findings = Vec::new();
    match candidates.as_slice() {
        [] => findings.push(ctx.finding(
            None,
            format!("no domain base error: declare exactly one class extending {roots}"),
        )),
        [_] => {}
        [_, second, ..] => {
            let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
            findings.push(ctx.finding(
                Some(second.line),
                format!(
                    "{} classes extend {roots} directly ({}); keep one domain base",
                    candidates.len(),
                    names.join(", ")
                ),
            ));
        }
    }
    for candidate in candidates.iter().filter(|c| !c.name.ends_with(suffix.as_str())) {
        findings.push(ctx.finding(
            Some(candidate.line),
            format!("base error '{}' does not end in '{suffix}'", candidate.name),
        ));
    }
    Ok(findings)
}

fn hierarchy(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    let exceptions = &facts.exceptions;
    let suffix = &ctx.profile.markers.error_suffix;
    let rooted = exceptions.rooted_names();

    let mut findings = Vec::new();
    for class in exceptions.derived() {
        if !rooted.contains(class.name.as_str()) {
            findings.push(ctx.finding(
                Some(class.line),
                format!("'{}' does not extend the domain base error", class.name),
            ));
        }
        if !class.name.ends_with(suffix.as_str()) {
            findings.push(ctx.finding(
                Some(class.line),
                format!("error class '{}' does not end in '{suffix}'", class.name),
            ));
        }
    }
    Ok(findings)
}

fn bare_except(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    Ok(facts
        .exceptions
        .bare_excepts
        .iter()
        .map(|line| ctx.finding(Some(*line), "bare 'except:' catches everything; name the error"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::harness::run_rule;
    use indoc::indoc;

    const ERRORS: &str = indoc! {r#"
        class BillingError(Exception):
            pass

        class CardDeclinedError(BillingError):
            pass

        class Timeout(BillingError):
            pass

        class LedgerError(ValueError):
            pass
    "#};

    #[test]
    fn domains_without_an_exceptions_file_are_reported() {
        let findings = run_rule(
            "exceptions.missing-file",
            &[
                ("src/billing/exceptions.py", ERRORS),
                ("src/billing/api/routes.py", ""),
                ("src/shipping/service.py", ""),
            ],
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].path, "src/shipping");
    }

    #[test]
    fn single_base_passes() {
        let findings = run_rule("exceptions.base-error", &[("src/billing/exceptions.py", ERRORS)]);
        assert!(findings.is_empty());
    }

    #[test]
    fn two_bases_are_one_finding() {
        let source = "class AError(Exception):\n    pass\n\nclass BError(Exception):\n    pass\n";
        let findings = run_rule("exceptions.base-error", &[("src/a/exceptions.py", source)]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, Some(4));
    }

    #[test]
    fn derived_errors_need_base_and_suffix() {
        let findings = run_rule("exceptions.hierarchy", &[("src/billing/exceptions.py", ERRORS)]);
        let mut lines: Vec<_> = findings.iter().map(|f| f.line).collect();
        lines.sort();
        assert_eq!(lines, vec![Some(7), Some(10)]);
    }

    #[test]
    fn bare_except_anywhere() {
        let source = "try:\n    run()\nexcept:\n    pass\n";
        let findings = run_rule("exceptions.bare-except", &[("src/jobs/run.py", source)]);
        assert_eq!(findings[0].line, Some(3));
    }
}

use crate::core::Finding;
use crate::matchers::naming::classify;
use crate::matchers::NameKind;
use crate::rules::registry::{RuleContext, RuleRegistry};

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register_fn("naming.file", |ctx: &RuleContext<'_>| of_kind(ctx, NameKind::File));
    registry.register_fn("naming.directory", directory);
    registry.register_fn("naming.function", |ctx: &RuleContext<'_>| {
        of_kind(ctx, NameKind::Function)
    });
    registry.register_fn("naming.variable", |ctx: &RuleContext<'_>| {
        of_kind(ctx, NameKind::Variable)
    });
    registry.register_fn("naming.class", |ctx: &RuleContext<'_>| of_kind(ctx, NameKind::Class));
    registry.register_fn("naming.constant", |ctx: &RuleContext<'_>| {
        of_kind(ctx, NameKind::Constant)
    });
}

fn of_kind(ctx: &RuleContext<'_>, kind: NameKind) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    Ok(facts
        .naming
        .violations(kind)
        .map(|item| {
            ctx.finding(
                item.line,
                format!("{kind} name '{}' is not {}", item.name, kind.expected()),
            )
        })
        .collect())
}

fn directory(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let resolved = ctx.catalog.rule(&ctx.rule.id);
    let mut findings = Vec::new();
    for dir in ctx.tree.source_dirs() {
        if resolved.is_some_and(|r| !r.applies_to(dir)) {
            continue;
        }
        let name = dir.rsplit('/').next().unwrap_or(dir);
        if name.starts_with('.') {
            continue;
        }
        if let Some(item) = classify(name, NameKind::Directory, None).filter(|i| !i.conforms) {
            findings.push(ctx.finding_at(
                dir,
                None,
                format!("directory name '{}' is not {}", item.name, NameKind::Directory.expected()),
            ));
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::super::harness::run_rule;
    use indoc::indoc;

    const SOURCE: &str = indoc! {r#"
        from typing import Final

        MAX_RETRIES: Final = 3
        timeout: Final[int] = 5

        class order_line:
            pass

        def LoadOrders(path: str) -> None:
            BadLocal = 1
    "#};

    #[test]
    fn each_kind_reports_only_its_own_names() {
        let files = [("src/shop/orders.py", SOURCE)];
        let class = run_rule("naming.class", &files);
        assert_eq!(class.len(), 1);
        assert!(class[0].message.contains("'order_line'"));

        let function = run_rule("naming.function", &files);
        assert_eq!(function.len(), 1);
        assert_eq!(function[0].line, Some(9));

        let constant = run_rule("naming.constant", &files);
        assert_eq!(constant.len(), 1);
        assert!(constant[0].message.contains("'timeout'"));

        assert_eq!(run_rule("naming.variable", &files).len(), 1);
        assert!(run_rule("naming.file", &files).is_empty());
    }

    #[test]
    fn file_and_directory_names() {
        let files = [("src/Shop-Api/OrderService.py", "x = 1\n")];
        let file = run_rule("naming.file", &files);
        assert_eq!(file.len(), 1);
        assert_eq!(file[0].line, None);

        let dirs = run_rule("naming.directory", &files);
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].path, "src/Shop-Api");
    }

    #[test]
    fn dunder_files_are_exempt() {
        assert!(run_rule("naming.file", &[("pkg/__init__.py", "")]).is_empty());
    }
}

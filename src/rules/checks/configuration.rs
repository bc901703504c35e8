use crate::core::Finding;
use crate::matchers::LiteralKind;
use crate::rules::registry::{RuleContext, RuleRegistry};

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register_fn("configuration.connection-string", |ctx: &RuleContext<'_>| {
        literals(ctx, LiteralKind::ConnectionString)
    });
    registry.register_fn("configuration.static-config-load", |ctx: &RuleContext<'_>| {
        literals(ctx, LiteralKind::StaticConfigLoad)
    });
    registry.register_fn("configuration.hardcoded-secret", |ctx: &RuleContext<'_>| {
        literals(ctx, LiteralKind::HardcodedSecret)
    });
}

fn describe(kind: LiteralKind, subject: &str) -> String {
    match kind {
        LiteralKind::ConnectionString => {
            format!("hardcoded connection string '{subject}'; read it from the environment")
        }
        LiteralKind::StaticConfigLoad => {
            format!("configuration loaded from hardcoded path '{subject}'; inject the location")
        }
        LiteralKind::HardcodedSecret => {
            format!("'{subject}' is assigned a literal secret; read it from the environment")
        }
    }
}

fn literals(ctx: &RuleContext<'_>, kind: LiteralKind) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    Ok(facts
        .configuration
        .of_kind(kind)
        .map(|m| ctx.finding(Some(m.line), describe(kind, &m.subject)))
        .collect())
}

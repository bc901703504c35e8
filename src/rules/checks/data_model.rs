use crate::core::Finding;
use crate::rules::registry::{RuleContext, RuleRegistry};

pub(super) fn register(registry: &mut RuleRegistry) {
    registry.register_fn("data-model.expected-base", expected_base);
    registry.register_fn("data-model.deprecated-config", deprecated_config);
    registry.register_fn("data-model.deprecated-validator", deprecated_validator);
}

fn expected_base(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    let expected = ctx.profile.markers.model_bases.join(" or ");
    Ok(facts
        .data_model
        .plain_classes
        .iter()
        .map(|class| {
            ctx.finding(
                Some(class.line),
                format!("class '{}' in a model module does not extend {expected}", class.name),
            )
        })
        .collect())
}

fn deprecated_config(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    let modern = ctx.profile.markers.config_markers.join(" or ");
    Ok(facts
        .data_model
        .models
        .iter()
        .filter_map(|model| {
            model.deprecated_config_line.map(|line| {
                ctx.finding(
                    Some(line),
                    format!(
                        "model '{}' uses an inner Config class; declare {modern} instead",
                        model.name
                    ),
                )
            })
        })
        .collect())
}

fn deprecated_validator(ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
    let facts = ctx.facts()?;
    let modern = ctx.profile.markers.modern_validators.join(" or ");
    let modern = modern.as_str();
    Ok(facts
        .data_model
        .models
        .iter()
        .flat_map(|model| {
            model.deprecated_validators.iter().map(move |(decorator, line)| {
                ctx.finding(
                    Some(*line),
                    format!(
                        "model '{}' uses deprecated @{decorator}; use {modern}",
                        model.name
                    ),
                )
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::super::harness::run_rule;
    use indoc::indoc;

    const MODELS: &str = indoc! {r#"
        from pydantic import BaseModel, validator

        class Account(BaseModel):
            class Config:
                frozen = True

            @validator("owner")
            def owner_set(cls, v):
                return v

        class Ledger:
            pass
    "#};

    #[test]
    fn plain_classes_in_model_modules_need_the_base() {
        let findings = run_rule("data-model.expected-base", &[("src/bank/models.py", MODELS)]);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("'Ledger'"));

        let elsewhere = run_rule("data-model.expected-base", &[("src/bank/service.py", MODELS)]);
        assert!(elsewhere.is_empty());
    }

    #[test]
    fn deprecated_markers_are_reported_at_their_line() {
        let config = run_rule("data-model.deprecated-config", &[("src/bank/models.py", MODELS)]);
        assert_eq!(config.len(), 1);
        assert_eq!(config[0].line, Some(4));

        let validators =
            run_rule("data-model.deprecated-validator", &[("src/bank/models.py", MODELS)]);
        assert_eq!(validators.len(), 1);
        assert_eq!(validators[0].line, Some(8));
    }
}

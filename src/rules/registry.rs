//! Evaluators bound to rule descriptors by name.

use dashmap::DashMap;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::catalog::{ResolvedCatalog, RuleDescriptor, RuleScope};
use super::checks;
use crate::config::ConformConfig;
use crate::core::{Category, Finding};
use crate::errors::{Error, Result};
use crate::matchers::{FileFacts, MatcherProfile};
use crate::tree::{ProjectTree, SourceFile};

/// What an evaluator sees. `file` and `facts` are set for file-scope rules
/// only.
pub struct RuleContext<'a> {
    pub rule: &'a RuleDescriptor,
    pub tree: &'a ProjectTree,
    pub file: Option<&'a SourceFile>,
    pub facts: Option<&'a FileFacts>,
    pub config: &'a ConformConfig,
    pub profile: &'a MatcherProfile,
    pub catalog: &'a ResolvedCatalog,
}

impl<'a> RuleContext<'a> {
    pub fn file(&self) -> anyhow::Result<&'a SourceFile> {
        self.file
            .ok_or_else(|| anyhow::anyhow!("rule '{}' needs a file", self.rule.id))
    }

    pub fn facts(&self) -> anyhow::Result<&'a FileFacts> {
        self.facts
            .ok_or_else(|| anyhow::anyhow!("rule '{}' needs file facts", self.rule.id))
    }

    /// Violation of this rule at `path`.
    pub fn finding_at(
        &self,
        path: impl Into<String>,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Finding {
        Finding::violation(
            &self.rule.id,
            self.rule.category,
            self.rule.severity,
            path,
            line,
            message,
        )
    }

    /// Violation of this rule in the current file.
    pub fn finding(&self, line: Option<usize>, message: impl Into<String>) -> Finding {
        let path = self.file.map(|f| f.path()).unwrap_or(".");
        self.finding_at(path, line, message)
    }
}

pub trait Evaluator: Send + Sync {
    fn evaluate(&self, ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>>;

    /// Reject descriptors this evaluator cannot run, at catalog resolution.
    fn validate(&self, _rule: &RuleDescriptor) -> Result<()> {
        Ok(())
    }
}

/// Adapts a plain function into an [`Evaluator`].
pub struct FnEvaluator<F>(pub F);

impl<F> Evaluator for FnEvaluator<F>
where
    F: Fn(&RuleContext<'_>) -> anyhow::Result<Vec<Finding>> + Send + Sync,
{
    fn evaluate(&self, ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
        (self.0)(ctx)
    }
}

#[derive(Clone, Default)]
pub struct RuleRegistry {
    evaluators: BTreeMap<String, Arc<dyn Evaluator>>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("evaluators", &self.evaluators.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RuleRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every shipped check plus `forbidden-pattern`.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        checks::register_all(&mut registry);
        registry.register(FORBIDDEN_PATTERN, Arc::new(ForbiddenPattern::default()));
        registry
    }

    /// Register or replace an evaluator.
    pub fn register(&mut self, name: impl Into<String>, evaluator: Arc<dyn Evaluator>) {
        self.evaluators.insert(name.into(), evaluator);
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&RuleContext<'_>) -> anyhow::Result<Vec<Finding>> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnEvaluator(f)));
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Evaluator>> {
        self.evaluators.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.evaluators.keys().map(String::as_str)
    }
}

pub const FORBIDDEN_PATTERN: &str = "forbidden-pattern";

/// Flags every physical line matching the rule's `pattern` option. Lets a
/// catalog add literal bans without new code. Configuration rules skip the
/// paths excluded from configuration safety.
///
/// Options: `pattern` (regex, required), `message` (optional).
#[derive(Default)]
pub struct ForbiddenPattern {
    compiled: DashMap<String, Regex>,
}

impl ForbiddenPattern {
    fn regex_for(&self, rule: &RuleDescriptor) -> Result<Regex> {
        if let Some(regex) = self.compiled.get(&rule.id) {
            return Ok(regex.clone());
        }
        let pattern = rule.option_str("pattern").ok_or_else(|| {
            Error::catalog(format!(
                "rule '{}' uses {FORBIDDEN_PATTERN} without a 'pattern' option",
                rule.id
            ))
        })?;
        let regex = Regex::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e))?;
        self.compiled.insert(rule.id.clone(), regex.clone());
        Ok(regex)
    }
}

impl Evaluator for ForbiddenPattern {
    fn evaluate(&self, ctx: &RuleContext<'_>) -> anyhow::Result<Vec<Finding>> {
        let file = ctx.file()?;
        if ctx.rule.category == Category::Configuration
            && ctx.profile.safety().is_excluded(file.path())
        {
            return Ok(Vec::new());
        }
        let content = file
            .content()
            .map_err(|reason| anyhow::anyhow!("{reason}"))?;
        let regex = self.regex_for(ctx.rule)?;
        let message = ctx
            .rule
            .option_str("message")
            .map(str::to_string)
            .unwrap_or_else(|| format!("line matches forbidden pattern '{}'", regex.as_str()));
        Ok(content
            .lines()
            .enumerate()
            .filter(|(_, line)| regex.is_match(line))
            .map(|(idx, _)| ctx.finding(Some(idx + 1), message.clone()))
            .collect())
    }

    fn validate(&self, rule: &RuleDescriptor) -> Result<()> {
        if rule.scope != RuleScope::File {
            return Err(Error::catalog(format!(
                "rule '{}' uses {FORBIDDEN_PATTERN}, which only runs at file scope",
                rule.id
            )));
        }
        self.regex_for(rule).map(|_| ())
    }
}

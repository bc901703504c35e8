//! Rule engine: evaluates the resolved catalog over a project tree.
//!
//! File-scope rules run per file on a rayon pool built for the run; project
//! rules run afterwards on the calling thread. Every evaluator call is
//! isolated, so an error or panic in one rule becomes a single
//! `rule-evaluation-failed` finding and never stops the run.

use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::panic::{self, AssertUnwindSafe};

use super::catalog::{ResolvedCatalog, ResolvedRule, RuleScope};
use super::checks::FILE_UNREADABLE;
use super::registry::{RuleContext, RuleRegistry};
use crate::cancel::CancellationToken;
use crate::config::ConformConfig;
use crate::core::{Category, Finding, FindingKind, Severity};
use crate::errors::{Error, Result};
use crate::matchers::MatcherProfile;
use crate::tree::{ProjectTree, SourceFile};

pub(crate) fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Number of worker threads for `requested` jobs; 0 means available parallelism.
pub fn worker_count(requested: usize) -> usize {
    if requested > 0 {
        requested
    } else {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}

/// Everything one evaluation pass reads. Nothing here is mutated.
pub struct Engine<'a> {
    pub tree: &'a ProjectTree,
    pub catalog: &'a ResolvedCatalog,
    pub registry: &'a RuleRegistry,
    pub config: &'a ConformConfig,
    pub profile: &'a MatcherProfile,
    /// Evaluate only rules of these categories; `None` selects all
    pub categories: Option<&'a BTreeSet<Category>>,
    pub jobs: usize,
    pub cancel: &'a CancellationToken,
}

impl<'a> Engine<'a> {
    fn selected(&self, rule: &ResolvedRule) -> bool {
        self.categories
            .map_or(true, |selected| selected.contains(&rule.category()))
    }

    /// Evaluate every selected rule. Findings come back in report order.
    pub fn evaluate(&self) -> Result<Vec<Finding>> {
        let (project_rules, file_rules): (Vec<&ResolvedRule>, Vec<&ResolvedRule>) = self
            .catalog
            .rules()
            .filter(|r| self.selected(r))
            .partition(|r| r.scope() == RuleScope::Project);

        let files: Vec<&SourceFile> = self.tree.files().collect();
        let workers = worker_count(self.jobs);
        info!(
            "Evaluating {} file rules over {} files and {} project rules with {} workers",
            file_rules.len(),
            files.len(),
            project_rules.len(),
            workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("conformist-worker-{i}"))
            .build()
            .map_err(|e| Error::Io(std::io::Error::other(e)))?;

        let per_file: Vec<Option<Vec<Finding>>> = pool.install(|| {
            files
                .par_iter()
                .map(|&file| {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                    Some(self.evaluate_file(file, &file_rules))
                })
                .collect()
        });
        if self.cancel.is_cancelled() || per_file.iter().any(Option::is_none) {
            info!("Run cancelled during file evaluation");
            return Err(Error::Cancelled);
        }

        let mut findings: Vec<Finding> = per_file.into_iter().flatten().flatten().collect();

        for rule in project_rules {
            if self.cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            let ctx = self.context(rule, None);
            findings.extend(self.run_isolated(rule, &ctx));
        }

        findings.sort_by(Finding::report_order);
        findings.dedup();
        debug!("Evaluation produced {} findings", findings.len());
        Ok(findings)
    }

    fn context(&self, rule: &'a ResolvedRule, file: Option<&'a SourceFile>) -> RuleContext<'a> {
        RuleContext {
            rule: &rule.descriptor,
            tree: self.tree,
            file,
            facts: file.and_then(|f| f.facts(self.profile)),
            config: self.config,
            profile: self.profile,
            catalog: self.catalog,
        }
    }

    fn evaluate_file(&self, file: &'a SourceFile, rules: &[&'a ResolvedRule]) -> Vec<Finding> {
        let applicable: Vec<&ResolvedRule> = rules
            .iter()
            .copied()
            .filter(|r| r.applies_to(file.path()))
            .collect();
        debug!("{}: {} applicable rules", file.path(), applicable.len());

        if let Err(reason) = file.content() {
            let unreadable: Vec<&ResolvedRule> = applicable
                .iter()
                .copied()
                .filter(|r| r.descriptor.check_name() == FILE_UNREADABLE)
                .collect();
            if unreadable.is_empty() {
                warn!("Skipping unreadable file {}: {reason}", file.path());
            }
            return unreadable
                .into_iter()
                .flat_map(|rule| {
                    let ctx = self.context(rule, Some(file));
                    self.run_isolated(rule, &ctx)
                })
                .collect();
        }

        let facts = file.facts(self.profile);
        let mut findings = Vec::new();
        for rule in applicable {
            if let Some((line, reason)) = facts.and_then(|f| f.degradation_for(rule.category())) {
                findings.push(
                    Finding::violation(
                        rule.id(),
                        rule.category(),
                        Severity::Suggestion,
                        file.path(),
                        Some(*line),
                        format!("compliance could not be confirmed: {reason}"),
                    )
                    .with_kind(FindingKind::ParseDegraded),
                );
            }
            let ctx = self.context(rule, Some(file));
            findings.extend(self.run_isolated(rule, &ctx));
        }
        findings
    }

    fn run_isolated(&self, rule: &ResolvedRule, ctx: &RuleContext<'_>) -> Vec<Finding> {
        let failure = match self.registry.get(rule.descriptor.check_name()) {
            None => format!("no evaluator named '{}'", rule.descriptor.check_name()),
            Some(evaluator) => {
                match panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(ctx))) {
                    Ok(Ok(findings)) => return findings,
                    Ok(Err(err)) => format!("{err:#}"),
                    Err(payload) => format!("panicked: {}", panic_payload_to_string(payload.as_ref())),
                }
            }
        };
        warn!(
            "Rule {} failed on {}: {failure}",
            rule.id(),
            ctx.file.map(|f| f.path()).unwrap_or(".")
        );
        let mut finding = ctx
            .finding(None, format!("rule evaluation failed: {failure}"))
            .with_kind(FindingKind::RuleEvaluationFailed);
        finding.severity = Severity::Warning;
        vec![finding]
    }
}

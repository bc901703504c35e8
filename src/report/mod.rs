//! Aggregation of findings into category statuses and the run report.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::ConformConfig;
use crate::core::{Category, Finding, Severity};
use crate::fix::FixPlan;

pub const TOOL_NAME: &str = "conformist";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Pass,
    Fail,
    CriticalFail,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::CriticalFail => "critical-fail",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub warning: usize,
    pub suggestion: usize,
}

impl SeverityCounts {
    fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Warning => self.warning += 1,
            Severity::Suggestion => self.suggestion += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.warning + self.suggestion
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategorySummary {
    pub status: Status,
    pub counts: SeverityCounts,
}

/// Everything a run reports. Contains no timestamps or absolute paths, so an
/// unchanged tree serializes to identical bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub tool: String,
    pub catalog_version: String,
    pub overall_status: Status,
    pub categories: BTreeMap<Category, CategorySummary>,
    pub findings: Vec<Finding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix_plan: Option<FixPlan>,
}

impl Report {
    /// Aggregate `findings` over the selected categories. Every selected
    /// category is present, with zero counts when nothing was found.
    pub fn build(
        mut findings: Vec<Finding>,
        categories: &[Category],
        config: &ConformConfig,
        catalog_version: &str,
    ) -> Self {
        findings.sort_by(Finding::report_order);

        let mut summaries: BTreeMap<Category, CategorySummary> = categories
            .iter()
            .map(|c| {
                (
                    *c,
                    CategorySummary {
                        status: Status::Pass,
                        counts: SeverityCounts::default(),
                    },
                )
            })
            .collect();

        for finding in &findings {
            let summary = summaries
                .entry(finding.category)
                .or_insert_with(|| CategorySummary {
                    status: Status::Pass,
                    counts: SeverityCounts::default(),
                });
            summary.counts.add(finding.severity);
            let status = category_status(finding.category, finding.severity, config);
            summary.status = summary.status.max(status);
        }

        let overall_status = summaries
            .values()
            .map(|s| s.status)
            .max()
            .unwrap_or(Status::Pass);

        Self {
            tool: TOOL_NAME.to_string(),
            catalog_version: catalog_version.to_string(),
            overall_status,
            categories: summaries,
            findings,
            fix_plan: None,
        }
    }

    pub fn with_fix_plan(mut self, plan: FixPlan) -> Self {
        self.fix_plan = Some(plan);
        self
    }

    /// 0 pass, 1 fail or any failed fix, 2 critical-fail.
    pub fn exit_code(&self) -> i32 {
        let fix_failed = self.fix_plan.as_ref().is_some_and(FixPlan::has_failures);
        match self.overall_status {
            Status::CriticalFail => 2,
            Status::Fail => 1,
            Status::Pass if fix_failed => 1,
            Status::Pass => 0,
        }
    }

    pub fn fixable_count(&self) -> usize {
        self.findings.iter().filter(|f| f.fix.is_some()).count()
    }
}

/// Status a single finding imposes on its category. Only configuration
/// findings can reach critical-fail.
fn category_status(category: Category, severity: Severity, config: &ConformConfig) -> Status {
    if category == Category::Configuration && severity == Severity::Critical {
        Status::CriticalFail
    } else if severity >= config.threshold_for(category) {
        Status::Fail
    } else {
        Status::Pass
    }
}

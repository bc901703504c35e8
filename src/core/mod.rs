//! Shared vocabulary: categories, severities, findings and fix descriptors.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// The nine convention domains a rule can belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Structure,
    Typing,
    DataModel,
    Imports,
    Naming,
    Docstrings,
    Logging,
    Exceptions,
    Configuration,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Structure,
        Category::Typing,
        Category::DataModel,
        Category::Imports,
        Category::Naming,
        Category::Docstrings,
        Category::Logging,
        Category::Exceptions,
        Category::Configuration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Typing => "typing",
            Self::DataModel => "data-model",
            Self::Imports => "imports",
            Self::Naming => "naming",
            Self::Docstrings => "docstrings",
            Self::Logging => "logging",
            Self::Exceptions => "exceptions",
            Self::Configuration => "configuration",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// Severity tiers, ordered so that `Critical > Warning > Suggestion`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Suggestion,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Suggestion => "suggestion",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "suggestion" => Ok(Self::Suggestion),
            "warning" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// What produced a finding. Only `Violation` comes from a rule's own logic;
/// the others are recorded by the engine when something went wrong around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FindingKind {
    Violation,
    ParseDegraded,
    RuleEvaluationFailed,
    FileUnreadable,
}

/// Mechanical correction attached to a finding of a fixable rule.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum FixDescriptor {
    /// Re-sort the leading import block of `path` by bucket.
    ReorderImports { path: String },
    /// Create a directory (and parents) relative to the root.
    CreateDirectory { path: String },
    /// Create an empty marker file relative to the root; never overwrites.
    CreateMarkerFile { path: String },
}

impl FixDescriptor {
    pub fn path(&self) -> &str {
        match self {
            Self::ReorderImports { path }
            | Self::CreateDirectory { path }
            | Self::CreateMarkerFile { path } => path,
        }
    }
}

/// A single reported rule violation or observation.
///
/// `path` is relative to the scanned root and always `/`-separated so reports
/// are identical across platforms.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub rule_id: String,
    pub kind: FindingKind,
    pub category: Category,
    pub severity: Severity,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixDescriptor>,
}

impl Finding {
    pub fn violation(
        rule_id: impl Into<String>,
        category: Category,
        severity: Severity,
        path: impl Into<String>,
        line: Option<usize>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            rule_id: rule_id.into(),
            kind: FindingKind::Violation,
            category,
            severity,
            path: path.into(),
            line,
            message: message.into(),
            fix: None,
        }
    }

    pub fn with_kind(mut self, kind: FindingKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_fix(mut self, fix: FixDescriptor) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Presentation order: severity descending, then path, line, rule id, message.
    pub fn report_order(&self, other: &Self) -> Ordering {
        other
            .severity
            .cmp(&self.severity)
            .then_with(|| self.path.cmp(&other.path))
            .then_with(|| self.line.cmp(&other.line))
            .then_with(|| self.rule_id.cmp(&other.rule_id))
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.kind.cmp(&other.kind))
    }
}

/// Normalize a relative path to the `/`-separated form used in findings.
pub fn display_path(path: &std::path::Path) -> String {
    let joined = path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn severity_orders_critical_highest() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Suggestion);
    }

    #[test]
    fn category_parses_kebab_and_snake_case() {
        assert_eq!("data-model".parse::<Category>(), Ok(Category::DataModel));
        assert_eq!("data_model".parse::<Category>(), Ok(Category::DataModel));
        assert!("security".parse::<Category>().is_err());
    }

    #[test]
    fn report_order_puts_critical_first_then_path_then_line() {
        let a = Finding::violation("x", Category::Naming, Severity::Warning, "b.py", Some(3), "m");
        let b = Finding::violation("x", Category::Naming, Severity::Warning, "a.py", Some(9), "m");
        let c = Finding::violation(
            "y",
            Category::Configuration,
            Severity::Critical,
            "z.py",
            Some(1),
            "m",
        );
        let mut all = vec![a.clone(), b.clone(), c.clone()];
        all.sort_by(Finding::report_order);
        assert_eq!(all, vec![c, b, a]);
    }

    #[test]
    fn display_path_uses_forward_slashes() {
        assert_eq!(display_path(Path::new("pkg/sub/mod.py")), "pkg/sub/mod.py");
        assert_eq!(display_path(Path::new("")), ".");
    }
}

//! Import statements, bucket order and unused-import candidates.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::lexer::{split_top_level, LogicalLine};
use super::{MatcherProfile, ParsedSource};

static FROM_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^from(\s+\.*[\w.]*|\.+[\w.]*)\s*\bimport\b\s*(.*)$")
        .expect("valid from-import regex")
});
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("valid identifier regex"));
static NAME_LIKE_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\w.\[\]]+(\s*[,|]\s*[\w.\[\]]+)*$").expect("valid name literal regex")
});

/// Import classification, in required order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportBucket {
    Future,
    Standard,
    External,
    Local,
}

impl ImportBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Future => "future",
            Self::Standard => "standard",
            Self::External => "external",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for ImportBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    /// Name the import binds in the importing module.
    pub fn bound(&self, is_from: bool) -> String {
        match (&self.alias, is_from) {
            (Some(alias), _) => alias.clone(),
            (None, true) => self.name.clone(),
            (None, false) => self
                .name
                .split('.')
                .next()
                .unwrap_or(&self.name)
                .to_string(),
        }
    }

    fn is_explicit_reexport(&self) -> bool {
        self.alias.as_deref() == Some(self.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub module: String,
    pub names: Vec<ImportedName>,
    pub is_from: bool,
    pub line: usize,
    pub end_line: usize,
    pub bucket: ImportBucket,
    pub top_level: bool,
    pub wildcard: bool,
    /// Part of the contiguous import block at the top of the file
    pub leading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderViolation {
    pub line: usize,
    pub module: String,
    pub bucket: ImportBucket,
    /// Latest bucket seen before this import
    pub after: ImportBucket,
    pub in_leading_block: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnusedImport {
    pub name: String,
    pub module: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportFacts {
    pub records: Vec<ImportRecord>,
    pub first_order_violation: Option<OrderViolation>,
    pub order_violations: usize,
    pub unused: Vec<UnusedImport>,
    pub degraded: Option<(usize, String)>,
}

impl ImportFacts {
    pub fn wildcards(&self) -> impl Iterator<Item = &ImportRecord> {
        self.records.iter().filter(|r| r.wildcard)
    }

    /// Distinct buckets present in the leading block.
    pub fn leading_buckets(&self) -> BTreeSet<ImportBucket> {
        self.records
            .iter()
            .filter(|r| r.leading)
            .map(|r| r.bucket)
            .collect()
    }
}

pub fn is_import_line(line: &LogicalLine) -> bool {
    line.starts_with_keyword("import") || line.starts_with_keyword("from")
}

/// Parse a single import statement. `Err` carries the degradation reason.
pub fn parse_statement(code: &str) -> Result<(String, Vec<ImportedName>, bool), String> {
    let code = code.trim();
    if let Some(caps) = FROM_IMPORT.captures(code) {
        let module = caps[1].trim().to_string();
        let names_text = caps[2]
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')');
        let names = parse_names(names_text);
        if module.is_empty() || names.is_empty() {
            return Err("incomplete from-import".to_string());
        }
        return Ok((module, names, true));
    }
    if let Some(rest) = code.strip_prefix("import") {
        let names = parse_names(rest);
        if names.is_empty() {
            return Err("empty import statement".to_string());
        }
        let module = names[0].name.clone();
        return Ok((module, names, false));
    }
    Err("unrecognized import statement".to_string())
}

fn parse_names(text: &str) -> Vec<ImportedName> {
    split_top_level(text, ',')
        .into_iter()
        .filter_map(|item| {
            let mut parts = item.split_whitespace();
            let name = parts.next()?.to_string();
            let alias = match (parts.next(), parts.next()) {
                (Some("as"), Some(alias)) => Some(alias.to_string()),
                _ => None,
            };
            Some(ImportedName { name, alias })
        })
        .collect()
}

pub fn collect(source: &ParsedSource, profile: &MatcherProfile) -> ImportFacts {
    let mut facts = ImportFacts::default();
    let mut in_leading_block = true;
    let mut import_line_indices = BTreeSet::new();

    for (idx, line) in source.lexed.lines.iter().enumerate() {
        if idx == 0 && line.indent == 0 && line.is_lone_string() {
            continue;
        }
        if !is_import_line(line) {
            in_leading_block = false;
            continue;
        }
        import_line_indices.insert(idx);
        let top_level = line.indent == 0;
        match parse_statement(&line.code) {
            Ok((module, names, is_from)) => {
                let wildcard = is_from && names.iter().any(|n| n.name == "*");
                facts.records.push(ImportRecord {
                    bucket: profile.bucket_for(&module),
                    module,
                    names,
                    is_from,
                    line: line.start,
                    end_line: line.end,
                    top_level,
                    wildcard,
                    leading: in_leading_block && top_level,
                });
            }
            Err(reason) => {
                if facts.degraded.is_none() {
                    facts.degraded = Some((line.start, reason));
                }
                in_leading_block = false;
            }
        }
        if !top_level {
            in_leading_block = false;
        }
    }

    let mut latest: Option<ImportBucket> = None;
    for record in facts.records.iter().filter(|r| r.top_level) {
        match latest {
            Some(after) if record.bucket < after => {
                facts.order_violations += 1;
                if facts.first_order_violation.is_none() {
                    facts.first_order_violation = Some(OrderViolation {
                        line: record.line,
                        module: record.module.clone(),
                        bucket: record.bucket,
                        after,
                        in_leading_block: record.leading,
                    });
                }
            }
            _ => latest = Some(record.bucket),
        }
    }

    let references = collect_references(source, &import_line_indices);
    for record in &facts.records {
        if record.wildcard || record.bucket == ImportBucket::Future {
            continue;
        }
        for name in &record.names {
            if name.is_explicit_reexport() {
                continue;
            }
            let bound = name.bound(record.is_from);
            if !references.contains(bound.as_str()) {
                facts.unused.push(UnusedImport {
                    name: bound,
                    module: record.module.clone(),
                    line: record.line,
                });
            }
        }
    }

    facts
}

/// Identifiers used outside import statements. String literals that read like
/// names (`__all__` entries, quoted annotations) and f-string bodies count.
fn collect_references<'a>(
    source: &'a ParsedSource,
    import_lines: &BTreeSet<usize>,
) -> BTreeSet<&'a str> {
    let mut references = BTreeSet::new();
    for (idx, line) in source.lexed.lines.iter().enumerate() {
        if !import_lines.contains(&idx) {
            references.extend(IDENTIFIER.find_iter(&line.code).map(|m| m.as_str()));
        }
        for literal in &line.strings {
            if literal.is_fstring() || NAME_LIKE_LITERAL.is_match(literal.value.trim()) {
                references.extend(IDENTIFIER.find_iter(&literal.value).map(|m| m.as_str()));
            }
        }
    }
    references
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConformConfig;
    use crate::matchers::MarkerTables;
    use indoc::indoc;

    fn facts(source: &str) -> ImportFacts {
        let profile = MatcherProfile::new(&ConformConfig::default(), &MarkerTables::default())
            .unwrap()
            .with_local_modules(["app".to_string()].into_iter().collect());
        collect(&ParsedSource::parse("app/mod.py", source), &profile)
    }

    #[test]
    fn classifies_buckets() {
        let f = facts(indoc! {r#"
            from __future__ import annotations
            import os.path
            import requests
            from app.models import User
            from . import sibling
        "#});
        let buckets: Vec<_> = f.records.iter().map(|r| r.bucket).collect();
        assert_eq!(
            buckets,
            vec![
                ImportBucket::Future,
                ImportBucket::Standard,
                ImportBucket::External,
                ImportBucket::Local,
                ImportBucket::Local,
            ]
        );
        assert!(f.first_order_violation.is_none());
    }

    #[test]
    fn reports_first_order_violation_only_once() {
        let f = facts(indoc! {r#"
            import requests
            import os
            from app import core
            import sys
        "#});
        let violation = f.first_order_violation.unwrap();
        assert_eq!(violation.line, 2);
        assert_eq!(violation.module, "os");
        assert_eq!(violation.after, ImportBucket::External);
        assert!(violation.in_leading_block);
        assert_eq!(f.order_violations, 2);
    }

    #[test]
    fn nested_imports_do_not_count_for_order() {
        let f = facts(indoc! {r#"
            import requests

            def lazy():
                import os
                return os.getcwd()

            print(requests)
        "#});
        assert!(f.first_order_violation.is_none());
        assert!(!f.records[1].top_level);
        assert!(f.unused.is_empty());
    }

    #[test]
    fn parenthesized_from_imports_with_aliases() {
        let f = facts(indoc! {r#"
            from typing import (
                Any,
                Optional as Opt,
            )
            value: Opt[Any] = None
        "#});
        let names = &f.records[0].names;
        assert_eq!(names.len(), 2);
        assert_eq!(names[1].bound(true), "Opt");
        assert!(f.unused.is_empty());
    }

    #[test]
    fn unused_imports_ignore_all_and_quoted_annotations() {
        let f = facts(indoc! {r#"
            import json
            import re
            from pathlib import Path
            from typing import TYPE_CHECKING

            __all__ = ["Path"]

            def load(raw: "TYPE_CHECKING") -> None:
                pass
        "#});
        let unused: Vec<_> = f.unused.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(unused, vec!["json", "re"]);
    }

    #[test]
    fn fstring_bodies_count_as_references() {
        let f = facts("import math\nlabel = f'{math.pi:.2f}'\n");
        assert!(f.unused.is_empty());
    }

    #[test]
    fn wildcard_imports_are_flagged() {
        let f = facts("from os.path import *\n");
        assert_eq!(f.wildcards().count(), 1);
        assert!(f.unused.is_empty());
    }

    #[test]
    fn leading_block_stops_at_first_statement() {
        let f = facts(indoc! {r#"
            """Doc."""
            import os

            CONSTANT = 1
            import sys
        "#});
        assert!(f.records[0].leading);
        assert!(!f.records[1].leading);
    }

    #[test]
    fn incomplete_import_degrades() {
        let f = facts("from os import\n");
        assert!(f.degraded.is_some());
        assert!(f.records.is_empty());
    }

    #[test]
    fn unparsed_import_ends_the_leading_block() {
        let f = facts("import requests\nfrom app import\nimport os\n");
        assert!(f.degraded.is_some());
        assert_eq!(f.records.len(), 2);
        assert!(f.records[0].leading);
        assert!(!f.records[1].leading);
    }

    #[test]
    fn from_followed_directly_by_a_dot_is_relative() {
        let f = facts("from.orders import Order\nfrom..base import Model\nx = (Order, Model)\n");
        assert!(f.degraded.is_none());
        let modules: Vec<_> = f.records.iter().map(|r| r.module.as_str()).collect();
        assert_eq!(modules, vec![".orders", "..base"]);
        assert!(f.records.iter().all(|r| r.bucket == ImportBucket::Local));
    }

    #[test]
    fn semicolon_separated_imports_are_separate_statements() {
        let f = facts("import os; import sys\nprint_it = (os, sys)\n");
        let modules: Vec<_> = f.records.iter().map(|r| r.module.as_str()).collect();
        assert_eq!(modules, vec!["os", "sys"]);
        assert!(f.records.iter().all(|r| r.bucket == ImportBucket::Standard));
        assert!(f.unused.is_empty());
    }
}

use log::debug;
use std::collections::BTreeMap;
use std::path::Path;

use super::imports::reorder_leading_block;
use super::{content_hash, image_of, FixPlan, Mutation, Outcome, IMAGE_ABSENT, IMAGE_DIRECTORY};
use crate::core::{Finding, FixDescriptor};
use crate::matchers::MatcherProfile;
use crate::rules::ResolvedCatalog;

/// Directories first so markers and rewrites find their parents.
fn phase(action: &FixDescriptor) -> u8 {
    match action {
        FixDescriptor::CreateDirectory { .. } => 0,
        FixDescriptor::CreateMarkerFile { .. } => 1,
        FixDescriptor::ReorderImports { .. } => 2,
    }
}

/// Plan the mutations for every fix attached to a finding of a fixable rule,
/// one per (path, action).
pub fn build_plan(
    findings: &[Finding],
    catalog: &ResolvedCatalog,
    root: &Path,
    profile: &MatcherProfile,
) -> FixPlan {
    let mut grouped: BTreeMap<(u8, String, FixDescriptor), Vec<String>> = BTreeMap::new();
    for finding in findings {
        let Some(action) = &finding.fix else {
            continue;
        };
        if !catalog.is_fixable(&finding.rule_id) {
            continue;
        }
        let rule_ids = grouped
            .entry((phase(action), action.path().to_string(), action.clone()))
            .or_default();
        if !rule_ids.contains(&finding.rule_id) {
            rule_ids.push(finding.rule_id.clone());
        }
    }

    let mut plan = FixPlan::default();
    for ((_, _, action), rule_ids) in grouped {
        let mut mutation = Mutation {
            action,
            rule_ids,
            pre_image: IMAGE_ABSENT.to_string(),
            post_image: IMAGE_ABSENT.to_string(),
            outcome: Outcome::Planned,
            reason: None,
            content: None,
        };
        let target = root.join(mutation.path());
        let current = match image_of(&target) {
            Ok(image) => image,
            Err(e) => {
                mutation.fail(format!("cannot read current state: {e}"));
                plan.mutations.push(mutation);
                continue;
            }
        };

        match &mutation.action {
            FixDescriptor::CreateDirectory { .. } => {
                if current == IMAGE_DIRECTORY {
                    continue;
                }
                mutation.pre_image = current;
                mutation.post_image = IMAGE_DIRECTORY.to_string();
            }
            FixDescriptor::CreateMarkerFile { .. } => {
                if current != IMAGE_ABSENT {
                    continue;
                }
                mutation.post_image = content_hash(b"");
            }
            FixDescriptor::ReorderImports { path } => {
                let content = match std::fs::read_to_string(&target) {
                    Ok(content) => content,
                    Err(e) => {
                        mutation.fail(format!("cannot read file: {e}"));
                        plan.mutations.push(mutation);
                        continue;
                    }
                };
                let Some(reordered) = reorder_leading_block(
                    path,
                    &content,
                    profile,
                    &catalog.fix.order_insensitive_buckets,
                ) else {
                    debug!("Import block of {path} needs no reordering");
                    continue;
                };
                mutation.pre_image = current;
                mutation.post_image = content_hash(reordered.as_bytes());
                mutation.content = Some(reordered);
            }
        }
        plan.mutations.push(mutation);
    }
    debug!("Fix plan has {} mutations", plan.mutations.len());
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConformConfig;
    use crate::core::{Category, Severity};
    use crate::rules::{Catalog, RuleRegistry};
    use tempfile::TempDir;

    fn catalog() -> ResolvedCatalog {
        ResolvedCatalog::resolve(
            Catalog::shipped().unwrap(),
            &Default::default(),
            &RuleRegistry::builtin(),
        )
        .unwrap()
    }

    fn profile(catalog: &ResolvedCatalog) -> MatcherProfile {
        MatcherProfile::new(&ConformConfig::default(), &catalog.markers).unwrap()
    }

    fn finding(rule_id: &str, fix: FixDescriptor) -> Finding {
        Finding::violation(rule_id, Category::Structure, Severity::Warning, fix.path(), None, "m")
            .with_fix(fix)
    }

    #[test]
    fn plan_orders_directories_before_markers_and_deduplicates() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog();
        let marker = FixDescriptor::CreateMarkerFile {
            path: "tests/__init__.py".into(),
        };
        let findings = vec![
            finding("structure.required-directory", marker.clone()),
            finding("structure.missing-package-marker", marker),
            finding(
                "structure.required-directory",
                FixDescriptor::CreateDirectory {
                    path: "tests".into(),
                },
            ),
        ];
        let plan = build_plan(&findings, &catalog, dir.path(), &profile(&catalog));
        let actions: Vec<_> = plan.mutations.iter().map(|m| m.action.clone()).collect();
        assert_eq!(
            actions,
            vec![
                FixDescriptor::CreateDirectory {
                    path: "tests".into()
                },
                FixDescriptor::CreateMarkerFile {
                    path: "tests/__init__.py".into()
                },
            ]
        );
        assert_eq!(plan.mutations[1].rule_ids.len(), 2);
        assert_eq!(plan.mutations[1].pre_image, IMAGE_ABSENT);
    }

    #[test]
    fn fixes_of_non_fixable_rules_are_ignored() {
        let dir = TempDir::new().unwrap();
        let catalog = catalog();
        let findings = vec![finding(
            "naming.file",
            FixDescriptor::CreateDirectory { path: "x".into() },
        )];
        assert!(build_plan(&findings, &catalog, dir.path(), &profile(&catalog)).is_empty());
    }

    #[test]
    fn reorder_mutation_records_both_images() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("mod.py"), "import requests\nimport os\n").unwrap();
        let catalog = catalog();
        let findings = vec![finding(
            "imports.order",
            FixDescriptor::ReorderImports {
                path: "mod.py".into(),
            },
        )];
        let plan = build_plan(&findings, &catalog, dir.path(), &profile(&catalog));
        let mutation = &plan.mutations[0];
        assert_eq!(mutation.pre_image, content_hash(b"import requests\nimport os\n"));
        assert_eq!(
            mutation.content.as_deref(),
            Some("import os\n\nimport requests\n")
        );
        assert_eq!(mutation.post_image, content_hash(b"import os\n\nimport requests\n"));
    }
}

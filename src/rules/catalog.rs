//! Rule catalog: descriptors, marker tables and fix policy, loaded from TOML,
//! JSON or YAML and resolved against configuration overrides at run start.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use super::registry::RuleRegistry;
use crate::config::CatalogOverrides;
use crate::core::{Category, Severity};
use crate::errors::{Error, Result};
use crate::matchers::{ImportBucket, MarkerTables};
use crate::patterns::PathGlobs;

pub const CATALOG_VERSION: &str = "1";

const SHIPPED_CATALOG: &str = include_str!("default_catalog.toml");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    #[default]
    File,
    Project,
}

/// Declarative rule definition. Behaviour lives in the evaluator registered
/// under `check` (or the id when `check` is absent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleDescriptor {
    pub id: String,
    pub category: Category,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
    #[serde(default)]
    pub scope: RuleScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    #[serde(default)]
    pub fixable: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl RuleDescriptor {
    /// Name of the evaluator this rule binds to.
    pub fn check_name(&self) -> &str {
        self.check.as_deref().unwrap_or(&self.id)
    }

    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(|v| v.as_str())
    }

    fn is_protected(&self) -> bool {
        self.category == Category::Configuration && self.severity == Severity::Critical
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixPolicy {
    /// Buckets whose members may be moved by the import reorder fix
    #[serde(default = "all_buckets")]
    pub order_insensitive_buckets: Vec<ImportBucket>,
}

impl Default for FixPolicy {
    fn default() -> Self {
        Self {
            order_insensitive_buckets: all_buckets(),
        }
    }
}

fn all_buckets() -> Vec<ImportBucket> {
    vec![
        ImportBucket::Future,
        ImportBucket::Standard,
        ImportBucket::External,
        ImportBucket::Local,
    ]
}

fn default_version() -> String {
    CATALOG_VERSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub rules: Vec<RuleDescriptor>,
    #[serde(default)]
    pub markers: MarkerTables,
    #[serde(default)]
    pub fix: FixPolicy,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn shipped() -> Result<Self> {
        toml::from_str(SHIPPED_CATALOG)
            .map_err(|e| Error::catalog(format!("shipped catalog is invalid: {e}")))
    }

    /// Load a catalog file; the format follows the extension.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::catalog_at(format!("cannot read catalog: {e}"), path))?;
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let parsed = match extension.as_str() {
            "toml" => toml::from_str(&content).map_err(|e| e.to_string()),
            "json" => serde_json::from_str(&content).map_err(|e| e.to_string()),
            "yaml" | "yml" => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
            other => Err(format!(
                "unsupported catalog format '{other}' (expected toml, json, yaml)"
            )),
        };
        parsed.map_err(|message| Error::catalog_at(message, path))
    }
}

/// A descriptor with its applicability globs compiled.
#[derive(Debug, Clone)]
pub struct ResolvedRule {
    pub descriptor: RuleDescriptor,
    include: PathGlobs,
    exclude: PathGlobs,
}

impl ResolvedRule {
    fn new(descriptor: RuleDescriptor) -> Result<Self> {
        Ok(Self {
            include: PathGlobs::new(&descriptor.include)?,
            exclude: PathGlobs::new(&descriptor.exclude)?,
            descriptor,
        })
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn category(&self) -> Category {
        self.descriptor.category
    }

    pub fn scope(&self) -> RuleScope {
        self.descriptor.scope
    }

    /// Whether a file-scope rule applies to `path`.
    pub fn applies_to(&self, path: &str) -> bool {
        (self.include.is_empty() || self.include.matches(path)) && !self.exclude.matches(path)
    }
}

/// The catalog in effect for one run.
#[derive(Debug, Clone)]
pub struct ResolvedCatalog {
    pub version: String,
    pub markers: MarkerTables,
    pub fix: FixPolicy,
    rules: Vec<ResolvedRule>,
    by_category: BTreeMap<Category, Vec<String>>,
}

impl ResolvedCatalog {
    /// Apply overrides to `base` and validate the result against `registry`.
    pub fn resolve(
        base: Catalog,
        overrides: &CatalogOverrides,
        registry: &RuleRegistry,
    ) -> Result<Self> {
        let mut rules = base.rules;
        check_unique(&rules)?;

        for (id, severity) in &overrides.severity {
            let rule = rules
                .iter_mut()
                .find(|r| &r.id == id)
                .ok_or_else(|| Error::catalog(format!("severity override for unknown rule '{id}'")))?;
            if rule.is_protected() && *severity < Severity::Critical {
                return Err(Error::catalog(format!(
                    "rule '{id}' is a critical configuration rule and cannot be downgraded"
                )));
            }
            rule.severity = *severity;
        }

        let mut disabled = BTreeSet::new();
        for id in &overrides.disable {
            let rule = rules
                .iter()
                .find(|r| &r.id == id)
                .ok_or_else(|| Error::catalog(format!("cannot disable unknown rule '{id}'")))?;
            if rule.is_protected() {
                return Err(Error::catalog(format!(
                    "rule '{id}' is a critical configuration rule and cannot be disabled"
                )));
            }
            disabled.insert(id.clone());
        }
        rules.retain(|r| !disabled.contains(&r.id));

        rules.extend(overrides.rules.iter().cloned());
        check_unique(&rules)?;

        let mut resolved = Vec::with_capacity(rules.len());
        let mut by_category: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        for descriptor in rules {
            let evaluator = registry.get(descriptor.check_name()).ok_or_else(|| {
                Error::catalog(format!(
                    "rule '{}' references unknown check '{}'",
                    descriptor.id,
                    descriptor.check_name()
                ))
            })?;
            evaluator.validate(&descriptor)?;
            by_category
                .entry(descriptor.category)
                .or_default()
                .push(descriptor.id.clone());
            resolved.push(ResolvedRule::new(descriptor)?);
        }

        log::debug!(
            "Resolved catalog v{} with {} rules ({} disabled)",
            base.version,
            resolved.len(),
            disabled.len()
        );

        Ok(Self {
            version: base.version,
            markers: base.markers,
            fix: base.fix,
            rules: resolved,
            by_category,
        })
    }

    pub fn rules(&self) -> impl Iterator<Item = &ResolvedRule> {
        self.rules.iter()
    }

    pub fn rule(&self, id: &str) -> Option<&ResolvedRule> {
        self.rules.iter().find(|r| r.id() == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule ids of a category, in catalog order.
    pub fn ids_for(&self, category: Category) -> &[String] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_fixable(&self, id: &str) -> bool {
        self.rule(id).is_some_and(|r| r.descriptor.fixable)
    }
}

fn check_unique(rules: &[RuleDescriptor]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for rule in rules {
        if !seen.insert(rule.id.as_str()) {
            return Err(Error::catalog(format!("duplicate rule id '{}'", rule.id)));
        }
    }
    Ok(())
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::core::{Category, Severity};
use crate::errors::{Error, Result};
use crate::rules::catalog::RuleDescriptor;

/// Root configuration structure, read from `.conformist.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConformConfig {
    /// Tree loading and project layout
    #[serde(default)]
    pub project: ProjectConfig,

    /// Import bucket classification
    #[serde(default)]
    pub imports: ImportsConfig,

    /// Configuration-safety scanning
    #[serde(default)]
    pub configuration: ConfigurationSafetyConfig,

    /// Per-category failure thresholds
    #[serde(default)]
    pub thresholds: BTreeMap<Category, Severity>,

    /// Catalog source and overrides
    #[serde(default)]
    pub catalog: CatalogOverrides,
}

impl ConformConfig {
    /// Reject values that would break report invariants.
    pub fn validate(&self) -> Result<()> {
        if self.thresholds.contains_key(&Category::Configuration) {
            return Err(Error::config(
                "the configuration category threshold is fixed and cannot be overridden",
            ));
        }
        if self.project.extensions.is_empty() {
            return Err(Error::config("project.extensions must not be empty"));
        }
        if self.project.max_file_bytes == 0 {
            return Err(Error::config("project.max_file_bytes must be positive"));
        }
        Ok(())
    }

    /// Severity at which a category starts failing.
    pub fn threshold_for(&self, category: Category) -> Severity {
        match category {
            Category::Configuration => Severity::Warning,
            other => self
                .thresholds
                .get(&other)
                .copied()
                .unwrap_or(Severity::Warning),
        }
    }

    /// Effective ignore patterns: the base list plus any extensions.
    pub fn ignore_patterns(&self) -> Vec<String> {
        self.project
            .ignore
            .iter()
            .chain(self.project.extend_ignore.iter())
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Patterns without `/` match any path component; others match the relative path
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Added to `ignore` without replacing the defaults
    #[serde(default)]
    pub extend_ignore: Vec<String>,

    /// Source file extensions for the configured language
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Files larger than this are reported unreadable instead of loaded
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Worker threads; 0 uses available parallelism
    #[serde(default)]
    pub jobs: usize,

    /// Directories whose subdirectories are packages and need a marker file
    #[serde(default = "default_package_roots")]
    pub package_roots: Vec<String>,

    /// Name of the package marker file
    #[serde(default = "default_package_marker")]
    pub package_marker: String,

    /// Directories every project must have
    #[serde(default = "default_required_dirs")]
    pub required_dirs: Vec<RequiredDir>,

    /// Globs selecting domain directories that own an exceptions file
    #[serde(default = "default_domain_globs")]
    pub domain_globs: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            extend_ignore: Vec::new(),
            extensions: default_extensions(),
            max_file_bytes: default_max_file_bytes(),
            jobs: 0,
            package_roots: default_package_roots(),
            package_marker: default_package_marker(),
            required_dirs: default_required_dirs(),
            domain_globs: default_domain_globs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RequiredDir {
    pub path: String,
    #[serde(default)]
    pub marker: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImportsConfig {
    /// Extra module names treated as standard library
    #[serde(default)]
    pub stdlib_extra: Vec<String>,

    /// Module prefixes treated as local project code
    #[serde(default)]
    pub local_prefixes: Vec<String>,

    /// Treat top-level packages and modules found in the tree as local
    #[serde(default = "default_true")]
    pub detect_local_packages: bool,
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self {
            stdlib_extra: Vec::new(),
            local_prefixes: Vec::new(),
            detect_local_packages: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigurationSafetyConfig {
    /// Paths whose content never contributes configuration findings
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    /// Regexes matched against whole string literals
    #[serde(default = "default_connection_patterns")]
    pub connection_patterns: Vec<String>,

    /// Extensions that mark a literal argument as a config file
    #[serde(default = "default_config_extensions")]
    pub config_extensions: Vec<String>,

    /// Regex matched against assignment targets and dictionary keys
    #[serde(default = "default_secret_name_pattern")]
    pub secret_name_pattern: String,
}

impl Default for ConfigurationSafetyConfig {
    fn default() -> Self {
        Self {
            excluded_paths: default_excluded_paths(),
            connection_patterns: default_connection_patterns(),
            config_extensions: default_config_extensions(),
            secret_name_pattern: default_secret_name_pattern(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CatalogOverrides {
    /// External catalog replacing the shipped default
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Rule ids to switch off
    #[serde(default)]
    pub disable: Vec<String>,

    /// Re-tiered severities by rule id
    #[serde(default)]
    pub severity: BTreeMap<String, Severity>,

    /// Additional rule descriptors
    #[serde(default)]
    pub rules: Vec<RuleDescriptor>,
}

fn default_true() -> bool {
    true
}

fn default_ignore() -> Vec<String> {
    [
        ".git",
        ".hg",
        ".venv",
        "venv",
        "env",
        ".env",
        "__pycache__",
        ".tox",
        ".nox",
        ".mypy_cache",
        ".pytest_cache",
        ".ruff_cache",
        "build",
        "dist",
        "*.egg-info",
        "node_modules",
        "site-packages",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_extensions() -> Vec<String> {
    vec!["py".to_string()]
}

fn default_max_file_bytes() -> u64 {
    2 * 1024 * 1024
}

fn default_package_roots() -> Vec<String> {
    vec!["src".to_string()]
}

fn default_package_marker() -> String {
    "__init__.py".to_string()
}

fn default_required_dirs() -> Vec<RequiredDir> {
    vec![RequiredDir {
        path: "tests".to_string(),
        marker: Some("__init__.py".to_string()),
    }]
}

fn default_domain_globs() -> Vec<String> {
    vec!["src/*".to_string()]
}

fn default_excluded_paths() -> Vec<String> {
    [
        "**/example/**",
        "**/examples/**",
        "**/*example*",
        "**/template/**",
        "**/templates/**",
        "**/*template*",
        "**/test/**",
        "**/tests/**",
        "**/test_*.py",
        "**/*_test.py",
        "**/conftest.py",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_connection_patterns() -> Vec<String> {
    [
        r"(?i)^(postgres(ql)?|mysql|mariadb|mssql|oracle|mongodb(\+srv)?|rediss?|amqps?|kafka|sqlserver|cockroachdb)(\+[a-z0-9]+)?://\S+",
        r"(?i)^[a-z][a-z0-9+.-]*://[^/\s:@]+:[^/\s@]+@\S+",
        r"(?i)^jdbc:[a-z0-9]+:\S+",
        r"(?i)^(localhost|127\.0\.0\.1|0\.0\.0\.0|\d{1,3}(\.\d{1,3}){3}):\d{2,5}(/\S*)?$",
        r"(?i)^(https?|wss?|tcp|grpc)://(localhost|127\.0\.0\.1|\d{1,3}(\.\d{1,3}){3})(:\d{2,5})?(/\S*)?$",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_config_extensions() -> Vec<String> {
    ["yaml", "yml", "json", "toml", "ini", "cfg", "conf", "env"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_secret_name_pattern() -> String {
    r"(?i)(api[_-]?key|apikey|secret|passw(or)?d|passwd|pwd|token|private[_-]?key|credentials?|auth[_-]?key|access[_-]?key)".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ConformConfig::default().validate().is_ok());
    }

    #[test]
    fn configuration_threshold_cannot_be_overridden() {
        let mut config = ConformConfig::default();
        config
            .thresholds
            .insert(Category::Configuration, Severity::Critical);
        assert!(config.validate().is_err());
    }

    #[test]
    fn thresholds_default_to_warning() {
        let mut config = ConformConfig::default();
        config.thresholds.insert(Category::Naming, Severity::Critical);
        assert_eq!(config.threshold_for(Category::Naming), Severity::Critical);
        assert_eq!(config.threshold_for(Category::Typing), Severity::Warning);
        assert_eq!(
            config.threshold_for(Category::Configuration),
            Severity::Warning
        );
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ConformConfig = toml::from_str(
            r#"
[project]
extend_ignore = ["generated"]

[thresholds]
naming = "critical"
"#,
        )
        .unwrap();
        assert!(config.ignore_patterns().contains(&".venv".to_string()));
        assert!(config.ignore_patterns().contains(&"generated".to_string()));
        assert_eq!(config.project.extensions, vec!["py"]);
        assert_eq!(config.threshold_for(Category::Naming), Severity::Critical);
    }
}

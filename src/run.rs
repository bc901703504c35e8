//! One compliance run: configuration, catalog and options threaded through
//! tree loading, evaluation, reporting and fixing.

use clap::ValueEnum;
use log::info;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::cancel::CancellationToken;
use crate::config::{load_config, ConformConfig};
use crate::core::Category;
use crate::errors::{Error, Result};
use crate::fix::{build_plan, FixApplier};
use crate::matchers::MatcherProfile;
use crate::report::Report;
use crate::rules::{Catalog, Engine, ResolvedCatalog, RuleRegistry};
use crate::tree::TreeLoader;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Report findings only
    #[default]
    Report,
    /// Report, then apply the fix plan
    Fix,
    /// Report with the fix plan, writing nothing
    FixDryRun,
}

impl Mode {
    pub fn plans_fixes(&self) -> bool {
        !matches!(self, Self::Report)
    }
}

/// Caller-supplied options. Values set here win over the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub root: PathBuf,
    pub mode: Mode,
    /// Restrict evaluation to these categories; `None` runs all
    pub categories: Option<BTreeSet<Category>>,
    pub config_path: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    pub jobs: Option<usize>,
}

impl RunOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

/// Resolved inputs of a run. Built once; nothing in it changes while the run
/// executes.
#[derive(Debug)]
pub struct RunContext {
    pub options: RunOptions,
    pub config: ConformConfig,
    pub config_source: Option<PathBuf>,
    pub catalog: ResolvedCatalog,
    pub registry: RuleRegistry,
}

impl RunContext {
    pub fn prepare(options: RunOptions) -> Result<Self> {
        Self::prepare_with_registry(options, RuleRegistry::builtin())
    }

    /// Prepare with a caller-provided registry, e.g. one with extra evaluators.
    pub fn prepare_with_registry(options: RunOptions, registry: RuleRegistry) -> Result<Self> {
        if !options.root.exists() {
            return Err(Error::RootNotFound {
                path: options.root.clone(),
            });
        }
        let (mut config, config_source) =
            load_config(&options.root, options.config_path.as_deref())?;
        if let Some(jobs) = options.jobs {
            config.project.jobs = jobs;
        }
        if let Some(catalog) = &options.catalog_path {
            config.catalog.path = Some(catalog.clone());
        }

        let base = match &config.catalog.path {
            Some(path) => {
                info!("Using catalog {}", path.display());
                Catalog::load(path)?
            }
            None => Catalog::shipped()?,
        };
        let catalog = ResolvedCatalog::resolve(base, &config.catalog, &registry)?;

        Ok(Self {
            options,
            config,
            config_source,
            catalog,
            registry,
        })
    }

    /// Categories the report covers, in canonical order.
    pub fn selected_categories(&self) -> Vec<Category> {
        match &self.options.categories {
            Some(selected) => Category::ALL
                .iter()
                .copied()
                .filter(|c| selected.contains(c))
                .collect(),
            None => Category::ALL.to_vec(),
        }
    }

    pub fn run(&self, cancel: &CancellationToken) -> Result<Report> {
        let tree = TreeLoader::from_config(&self.options.root, &self.config).load()?;
        info!(
            "Loaded {} source files from {}",
            tree.file_count(),
            tree.root().display()
        );

        let local_modules = if self.config.imports.detect_local_packages {
            tree.top_level_modules()
        } else {
            BTreeSet::new()
        };
        let profile =
            MatcherProfile::new(&self.config, &self.catalog.markers)?.with_local_modules(local_modules);

        let findings = Engine {
            tree: &tree,
            catalog: &self.catalog,
            registry: &self.registry,
            config: &self.config,
            profile: &profile,
            categories: self.options.categories.as_ref(),
            jobs: self.config.project.jobs,
            cancel,
        }
        .evaluate()?;

        let report = Report::build(
            findings,
            &self.selected_categories(),
            &self.config,
            &self.catalog.version,
        );
        info!("Overall status: {}", report.overall_status);

        if !self.options.mode.plans_fixes() {
            return Ok(report);
        }
        let mut plan = build_plan(&report.findings, &self.catalog, tree.root(), &profile);
        FixApplier::new(tree.root()).apply(
            &mut plan,
            self.options.mode == Mode::FixDryRun,
            cancel,
        )?;
        Ok(report.with_fix_plan(plan))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_root_is_a_setup_error() {
        let err = RunContext::prepare(RunOptions::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, Error::RootNotFound { .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn cli_values_override_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".conformist.toml"), "[project]\njobs = 7\n").unwrap();
        let mut options = RunOptions::new(dir.path());
        options.jobs = Some(2);
        let ctx = RunContext::prepare(options).unwrap();
        assert_eq!(ctx.config.project.jobs, 2);
    }

    #[test]
    fn category_selection_keeps_canonical_order() {
        let dir = TempDir::new().unwrap();
        let mut options = RunOptions::new(dir.path());
        options.categories = Some([Category::Naming, Category::Structure].into_iter().collect());
        let ctx = RunContext::prepare(options).unwrap();
        assert_eq!(
            ctx.selected_categories(),
            vec![Category::Structure, Category::Naming]
        );
    }
}

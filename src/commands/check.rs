use anyhow::{Context, Result};
use log::info;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::cancel::CancellationToken;
use crate::core::Category;
use crate::formatting::FormattingConfig;
use crate::output::{self, OutputFormat};
use crate::run::{Mode, RunContext, RunOptions};

#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub root: PathBuf,
    pub mode: Mode,
    pub categories: Option<Vec<Category>>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub jobs: Option<usize>,
    pub plain: bool,
}

impl CheckConfig {
    fn run_options(&self) -> RunOptions {
        RunOptions {
            root: self.root.clone(),
            mode: self.mode,
            categories: self
                .categories
                .as_ref()
                .map(|c| c.iter().copied().collect::<BTreeSet<_>>()),
            config_path: self.config.clone(),
            catalog_path: self.catalog.clone(),
            jobs: self.jobs,
        }
    }

    fn formatting(&self) -> FormattingConfig {
        if self.plain {
            FormattingConfig::plain()
        } else {
            FormattingConfig::from_env()
        }
    }
}

/// Run a check, print the report and return the process exit code.
pub fn run_check(config: CheckConfig, cancel: &CancellationToken) -> Result<i32> {
    let context = RunContext::prepare(config.run_options())?;
    if let Some(source) = &context.config_source {
        info!("Using configuration {}", source.display());
    }

    let report = context
        .run(cancel)
        .with_context(|| format!("checking {}", config.root.display()))?;

    let rendered = output::render_report(&report, config.format, config.formatting())?;
    output::emit(&rendered, config.output.as_deref())?;
    Ok(report.exit_code())
}

use anyhow::Result;
use std::path::PathBuf;

use crate::formatting::FormattingConfig;
use crate::output::{self, OutputFormat};
use crate::run::{RunContext, RunOptions};

#[derive(Debug, Clone)]
pub struct RulesConfig {
    pub root: PathBuf,
    pub format: OutputFormat,
    pub config: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
    pub plain: bool,
}

/// Print the catalog as it would be used for a check of `root`: overrides
/// and disabled rules applied.
pub fn list_rules(config: RulesConfig) -> Result<()> {
    let mut options = RunOptions::new(&config.root);
    options.config_path = config.config.clone();
    options.catalog_path = config.catalog.clone();
    let context = RunContext::prepare(options)?;

    let formatting = if config.plain {
        FormattingConfig::plain()
    } else {
        FormattingConfig::from_env()
    };
    let rendered = output::render_catalog(&context.catalog, config.format, formatting)?;
    output::emit(&rendered, None)
}

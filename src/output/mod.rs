pub mod structured;
pub mod table;

use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::formatting::FormattingConfig;
use crate::report::Report;
use crate::rules::ResolvedCatalog;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Table,
    /// JSON for machines
    Structured,
}

pub fn render_report(report: &Report, format: OutputFormat, formatting: FormattingConfig) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::render_report(report, formatting.formatter().as_ref())),
        OutputFormat::Structured => structured::render_report(report),
    }
}

pub fn render_catalog(
    catalog: &ResolvedCatalog,
    format: OutputFormat,
    formatting: FormattingConfig,
) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(table::render_catalog(catalog, formatting.formatter().as_ref())),
        OutputFormat::Structured => structured::render_catalog(catalog),
    }
}

/// Write rendered output to `output_file`, creating parent directories, or to
/// stdout.
pub fn emit(content: &str, output_file: Option<&Path>) -> Result<()> {
    match output_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn emit_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("report.json");
        emit("{}\n", Some(&nested)).unwrap();
        assert_eq!(fs::read_to_string(nested).unwrap(), "{}\n");
    }
}

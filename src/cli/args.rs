use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::Category;
use crate::output::OutputFormat;
use crate::run::Mode;

#[derive(Parser, Debug)]
#[command(name = "conformist")]
#[command(about = "Convention compliance checker for Python project trees", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a project tree against the rule catalog
    Check {
        /// Root of the project to check
        #[arg(default_value = ".")]
        root: PathBuf,

        /// What to do with fixable findings
        #[arg(long, value_enum, default_value_t = Mode::Report)]
        mode: Mode,

        /// Only evaluate these categories
        #[arg(long = "category", value_delimiter = ',')]
        categories: Option<Vec<Category>>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (skips discovery)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rule catalog replacing the shipped one
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Worker threads (0 = available parallelism)
        #[arg(short, long, env = "CONFORMIST_JOBS")]
        jobs: Option<usize>,

        /// Disable colored output
        #[arg(long)]
        plain: bool,
    },

    /// Print the resolved rule catalog
    Rules {
        /// Project root used for configuration discovery
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Configuration file (skips discovery)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Rule catalog replacing the shipped one
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Disable colored output
        #[arg(long)]
        plain: bool,
    },

    /// Write a starter .conformist.toml
    Init {
        /// Directory to write the configuration into
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_parses_categories_and_mode() {
        let cli = Cli::try_parse_from([
            "conformist",
            "check",
            "proj",
            "--mode",
            "fix-dry-run",
            "--category",
            "imports,data-model",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbosity, 2);
        match cli.command {
            Commands::Check {
                root,
                mode,
                categories,
                ..
            } => {
                assert_eq!(root, PathBuf::from("proj"));
                assert_eq!(mode, Mode::FixDryRun);
                assert_eq!(categories, Some(vec![Category::Imports, Category::DataModel]));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_category_is_a_usage_error() {
        assert!(Cli::try_parse_from(["conformist", "check", "--category", "security"]).is_err());
    }

    #[test]
    fn definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

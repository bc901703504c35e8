use clap::Parser;
use conformist::cancel::CancellationToken;
use conformist::cli::{exit_code_for, init_logging, Cli, Commands, SETUP_EXIT_CODE};
use conformist::commands::{self, CheckConfig, RulesConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are not usage errors
            if !err.use_stderr() {
                let _ = err.print();
                return ExitCode::SUCCESS;
            }
            let _ = err.print();
            return ExitCode::from(SETUP_EXIT_CODE as u8);
        }
    };
    init_logging(cli.verbosity);

    let result = match cli.command {
        Commands::Check {
            root,
            mode,
            categories,
            format,
            output,
            config,
            catalog,
            jobs,
            plain,
        } => commands::run_check(
            CheckConfig {
                root,
                mode,
                categories,
                format,
                output,
                config,
                catalog,
                jobs,
                plain,
            },
            &CancellationToken::new(),
        ),
        Commands::Rules {
            root,
            format,
            config,
            catalog,
            plain,
        } => commands::list_rules(RulesConfig {
            root,
            format,
            config,
            catalog,
            plain,
        })
        .map(|()| 0),
        Commands::Init { root, force } => commands::init_config(&root, force).map(|_| 0),
    };

    match result {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(exit_code_for(&err) as u8)
        }
    }
}

//! Runtime setup for the binary: logging and exit codes.

use log::LevelFilter;

use crate::errors::Error;

/// Exit code for CLI usage errors and other failures before a run starts.
pub const SETUP_EXIT_CODE: i32 = 3;

/// Log level for a `-v` count. Warnings only by default.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Initialise `env_logger` on stderr. `RUST_LOG` overrides the verbosity
/// flag.
pub fn init_logging(verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level_for(verbosity))
        .format_timestamp(None)
        .target(env_logger::Target::Stderr);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }
    // A logger may already be installed when embedded; keep it
    let _ = builder.try_init();
}

/// Exit code for an error that ended the command. Library errors carry their
/// own classification; anything else happened during setup.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map(Error::exit_code)
        .unwrap_or(SETUP_EXIT_CODE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(level_for(0), LevelFilter::Warn);
        assert_eq!(level_for(1), LevelFilter::Info);
        assert_eq!(level_for(2), LevelFilter::Debug);
        assert_eq!(level_for(9), LevelFilter::Trace);
    }

    #[test]
    fn wrapped_library_errors_keep_their_code() {
        let err = Err::<(), _>(Error::Cancelled)
            .context("running check")
            .unwrap_err();
        assert_eq!(exit_code_for(&err), 1);
        assert_eq!(exit_code_for(&anyhow::anyhow!("bad flag")), SETUP_EXIT_CODE);
    }
}

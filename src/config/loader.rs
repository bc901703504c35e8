use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::ConformConfig;
use crate::errors::{Error, Result};

/// Name of the configuration file looked up from the scanned root upward
pub const CONFIG_FILE_NAME: &str = ".conformist.toml";

const MAX_TRAVERSAL_DEPTH: usize = 10;

pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Parse and validate config from a TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<ConformConfig> {
    let config = toml::from_str::<ConformConfig>(contents)?;
    config.validate()?;
    Ok(config)
}

/// Generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Find the nearest config file at or above `root`.
pub fn discover_config(root: &Path) -> Option<PathBuf> {
    let start = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

fn load_from_path(path: &Path) -> Result<ConformConfig> {
    let contents = read_config_file(path)
        .map_err(|e| Error::config_at(format!("cannot read file: {e}"), path))?;
    let mut config = parse_and_validate_config(&contents).map_err(|e| match e {
        Error::Config { message, .. } => Error::config_at(message, path),
        other => Error::config_at(other.to_string(), path),
    })?;

    // A relative catalog path is resolved against the config file's directory
    if let (Some(catalog), Some(dir)) = (config.catalog.path.as_mut(), path.parent()) {
        if catalog.is_relative() {
            *catalog = dir.join(&*catalog);
        }
    }
    Ok(config)
}

/// Load configuration for a run.
///
/// An explicit path must exist. Without one, the nearest `.conformist.toml` at or
/// above `root` is used, and defaults apply when none is found. Returns the
/// config together with the file it came from.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<(ConformConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(Error::config_at("config file not found", path));
        }
        return load_from_path(path).map(|c| (c, Some(path.to_path_buf())));
    }

    match discover_config(root) {
        Some(path) => {
            log::debug!("Loaded config from {}", path.display());
            load_from_path(&path).map(|c| (c, Some(path)))
        }
        None => {
            log::debug!(
                "No {} found within {} directories of {}; using defaults",
                CONFIG_FILE_NAME,
                MAX_TRAVERSAL_DEPTH,
                root.display()
            );
            Ok((ConformConfig::default(), None))
        }
    }
}

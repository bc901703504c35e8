use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE_NAME;

const STARTER_CONFIG: &str = r#"# conformist configuration

[project]
package_roots = ["src"]
domain_globs = ["src/*"]
extend_ignore = []
# jobs = 0 uses all available cores
jobs = 0

[[project.required_dirs]]
path = "tests"
marker = "__init__.py"

[imports]
local_prefixes = []
stdlib_extra = []

[configuration]
config_extensions = ["yaml", "yml", "json", "toml", "ini", "cfg", "conf", "env"]

# Lowest severity that fails a category. Configuration is fixed at warning.
[thresholds]
naming = "warning"
docstrings = "warning"

[catalog]
disable = []

[catalog.severity]
# "imports.unused" = "warning"
"#;

/// Write a starter configuration into `dir`. Returns the written path.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, STARTER_CONFIG)
        .with_context(|| format!("writing {}", config_path.display()))?;
    println!("Created {}", config_path.display());

    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_and_validate_config;
    use tempfile::TempDir;

    #[test]
    fn starter_config_is_valid() {
        parse_and_validate_config(STARTER_CONFIG).unwrap();
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "# mine\n").unwrap();

        assert!(init_config(dir.path(), false).is_err());
        assert_eq!(
            fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).unwrap(),
            "# mine\n"
        );

        init_config(dir.path(), true).unwrap();
        assert!(fs::read_to_string(dir.path().join(CONFIG_FILE_NAME))
            .unwrap()
            .contains("[project]"));
    }
}

//! Run configuration: `.conformist.toml` discovery, parsing and validation.

mod core;
mod loader;

pub use self::core::{
    CatalogOverrides, ConfigurationSafetyConfig, ConformConfig, ImportsConfig, ProjectConfig,
    RequiredDir,
};
pub use loader::{
    directory_ancestors, discover_config, load_config, parse_and_validate_config,
    CONFIG_FILE_NAME,
};

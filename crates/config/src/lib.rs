//! Configuration loading, env substitution, and validation.
//!
//! Config files: `reshare.toml`, `reshare.yaml`, `reshare.yml` or `reshare.json`
//! Searched in `./` then `~/.config/reshare/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod loader;
pub mod schema;
pub mod template;
pub mod validate;

pub use {
    loader::{
        config_dir, data_dir, default_database_path, find_config_file, init_config, load_config,
        load_or_discover,
    },
    schema::{
        ChannelsConfig, DatabaseConfig, KNOWN_CHANNELS, PublishingConfig, ReshareConfig,
        WindowConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{env_subst::substitute_env, schema::ReshareConfig, template::default_config_template};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "reshare.toml",
    "reshare.yaml",
    "reshare.yml",
    "reshare.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<ReshareConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))
}

/// Load the config at `explicit`, or discover one in the standard locations.
///
/// Search order when no path is given:
/// 1. `./reshare.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/reshare/reshare.{toml,yaml,yml,json}` (user-global)
///
/// Returns the defaults (and no path) when nothing is found. A file that
/// exists but does not parse is an error.
pub fn load_or_discover(explicit: Option<&Path>) -> anyhow::Result<(ReshareConfig, Option<PathBuf>)> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(),
    };
    match path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            let cfg = load_config(&path)?;
            Ok((cfg, Some(path)))
        },
        None => {
            debug!("no config file found, using defaults");
            Ok((ReshareConfig::default(), None))
        },
    }
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    // Project-local
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    // User-global: ~/.config/reshare/
    if let Some(config_dir) = config_dir() {
        for name in CONFIG_FILENAMES {
            let p = config_dir.join(name);
            if p.exists() {
                return Some(p);
            }
        }
    }

    None
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "reshare")
}

/// Returns the user-global config directory (`~/.config/reshare/`).
pub fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().to_path_buf())
}

/// Returns the user data directory (e.g. `~/.local/share/reshare/`).
pub fn data_dir() -> Option<PathBuf> {
    project_dirs().map(|d| d.data_dir().to_path_buf())
}

/// Database path from the config, falling back to `<data dir>/reshare.db`.
pub fn default_database_path(config: &ReshareConfig) -> PathBuf {
    if let Some(path) = &config.database.path {
        return path.clone();
    }
    data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("reshare.db")
}

/// Write the documented default template to `path` (or the user-global
/// location). Refuses to overwrite an existing file.
pub fn init_config(path: Option<&Path>) -> anyhow::Result<PathBuf> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reshare.toml"),
    };
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, default_config_template())?;
    debug!(path = %path.display(), "wrote default config");
    Ok(path)
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<ReshareConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reshare.toml");
        std::fs::write(
            &path,
            r#"
            [publishing]
            cooldown_minutes = 15

            [publishers.telegram]
            active = true
            chat_id = "42"
            "#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.publishing.cooldown_minutes, 15);
        assert_eq!(cfg.publishers.active_names(), vec!["telegram"]);
    }

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reshare.yaml");
        std::fs::write(
            &path,
            "publishing:\n  window:\n    begin: 22\n    end: 6\nnotifiers:\n  zulip:\n    active: true\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.publishing.window.begin, 22);
        assert!(cfg.notifiers.is_active("zulip"));
    }

    #[test]
    fn unsupported_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reshare.ini");
        std::fs::write(&path, "cooldown=1").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(load_or_discover(Some(&missing)).is_err());
    }

    #[test]
    fn init_writes_template_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("reshare.toml");

        let written = init_config(Some(&path)).unwrap();
        assert_eq!(written, path);
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.publishing.cooldown_minutes, 60);

        assert!(init_config(Some(&path)).is_err());
    }

    #[test]
    fn explicit_database_path_wins() {
        let mut cfg = ReshareConfig::default();
        cfg.database.path = Some(PathBuf::from("/tmp/custom.db"));
        assert_eq!(default_database_path(&cfg), PathBuf::from("/tmp/custom.db"));
    }
}

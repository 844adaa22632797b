use std::path::PathBuf;

use super::error::{ConfigError, ConfigResult};

/// Names an explicit config file, taking precedence over every other location.
pub static CONFIG_PATH_VAR: &str = "COURSEHUB_CONFIG";

static LOCAL_CONFIG: &str = "./config.toml";

/// Where the config file is expected, first match wins:
/// 1. `$COURSEHUB_CONFIG`
/// 2. `./config.toml` when `use_local` is set
/// 3. `$XDG_CONFIG_HOME/coursehub/config.toml`, then `~/.config/coursehub/config.toml`
///    (`%APPDATA%\coursehub\config.toml` on windows), if it exists
/// 4. `./config.toml`
pub fn find_config_file<F>(use_local: bool, lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(explicit) = lookup(CONFIG_PATH_VAR).filter(|p| !p.trim().is_empty()) {
        return PathBuf::from(explicit);
    }

    if use_local {
        return PathBuf::from(LOCAL_CONFIG);
    }

    let user_dir = if cfg!(windows) {
        lookup("APPDATA").map(PathBuf::from)
    } else {
        lookup("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| lookup("HOME").map(|home| PathBuf::from(home).join(".config")))
    };

    user_dir
        .map(|dir| dir.join(crate::APPLICATION_NAME).join("config.toml"))
        .filter(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG))
}

/// Raw bytes of the config file. A missing file is [`ConfigError::ConfigNotFound`]
/// so that callers can fall back to defaults.
pub fn read_config(use_local: bool) -> ConfigResult<Vec<u8>> {
    let path = find_config_file(use_local, |key| std::env::var(key).ok());
    tracing::trace!("looking for config at {}", path.display());

    match std::fs::read(&path) {
        Ok(bytes) => {
            tracing::debug!("using {} as configuration file", path.display());
            Ok(bytes)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::ConfigNotFound),
        Err(e) => Err(e.into()),
    }
}

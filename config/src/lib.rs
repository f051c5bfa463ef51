//! cursor-acp configuration.
//!
//! Two layers: [`load_and_apply`] merges `$XDG_CONFIG_HOME/cursor-acp/config.toml`
//! (`[env]` table) and a project `.env` into the process environment with
//! priority **existing env > .env > XDG**; [`Settings::from_env`] then parses
//! the daemon's environment variables into typed settings with defaults.

mod dotenv;
mod settings;
mod xdg_toml;

pub use settings::{BoundaryMode, Settings, ToolLoopMode};

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Applies config-file values to the process environment, only for keys that
/// are not already set.
///
/// When a key is missing from the environment, the `.env` value wins over the
/// XDG value. `override_dir` selects where `.env` is looked up (defaults to
/// the current directory).
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv::load_env_map(override_dir).map_err(LoadError::DotenvRead)?;

    let mut keys: std::collections::HashSet<&String> = xdg_map.keys().collect();
    keys.extend(dotenv_map.keys());

    for key in keys {
        if std::env::var(key).is_ok() {
            continue;
        }
        if let Some(value) = dotenv_map.get(key).or_else(|| xdg_map.get(key)) {
            std::env::set_var(key, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn restore_var(key: &str, prev: Option<String>) {
        match prev {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }
    }

    #[test]
    fn existing_env_wins() {
        env::set_var("ACP_CONFIG_TEST_EXISTING", "from_env");
        let _ = load_and_apply("cursor-acp", None);
        assert_eq!(
            env::var("ACP_CONFIG_TEST_EXISTING").as_deref(),
            Ok("from_env")
        );
        env::remove_var("ACP_CONFIG_TEST_EXISTING");
    }

    #[test]
    fn missing_config_is_ok() {
        assert!(load_and_apply("cursor-acp-nonexistent-app-xyz", None).is_ok());
    }

    #[test]
    fn dotenv_overrides_xdg() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let app_dir = xdg_dir.path().join("cursor-acp");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(
            app_dir.join("config.toml"),
            "[env]\nACP_CONFIG_TEST_PRIORITY = \"from_xdg\"\n",
        )
        .unwrap();

        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dotenv_dir.path().join(".env"),
            "ACP_CONFIG_TEST_PRIORITY=from_dotenv\n",
        )
        .unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        env::remove_var("ACP_CONFIG_TEST_PRIORITY");

        let _ = load_and_apply("cursor-acp", Some(dotenv_dir.path()));
        let val = env::var("ACP_CONFIG_TEST_PRIORITY").unwrap();
        env::remove_var("ACP_CONFIG_TEST_PRIORITY");
        restore_var("XDG_CONFIG_HOME", prev_xdg);

        assert_eq!(val, "from_dotenv");
    }

    #[test]
    fn invalid_xdg_toml_is_a_parse_error() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let app_dir = xdg_dir.path().join("cursor-acp");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.toml"), "invalid [[[\n").unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        let result = load_and_apply("cursor-acp", None);
        restore_var("XDG_CONFIG_HOME", prev_xdg);

        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }
}

use crate::error::ConfigError;
use std::path::PathBuf;

const DB_PATH_VAR: &str = "FAVORITES_DB_PATH";
const TEMPORARY_VAR: &str = "FAVORITES_TEMPORARY";
const DEFAULT_DB_PATH: &str = "favorites.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub temporary: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            temporary: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source, falling back to defaults
    /// for unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        if let Some(path) = lookup(DB_PATH_VAR).filter(|path| !path.is_empty()) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(value) = lookup(TEMPORARY_VAR) {
            config.temporary = parse_bool(TEMPORARY_VAR, &value)?;
        }
        Ok(config)
    }

    pub fn open(&self) -> sled::Result<sled::Db> {
        sled::Config::new()
            .path(&self.db_path)
            .temporary(self.temporary)
            .open()
    }
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: value.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn reads_variables() {
        let config = Config::from_lookup(lookup(&[
            ("FAVORITES_DB_PATH", "/tmp/favs"),
            ("FAVORITES_TEMPORARY", "TRUE"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/favs"));
        assert!(config.temporary);
    }

    #[test]
    fn rejects_bad_bool() {
        let err = Config::from_lookup(lookup(&[("FAVORITES_TEMPORARY", "maybe")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "FAVORITES_TEMPORARY must be a boolean, got \"maybe\""
        );
    }

    #[test]
    fn opens_temporary_db() {
        use crate::storage::KeyValueStore;
        let config = Config {
            db_path: std::env::temp_dir().join("movie-favorites-config-test"),
            temporary: true,
        };
        let db = config.open().unwrap();
        db.set("favorites_alice", "[]").unwrap();
        assert_eq!(db.get("favorites_alice").unwrap().as_deref(), Some("[]"));
    }
}

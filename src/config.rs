use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::identity::PasswordScheme;
use crate::security::PermissionTable;
use crate::storage::{FileStore, MemoryStore, SharedKv};

/// `data_dir` value (file or env) selecting the in-memory store.
pub const MEMORY_DATA_DIR: &str = ":memory:";

/// Application settings. Every field has a default so a partial JSON file is fine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory of the file-backed store; `None` keeps everything in memory.
    pub data_dir: Option<PathBuf>,
    pub password_scheme: PasswordScheme,
    /// Seed the three demo accounts into an empty credential store.
    pub seed_demo_accounts: bool,
    /// Optional JSON role table replacing the built-in one.
    pub permissions_file: Option<PathBuf>,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: Some(PathBuf::from("data")),
            password_scheme: PasswordScheme::Plaintext,
            seed_demo_accounts: true,
            permissions_file: None,
            log_level: "info".to_string(),
        }
    }
}

fn is_memory_dir(p: &Path) -> bool { p.as_os_str().to_str().is_some_and(|s| s.trim() == MEMORY_DATA_DIR) }

fn parse_bool(name: &str, raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AppError::config("config_env".to_string(), format!("{}: expected a boolean, got '{}'", name, other))),
    }
}

impl AppConfig {
    pub fn from_json_str(text: &str) -> AppResult<Self> {
        let mut cfg: Self =
            serde_json::from_str(text).map_err(|e| AppError::config("config_parse".to_string(), e.to_string()))?;
        if cfg.data_dir.as_deref().is_some_and(is_memory_dir) {
            cfg.data_dir = None;
        }
        Ok(cfg)
    }

    /// Defaults, overlaid with the JSON file if given, then with `CLAPPERBOARD_*` variables.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let mut cfg = match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)
                    .map_err(|e| AppError::config("config_read".to_string(), format!("{}: {}", p.display(), e)))?;
                Self::from_json_str(&text)?
            }
            None => Self::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok())?;
        Ok(cfg)
    }

    pub fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) -> AppResult<()> {
        if let Some(v) = lookup("CLAPPERBOARD_DATA_DIR") {
            let dir = PathBuf::from(v);
            self.data_dir = if is_memory_dir(&dir) { None } else { Some(dir) };
        }
        if let Some(v) = lookup("CLAPPERBOARD_PASSWORD_SCHEME") {
            self.password_scheme = PasswordScheme::parse(&v).ok_or_else(|| {
                AppError::config("config_env".to_string(), format!("CLAPPERBOARD_PASSWORD_SCHEME: unknown scheme '{}'", v))
            })?;
        }
        if let Some(v) = lookup("CLAPPERBOARD_SEED_DEMO") {
            self.seed_demo_accounts = parse_bool("CLAPPERBOARD_SEED_DEMO", &v)?;
        }
        if let Some(v) = lookup("CLAPPERBOARD_PERMISSIONS_FILE") {
            self.permissions_file = if v.trim().is_empty() { None } else { Some(PathBuf::from(v)) };
        }
        if let Some(v) = lookup("CLAPPERBOARD_LOG") {
            self.log_level = v;
        }
        Ok(())
    }

    /// Built-in table unless a permissions file is configured; a bad file is an error.
    pub fn permission_table(&self) -> AppResult<PermissionTable> {
        match &self.permissions_file {
            Some(p) => PermissionTable::load(p),
            None => Ok(PermissionTable::builtin()),
        }
    }

    pub fn open_store(&self) -> AppResult<SharedKv> {
        match &self.data_dir {
            Some(dir) => {
                let store = FileStore::open(dir)?;
                info!(path = %store.snapshot_path().display(), "using file store");
                Ok(Arc::new(store))
            }
            None => {
                info!("using in-memory store");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::KeyValueStore;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let m: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| m.get(k).cloned()
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = AppConfig::from_json_str(r#"{"password_scheme":"argon2"}"#).unwrap();
        assert_eq!(cfg.password_scheme, PasswordScheme::Argon2);
        assert!(cfg.seed_demo_accounts);
        assert_eq!(cfg.data_dir, Some(PathBuf::from("data")));
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn memory_marker_in_file_selects_memory_store() {
        let cfg = AppConfig::from_json_str(r#"{"data_dir":":memory:"}"#).unwrap();
        assert_eq!(cfg.data_dir, None);
        let cfg = AppConfig::from_json_str(r#"{"data_dir":"store"}"#).unwrap();
        assert_eq!(cfg.data_dir, Some(PathBuf::from("store")));

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("clapperboard.json");
        std::fs::write(&path, r#"{"data_dir":":memory:"}"#).unwrap();
        let cfg = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.data_dir, None);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = AppConfig::default();
        cfg.apply_env(env(&[
            ("CLAPPERBOARD_DATA_DIR", ":memory:"),
            ("CLAPPERBOARD_PASSWORD_SCHEME", "argon2"),
            ("CLAPPERBOARD_SEED_DEMO", "off"),
            ("CLAPPERBOARD_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(cfg.data_dir, None);
        assert_eq!(cfg.password_scheme, PasswordScheme::Argon2);
        assert!(!cfg.seed_demo_accounts);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn bad_env_values_are_errors() {
        let mut cfg = AppConfig::default();
        let err = cfg.apply_env(env(&[("CLAPPERBOARD_SEED_DEMO", "maybe")])).unwrap_err();
        assert_eq!(err.code_str(), "config_env");
        let err = cfg.apply_env(env(&[("CLAPPERBOARD_PASSWORD_SCHEME", "md5")])).unwrap_err();
        assert!(err.message().contains("md5"));
    }

    #[test]
    fn permission_table_defaults_to_builtin() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.permission_table().unwrap(), PermissionTable::builtin());
    }

    #[test]
    fn missing_permissions_file_is_an_error() {
        let cfg = AppConfig { permissions_file: Some(PathBuf::from("/nonexistent/roles.json")), ..AppConfig::default() };
        assert_eq!(cfg.permission_table().unwrap_err().code_str(), "permission_table_read");
    }

    #[test]
    fn open_store_in_memory_and_on_disk() {
        let mem = AppConfig { data_dir: None, ..AppConfig::default() }.open_store().unwrap();
        mem.set_item("k", "v").unwrap();
        assert_eq!(mem.get_item("k").as_deref(), Some("v"));

        let tmp = tempfile::tempdir().unwrap();
        let cfg = AppConfig { data_dir: Some(tmp.path().to_path_buf()), ..AppConfig::default() };
        cfg.open_store().unwrap().set_item("k", "v").unwrap();
        assert_eq!(cfg.open_store().unwrap().get_item("k").as_deref(), Some("v"));
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::categorizer::CategoryDictionary;
use crate::error::{ExtractoError, Result};
use crate::header::DEFAULT_SCAN_ROWS;

pub const DB_FILENAME: &str = "extracto.db";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir_string")]
    pub data_dir: String,
    #[serde(default = "default_scan_rows")]
    pub header_scan_rows: usize,
    /// JSON category dictionary replacing the built-in one.
    #[serde(default)]
    pub categories_file: Option<String>,
}

fn default_scan_rows() -> usize {
    DEFAULT_SCAN_ROWS
}

fn default_data_dir_string() -> String {
    default_data_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir_string(),
            header_scan_rows: default_scan_rows(),
            categories_file: None,
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(DB_FILENAME)
    }

    /// Dictionary to categorize with: `override_path` first, then the
    /// configured file, then the built-in one.
    pub fn dictionary(&self, override_path: Option<&Path>) -> Result<CategoryDictionary> {
        let configured = self.categories_file.as_deref().map(|p| PathBuf::from(shellexpand_path(p)));
        match override_path.map(Path::to_path_buf).or(configured) {
            Some(path) => CategoryDictionary::load(&path).map_err(|e| {
                ExtractoError::Settings(format!("category file {}: {e}", path.display()))
            }),
            None => Ok(CategoryDictionary::builtin()),
        }
    }
}

/// `EXTRACTO_CONFIG_DIR` relocates the config directory (used by tests).
fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("EXTRACTO_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("extracto")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("extracto")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if !path.exists() {
        return Settings::default();
    }
    let parsed = std::fs::read_to_string(&path)
        .map_err(ExtractoError::from)
        .and_then(|content| Ok(serde_json::from_str(&content)?));
    parsed.unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
        Settings::default()
    })
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| ExtractoError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            header_scan_rows: 40,
            categories_file: Some("/tmp/cats.json".to_string()),
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.header_scan_rows, 40);
        assert_eq!(loaded.categories_file.as_deref(), Some("/tmp/cats.json"));
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.header_scan_rows, 20);
        assert!(s.categories_file.is_none());
        assert!(s.data_dir.ends_with("extracto"));
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.header_scan_rows, DEFAULT_SCAN_ROWS);
        assert_eq!(s.db_path(), PathBuf::from("/tmp/test/extracto.db"));
    }

    #[test]
    fn test_dictionary_defaults_to_builtin() {
        let dict = Settings::default().dictionary(None).unwrap();
        assert_eq!(dict.categorize("Uber viaje"), "Transporte");
    }

    #[test]
    fn test_dictionary_from_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cats.json");
        std::fs::write(
            &path,
            r#"{
                "rules": [{"category": "Mascotas", "keywords": ["veterinaria"]}],
                "expense_categories": ["Mascotas"],
                "income_categories": []
            }"#,
        )
        .unwrap();
        let dict = Settings::default().dictionary(Some(&path)).unwrap();
        assert_eq!(dict.categorize("Veterinaria El Gato"), "Mascotas");
    }

    #[test]
    fn test_dictionary_missing_file_is_settings_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let err = Settings::default().dictionary(Some(&missing)).unwrap_err();
        assert!(matches!(err, ExtractoError::Settings(_)));
    }
}

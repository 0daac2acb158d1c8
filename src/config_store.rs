//! Single source of truth for the persisted dashboard document.
//!
//! Reads always succeed: a missing file bootstraps the default document,
//! and a broken file yields a visibly-labeled error document so the
//! dashboard still renders. Writes are fail-closed: nothing touches the
//! file until the document passes validation, and every save rewrites
//! the file in full (last writer wins, no locking).

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::models::{DashboardConfig, Service};
use crate::validator::{self, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the backing file. Never fails: the dashboard must always
    /// render something, so read-path problems degrade to a labeled
    /// error document instead of propagating.
    pub fn load(&self) -> DashboardConfig {
        if !self.path.exists() {
            let doc = DashboardConfig::default();
            match self.persist(&doc) {
                Ok(()) => tracing::info!("bootstrapped default config at {}", self.path.display()),
                Err(e) => tracing::warn!("first-run bootstrap write failed: {e}"),
            }
            return doc;
        }

        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("could not read {}: {e}", self.path.display());
                return error_document("Config Read Error");
            }
        };

        let raw: Value = match serde_yaml::from_str(&text) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!("could not parse {}: {e}", self.path.display());
                return error_document("Config Parse Error");
            }
        };

        match validator::validate(&raw) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!("config failed validation: {e}");
                error_document("Configuration Error")
            }
        }
    }

    /// Validate, then overwrite the whole file with the normalized
    /// document. Unknown fields in the input are dropped; the file is
    /// untouched when validation fails.
    pub fn save(&self, raw: &Value) -> Result<DashboardConfig, ConfigError> {
        let doc = validator::validate(raw)?;
        self.persist(&doc)?;
        Ok(doc)
    }

    /// Read-modify-write for internal bookkeeping patches (background
    /// active/history). Unlike `load`, a corrupt or invalid file is an
    /// error here: patching the fail-soft error document would persist
    /// it and wipe out whatever the user had on disk. Subject to the
    /// same last-writer-wins race as concurrent saves.
    pub fn update(
        &self,
        patch: impl FnOnce(&mut DashboardConfig),
    ) -> Result<DashboardConfig, ConfigError> {
        let mut doc = self.load_strict()?;
        patch(&mut doc);
        self.persist(&doc)?;
        Ok(doc)
    }

    /// Read and validate the backing file, propagating every failure
    /// instead of substituting the error document. A missing file still
    /// bootstraps the default.
    fn load_strict(&self) -> Result<DashboardConfig, ConfigError> {
        if !self.path.exists() {
            let doc = DashboardConfig::default();
            self.persist(&doc)?;
            tracing::info!("bootstrapped default config at {}", self.path.display());
            return Ok(doc);
        }
        let text = fs::read_to_string(&self.path)?;
        let raw: Value = serde_yaml::from_str(&text)?;
        Ok(validator::validate(&raw)?)
    }

    /// Verbatim file text, for the raw-YAML editor in the settings UI.
    pub fn raw(&self) -> Result<String, ConfigError> {
        Ok(fs::read_to_string(&self.path)?)
    }

    fn persist(&self, doc: &DashboardConfig) -> Result<(), ConfigError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        let yaml = serde_yaml::to_string(doc)?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }
}

fn error_document(title: &str) -> DashboardConfig {
    let mut doc = DashboardConfig::default();
    doc.title = title.to_string();
    doc.services = Some(vec![Service {
        name: "Invalid config - check server logs".to_string(),
        ..Default::default()
    }]);
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> ConfigStore {
        ConfigStore::new(dir.path().join("config").join("services.yml"))
    }

    #[test]
    fn missing_file_bootstraps_default_once() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let first = store.load();
        assert_eq!(first, DashboardConfig::default());
        assert!(store.path().exists());

        // The persisted bootstrap must satisfy later loads as-is.
        let on_disk = store.raw().unwrap();
        let second = store.load();
        assert_eq!(second, first);
        assert_eq!(store.raw().unwrap(), on_disk);
    }

    #[test]
    fn unparsable_file_degrades_to_error_document() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "title: [unclosed").unwrap();

        let doc = store.load();
        assert_eq!(doc.title, "Config Parse Error");
        let services = doc.services.unwrap();
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn invalid_schema_degrades_with_distinct_title() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "defaultColumns: \"four\"\n").unwrap();

        let doc = store.load();
        assert_eq!(doc.title, "Configuration Error");
        assert_eq!(doc.services.unwrap().len(), 1);
    }

    #[test]
    fn save_rejects_invalid_input_and_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.load(); // bootstrap
        let before = store.raw().unwrap();

        let bad: Value = serde_yaml::from_str("defaultColumns: \"four\"").unwrap();
        let err = store.save(&bad).unwrap_err();
        match err {
            ConfigError::Validation(e) => {
                assert_eq!(e.errors[0].path, "defaultColumns");
            }
            other => panic!("expected a validation error, got {other}"),
        }
        assert_eq!(store.raw().unwrap(), before);
    }

    #[test]
    fn save_persists_normalized_document_without_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let raw: Value = serde_yaml::from_str(
            r#"
title: Lab
bogusKey: 42
groups:
  - name: Media
    columns: 3
    services:
      - name: Test
        url: http://x
"#,
        )
        .unwrap();
        let saved = store.save(&raw).unwrap();
        assert_eq!(saved.groups[0].services[0].name, "Test");
        // theme omitted on save but default-filled in what was persisted
        assert_eq!(saved.theme.service_background, "#1f2937");

        let reloaded = store.load();
        assert_eq!(reloaded, saved);
        assert!(!store.raw().unwrap().contains("bogusKey"));
    }

    #[test]
    fn bookkeeping_patch_refuses_to_overwrite_a_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "title: [unclosed").unwrap();

        let result = store.update(|doc| doc.title = "patched".to_string());
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
        // the user's file is recoverable by hand; it must not be replaced
        assert_eq!(store.raw().unwrap(), "title: [unclosed");
    }

    #[test]
    fn bookkeeping_patch_refuses_an_invalid_document() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "defaultColumns: \"four\"\n").unwrap();

        let result = store.update(|doc| doc.title = "patched".to_string());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
        assert_eq!(store.raw().unwrap(), "defaultColumns: \"four\"\n");
    }

    #[test]
    fn bookkeeping_patch_bootstraps_a_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let patched = store.update(|doc| doc.title = "patched".to_string()).unwrap();
        assert_eq!(patched.title, "patched");
        assert_eq!(store.load().title, "patched");
    }

    #[test]
    fn concurrent_saves_are_last_writer_wins() {
        // Documents the accepted correctness gap: no locking, the second
        // write simply clobbers the first.
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        let a: Value = serde_yaml::from_str("title: First").unwrap();
        let b: Value = serde_yaml::from_str("title: Second").unwrap();
        store.save(&a).unwrap();
        store.save(&b).unwrap();
        assert_eq!(store.load().title, "Second");
    }
}

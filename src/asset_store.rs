//! Uploaded image files (icons and backgrounds) under two flat
//! directories, plus the background active/history bookkeeping in the
//! config document.
//!
//! Ordering on upload is file-write first, config-patch second: a crash
//! between the two leaves an orphaned file on disk, never a config entry
//! pointing at a file that does not exist. Uploads with an existing name
//! overwrite the old file.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config_store::{ConfigError, ConfigStore};
use crate::models::{Backgrounds, DashboardConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Icons,
    Backgrounds,
}

impl AssetKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "icons" => Some(Self::Icons),
            "backgrounds" => Some(Self::Backgrounds),
            _ => None,
        }
    }

    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Icons => "icons",
            Self::Backgrounds => "backgrounds",
        }
    }
}

/// Filesystem detail stays in the logs; callers only get the generic
/// variants below.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("invalid filename")]
    InvalidName,
    #[error("file not found")]
    NotFound,
    #[error("file operation failed")]
    Io(#[source] std::io::Error),
    #[error("could not update config")]
    Config(#[source] ConfigError),
}

pub struct AssetStore {
    root: PathBuf,
    config: Arc<ConfigStore>,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>, config: Arc<ConfigStore>) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    pub fn dir(&self, kind: AssetKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// Sorted directory listing, dot-prefixed entries excluded. A
    /// directory that does not exist yet lists as empty.
    pub fn list(&self, kind: AssetKind) -> Result<Vec<String>, AssetError> {
        let entries = match fs::read_dir(self.dir(kind)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(e)),
        };
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(io_error)?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            if entry.file_type().map_err(io_error)?.is_file() {
                files.push(name);
            }
        }
        files.sort();
        Ok(files)
    }

    /// Write uploaded bytes under a sanitized name. Identically named
    /// uploads overwrite. Background uploads then become the active
    /// background and join the history.
    pub fn upload(&self, kind: AssetKind, name: &str, bytes: &[u8]) -> Result<String, AssetError> {
        let filename = sanitize_filename(name).ok_or(AssetError::InvalidName)?;
        let dir = self.dir(kind);
        fs::create_dir_all(&dir).map_err(io_error)?;
        fs::write(dir.join(&filename), bytes).map_err(io_error)?;
        tracing::info!(kind = kind.dir_name(), file = %filename, "stored upload");

        if kind == AssetKind::Backgrounds {
            self.config
                .update(|doc| {
                    let b = doc.backgrounds.get_or_insert_with(Backgrounds::default);
                    if !b.history.iter().any(|f| f == &filename) {
                        b.history.push(filename.clone());
                    }
                    b.active = Some(filename.clone());
                })
                .map_err(config_error)?;
        }
        Ok(filename)
    }

    /// Remove a file. Deleting the active background promotes the first
    /// remaining history entry, or clears the selection when the history
    /// runs out.
    pub fn delete(&self, kind: AssetKind, name: &str) -> Result<(), AssetError> {
        let filename = sanitize_filename(name).ok_or(AssetError::InvalidName)?;
        match fs::remove_file(self.dir(kind).join(&filename)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(AssetError::NotFound),
            Err(e) => return Err(io_error(e)),
        }

        if kind == AssetKind::Backgrounds {
            self.config
                .update(|doc| {
                    if let Some(b) = doc.backgrounds.as_mut() {
                        b.history.retain(|f| f != &filename);
                        if b.active.as_deref() == Some(filename.as_str()) {
                            b.active = b.history.first().cloned();
                        }
                    }
                })
                .map_err(config_error)?;
        }
        Ok(())
    }

    /// Rename on disk and, for backgrounds, rewrite history/active
    /// references to match.
    pub fn rename(&self, kind: AssetKind, old: &str, new: &str) -> Result<String, AssetError> {
        let old_name = sanitize_filename(old).ok_or(AssetError::InvalidName)?;
        let new_name = sanitize_filename(new).ok_or(AssetError::InvalidName)?;
        let dir = self.dir(kind);
        match fs::rename(dir.join(&old_name), dir.join(&new_name)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(AssetError::NotFound),
            Err(e) => return Err(io_error(e)),
        }

        if kind == AssetKind::Backgrounds {
            self.config
                .update(|doc| {
                    if let Some(b) = doc.backgrounds.as_mut() {
                        for entry in b.history.iter_mut() {
                            if entry == &old_name {
                                *entry = new_name.clone();
                            }
                        }
                        if b.active.as_deref() == Some(old_name.as_str()) {
                            b.active = Some(new_name.clone());
                        }
                    }
                })
                .map_err(config_error)?;
        }
        Ok(new_name)
    }

    /// Select an already-uploaded background. Config patch only.
    pub fn set_active_background(&self, name: &str) -> Result<DashboardConfig, AssetError> {
        let filename = sanitize_filename(name).ok_or(AssetError::InvalidName)?;
        self.config
            .update(|doc| {
                let b = doc.backgrounds.get_or_insert_with(Backgrounds::default);
                b.active = Some(filename.clone());
            })
            .map_err(config_error)
    }
}

/// Reduce an incoming filename to its final path segment and the allowed
/// character set. Whatever survives cannot escape the target directory.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return None;
    }
    Some(cleaned)
}

fn io_error(e: std::io::Error) -> AssetError {
    tracing::error!("asset filesystem error: {e}");
    AssetError::Io(e)
}

fn config_error(e: ConfigError) -> AssetError {
    tracing::error!("background bookkeeping update failed: {e}");
    AssetError::Config(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stores(dir: &TempDir) -> AssetStore {
        let config = Arc::new(ConfigStore::new(dir.path().join("services.yml")));
        AssetStore::new(dir.path().join("public"), config)
    }

    fn backgrounds(store: &AssetStore) -> Backgrounds {
        store.config.load().backgrounds.unwrap()
    }

    #[test]
    fn sanitize_confines_path_traversal() {
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("..\\..\\boot.ini").as_deref(), Some("boot.ini"));
        assert_eq!(sanitize_filename("my icon (1).png").as_deref(), Some("myicon1.png"));
        assert_eq!(sanitize_filename("...."), None);
        assert_eq!(sanitize_filename("§§§"), None);
    }

    #[test]
    fn traversal_upload_lands_inside_the_target_directory() {
        let dir = TempDir::new().unwrap();
        let store = stores(&dir);

        let name = store
            .upload(AssetKind::Icons, "../../etc/passwd", b"x")
            .unwrap();
        assert_eq!(name, "passwd");
        assert!(store.dir(AssetKind::Icons).join("passwd").exists());
        assert!(!dir.path().join("etc").exists());
    }

    #[test]
    fn listing_is_sorted_and_hides_dotfiles() {
        let dir = TempDir::new().unwrap();
        let store = stores(&dir);
        assert!(store.list(AssetKind::Icons).unwrap().is_empty());

        store.upload(AssetKind::Icons, "b.png", b"x").unwrap();
        store.upload(AssetKind::Icons, "a.png", b"x").unwrap();
        fs::write(store.dir(AssetKind::Icons).join(".DS_Store"), b"x").unwrap();

        assert_eq!(store.list(AssetKind::Icons).unwrap(), vec!["a.png", "b.png"]);
    }

    #[test]
    fn background_upload_sets_active_and_appends_history() {
        let dir = TempDir::new().unwrap();
        let store = stores(&dir);

        store.upload(AssetKind::Backgrounds, "sunset.jpg", b"x").unwrap();
        store.upload(AssetKind::Backgrounds, "city.png", b"x").unwrap();
        let b = backgrounds(&store);
        assert_eq!(b.active.as_deref(), Some("city.png"));
        assert_eq!(b.history, vec!["sunset.jpg", "city.png"]);

        // re-upload of a known name overwrites and does not duplicate history
        store.upload(AssetKind::Backgrounds, "sunset.jpg", b"y").unwrap();
        let b = backgrounds(&store);
        assert_eq!(b.active.as_deref(), Some("sunset.jpg"));
        assert_eq!(b.history, vec!["sunset.jpg", "city.png"]);
    }

    #[test]
    fn deleting_active_background_falls_back_to_history() {
        let dir = TempDir::new().unwrap();
        let store = stores(&dir);
        store.upload(AssetKind::Backgrounds, "a.jpg", b"x").unwrap();
        store.upload(AssetKind::Backgrounds, "b.jpg", b"x").unwrap();

        store.delete(AssetKind::Backgrounds, "b.jpg").unwrap();
        let b = backgrounds(&store);
        assert_eq!(b.active.as_deref(), Some("a.jpg"));
        assert_eq!(b.history, vec!["a.jpg"]);

        store.delete(AssetKind::Backgrounds, "a.jpg").unwrap();
        let b = backgrounds(&store);
        assert_eq!(b.active, None);
        assert!(b.history.is_empty());
    }

    #[test]
    fn background_upload_does_not_clobber_a_corrupt_config() {
        let dir = TempDir::new().unwrap();
        let store = stores(&dir);
        fs::write(dir.path().join("services.yml"), "title: [unclosed").unwrap();

        let result = store.upload(AssetKind::Backgrounds, "a.jpg", b"x");
        assert!(matches!(result, Err(AssetError::Config(_))));
        // file-first ordering: the upload lands as an orphan, the
        // config file keeps the user's content
        assert!(store.dir(AssetKind::Backgrounds).join("a.jpg").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("services.yml")).unwrap(),
            "title: [unclosed"
        );
    }

    #[test]
    fn deleting_a_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = stores(&dir);
        assert!(matches!(
            store.delete(AssetKind::Icons, "ghost.png"),
            Err(AssetError::NotFound)
        ));
    }

    #[test]
    fn rename_updates_background_references() {
        let dir = TempDir::new().unwrap();
        let store = stores(&dir);
        store.upload(AssetKind::Backgrounds, "old.jpg", b"x").unwrap();

        let renamed = store
            .rename(AssetKind::Backgrounds, "old.jpg", "new name.jpg")
            .unwrap();
        assert_eq!(renamed, "newname.jpg");
        assert!(store.dir(AssetKind::Backgrounds).join("newname.jpg").exists());

        let b = backgrounds(&store);
        assert_eq!(b.active.as_deref(), Some("newname.jpg"));
        assert_eq!(b.history, vec!["newname.jpg"]);
    }

    #[test]
    fn set_active_is_a_config_only_patch() {
        let dir = TempDir::new().unwrap();
        let store = stores(&dir);
        store.upload(AssetKind::Backgrounds, "a.jpg", b"x").unwrap();
        store.upload(AssetKind::Backgrounds, "b.jpg", b"x").unwrap();

        store.set_active_background("a.jpg").unwrap();
        let b = backgrounds(&store);
        assert_eq!(b.active.as_deref(), Some("a.jpg"));
        assert_eq!(b.history, vec!["a.jpg", "b.jpg"]);
    }
}

//! Filesystem-backed vault store.
//!
//! [`LocalVault`] walks a root directory for files with the configured
//! extension, skipping dot-directories and any vault-relative path matching
//! an exclude glob. Deletion moves files into a trash directory inside the
//! vault (mirroring what sync-capable note apps do) unless permanent
//! deletion is configured.

use std::path::{Path, PathBuf};

use glob_match::glob_match;
use tracing::{debug, trace, warn};

use super::{FileRef, FileStore};
use crate::config::AppConfig;
use crate::errors::StoreError;

/// How many numbered fallback names to try when a trash destination exists.
const TRASH_RENAME_ATTEMPTS: u32 = 1000;

/// A vault rooted at a local directory.
pub struct LocalVault {
    root: PathBuf,
    extension: String,
    exclude: Vec<String>,
    trash_dir: PathBuf,
    permanent: bool,
}

impl LocalVault {
    /// Create a vault with default settings (`.md` files, trash in `.trash`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: ".md".into(),
            exclude: Vec::new(),
            trash_dir: PathBuf::from(".trash"),
            permanent: false,
        }
    }

    /// Create a vault from application configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            root: config.vault.root.clone(),
            extension: config.vault.extension.clone(),
            exclude: config.vault.exclude.clone(),
            trash_dir: config.cleanup.trash_dir.clone(),
            permanent: config.cleanup.permanent,
        }
    }

    /// Override the note extension (with leading dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Unlink deleted files instead of moving them to trash.
    pub fn with_permanent_delete(mut self, permanent: bool) -> Self {
        self.permanent = permanent;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, file: &FileRef) -> PathBuf {
        self.root.join(file.path())
    }

    fn excluded(&self, rel_path: &str) -> bool {
        self.exclude.iter().any(|pat| glob_match(pat, rel_path))
    }

    fn walk(&self, dir: &Path, out: &mut Vec<FileRef>) -> Result<(), StoreError> {
        let entries =
            std::fs::read_dir(dir).map_err(|e| StoreError::io(dir.display().to_string(), e))?;

        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(dir.display().to_string(), e))?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if path.is_dir() {
                // Dot-directories hold app state (.trash, .obsidian, .git),
                // never notes.
                if name.starts_with('.') {
                    trace!(dir = %path.display(), "skipping dot-directory");
                    continue;
                }
                self.walk(&path, out)?;
                continue;
            }

            if !name.ends_with(&self.extension) {
                continue;
            }

            let rel = match path.strip_prefix(&self.root) {
                Ok(rel) => rel,
                Err(_) => continue,
            };
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            if self.excluded(&rel) {
                trace!(path = %rel, "skipping excluded path");
                continue;
            }

            out.push(FileRef::new(rel));
        }

        Ok(())
    }

    /// Move a file into the trash directory, disambiguating collisions with
    /// a numeric suffix appended after the full filename (`Note.md.1`) so
    /// trashed files can never look like fresh conflict copies.
    fn move_to_trash(&self, file: &FileRef, abs: &Path) -> Result<(), StoreError> {
        let trash_root = self.root.join(&self.trash_dir);
        std::fs::create_dir_all(&trash_root)
            .map_err(|e| StoreError::io(trash_root.display().to_string(), e))?;

        let mut dest = trash_root.join(file.name());
        if dest.exists() {
            let mut found = false;
            for n in 1..=TRASH_RENAME_ATTEMPTS {
                let candidate = trash_root.join(format!("{}.{}", file.name(), n));
                if !candidate.exists() {
                    dest = candidate;
                    found = true;
                    break;
                }
            }
            if !found {
                return Err(StoreError::TrashCollision {
                    path: file.path().to_string(),
                    attempts: TRASH_RENAME_ATTEMPTS,
                });
            }
        }

        std::fs::rename(abs, &dest).map_err(|e| StoreError::io(file.path(), e))?;
        debug!(from = %file.path(), to = %dest.display(), "moved file to trash");
        Ok(())
    }
}

impl FileStore for LocalVault {
    fn list(&self) -> Result<Vec<FileRef>, StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::NotADirectory(self.root.display().to_string()));
        }

        let mut files = Vec::new();
        self.walk(&self.root, &mut files)?;
        debug!(count = files.len(), root = %self.root.display(), "vault enumerated");
        Ok(files)
    }

    fn read(&self, file: &FileRef) -> Result<Vec<u8>, StoreError> {
        let abs = self.absolute(file);
        std::fs::read(&abs).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::FileNotFound(file.path().to_string())
            } else {
                StoreError::io(file.path(), e)
            }
        })
    }

    fn delete(&self, file: &FileRef) -> Result<(), StoreError> {
        let abs = self.absolute(file);
        if !abs.exists() {
            return Err(StoreError::FileNotFound(file.path().to_string()));
        }

        if self.permanent {
            std::fs::remove_file(&abs).map_err(|e| StoreError::io(file.path(), e))?;
            debug!(path = %file.path(), "permanently deleted file");
            return Ok(());
        }

        if let Err(e) = self.move_to_trash(file, &abs) {
            warn!(path = %file.path(), error = %e, "trash move failed");
            return Err(e);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_list_filters_extension_and_dot_dirs() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Note.md", "a");
        write(tmp.path(), "image.png", "b");
        write(tmp.path(), "Daily/Todo.md", "c");
        write(tmp.path(), ".obsidian/workspace.md", "d");

        let vault = LocalVault::new(tmp.path());
        let mut paths: Vec<String> = vault
            .list()
            .unwrap()
            .into_iter()
            .map(|f| f.path().to_string())
            .collect();
        paths.sort();

        assert_eq!(paths, vec!["Daily/Todo.md", "Note.md"]);
    }

    #[test]
    fn test_list_honours_exclude_globs() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Note.md", "a");
        write(tmp.path(), "Templates/Daily.md", "b");

        let mut vault = LocalVault::new(tmp.path());
        vault.exclude = vec!["Templates/**".into()];

        let paths: Vec<String> = vault
            .list()
            .unwrap()
            .into_iter()
            .map(|f| f.path().to_string())
            .collect();
        assert_eq!(paths, vec!["Note.md"]);
    }

    #[test]
    fn test_list_missing_root_fails() {
        let vault = LocalVault::new("/nonexistent/vault/path");
        assert!(matches!(
            vault.list(),
            Err(StoreError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_delete_moves_to_trash() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Note 2.md", "dup");

        let vault = LocalVault::new(tmp.path());
        vault.delete(&FileRef::new("Note 2.md")).unwrap();

        assert!(!tmp.path().join("Note 2.md").exists());
        assert!(tmp.path().join(".trash/Note 2.md").exists());
    }

    #[test]
    fn test_delete_disambiguates_trash_collisions() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Note 2.md", "first");

        let vault = LocalVault::new(tmp.path());
        vault.delete(&FileRef::new("Note 2.md")).unwrap();

        write(tmp.path(), "Note 2.md", "second");
        vault.delete(&FileRef::new("Note 2.md")).unwrap();

        assert!(tmp.path().join(".trash/Note 2.md").exists());
        assert!(tmp.path().join(".trash/Note 2.md.1").exists());
    }

    #[test]
    fn test_permanent_delete_unlinks() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Note 2.md", "dup");

        let vault = LocalVault::new(tmp.path()).with_permanent_delete(true);
        vault.delete(&FileRef::new("Note 2.md")).unwrap();

        assert!(!tmp.path().join("Note 2.md").exists());
        assert!(!tmp.path().join(".trash").exists());
    }

    #[test]
    fn test_delete_missing_file_reports_not_found() {
        let tmp = TempDir::new().unwrap();
        let vault = LocalVault::new(tmp.path());
        assert!(matches!(
            vault.delete(&FileRef::new("gone.md")),
            Err(StoreError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_read_round_trip() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "Note.md", "hello");

        let vault = LocalVault::new(tmp.path());
        assert_eq!(vault.read(&FileRef::new("Note.md")).unwrap(), b"hello");
        assert!(matches!(
            vault.read(&FileRef::new("missing.md")),
            Err(StoreError::FileNotFound(_))
        ));
    }
}

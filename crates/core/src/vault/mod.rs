//! The vault storage boundary.
//!
//! The conflict core never touches the filesystem directly. It sees files
//! only as [`FileRef`] handles obtained from a [`FileStore`], and reads or
//! deletes content only through that trait. [`LocalVault`] is the
//! filesystem-backed implementation; tests substitute in-memory stores.

pub mod local;

pub use local::LocalVault;

use crate::errors::StoreError;

// ---------------------------------------------------------------------------
// FileRef
// ---------------------------------------------------------------------------

/// Opaque handle to a storage-backed file.
///
/// The `path` is the store's stable identifier for the file — vault-relative
/// with `/` separators for [`LocalVault`] — and is the only property the
/// conflict core inspects. Everything else (content, deletion) goes through
/// the owning [`FileStore`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    path: String,
}

impl FileRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The store-stable path string identifying this file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The final path component (filename including extension).
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

impl std::fmt::Display for FileRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Boundary contract for the external file storage collaborator.
///
/// Implementations must be safe to share across the resolver's comparison
/// workers. `read` and `delete` fail independently per file; only `list`
/// failures are hard failures for a run.
pub trait FileStore: Send + Sync {
    /// Enumerate every in-scope file. No ordering is guaranteed — callers
    /// that need determinism impose their own sort.
    fn list(&self) -> Result<Vec<FileRef>, StoreError>;

    /// Read the full raw content of a file.
    fn read(&self, file: &FileRef) -> Result<Vec<u8>, StoreError>;

    /// Remove a file (to trash or permanently, per the store's policy).
    fn delete(&self, file: &FileRef) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_ref_name() {
        assert_eq!(FileRef::new("Notes/Daily/Todo 2.md").name(), "Todo 2.md");
        assert_eq!(FileRef::new("Todo.md").name(), "Todo.md");
    }
}

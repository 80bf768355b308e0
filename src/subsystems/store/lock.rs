//! Advisory write lock held on `<store>.lock` for the duration of a write.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::core::error::AppError;

/// Lock file path for a store: `nodes.jsonl` → `nodes.jsonl.lock`.
pub fn lock_path_for(store: &Path) -> PathBuf {
    let mut name = store.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");
    store.with_file_name(name)
}

/// Exclusive lock guard. Released when dropped.
pub struct StoreLock {
    file: File,
}

impl StoreLock {
    pub fn acquire(store: &Path) -> Result<Self, AppError> {
        let path = lock_path_for(store);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| AppError::Store(format!("cannot open lock {}: {e}", path.display())))?;
        file.lock()
            .map_err(|e| AppError::Store(format!("cannot lock {}: {e}", path.display())))?;
        Ok(Self { file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_path_appends_suffix() {
        assert_eq!(lock_path_for(Path::new("/a/nodes.jsonl")), PathBuf::from("/a/nodes.jsonl.lock"));
    }

    #[test]
    fn lock_can_be_reacquired_after_drop() {
        let tmp = tempfile::TempDir::new().unwrap();
        let store = tmp.path().join("sub").join("nodes.jsonl");
        {
            let _g = StoreLock::acquire(&store).unwrap();
        }
        let _g = StoreLock::acquire(&store).unwrap();
        assert!(lock_path_for(&store).exists());
    }
}

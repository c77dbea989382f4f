// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockEntry {
    File,
    Dir,
}

/// In-memory filesystem that records which directories were created.
///
/// Clones share state, so a test can keep one handle and give another to the
/// code under test.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    created_dirs: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut entries = self.lock_entries();
        if let Some(parent) = path.parent() {
            Self::insert_dirs(&mut entries, parent);
        }
        entries.insert(path.to_path_buf(), MockEntry::File);
    }

    /// Directories passed to `create_dir_all`, in call order.
    pub fn created_dirs(&self) -> Vec<PathBuf> {
        self.created_dirs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn insert_dirs(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            entries.entry(ancestor.to_path_buf()).or_insert(MockEntry::Dir);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        {
            let mut entries = self.lock_entries();
            if let Some(MockEntry::File) = entries.get(path) {
                return Err(anyhow!("Not a directory: {:?}", path));
            }
            Self::insert_dirs(&mut entries, path);
        }
        self.created_dirs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_path_buf());
        Ok(())
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock_entries().get(path), Some(MockEntry::File))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock_entries().get(path), Some(MockEntry::Dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_dirs_include_parents() {
        let fs = MockFileSystem::new();
        fs.create_dir_all(Path::new("/b/1/extract/vol1")).unwrap();
        assert!(fs.is_dir(Path::new("/b/1/extract/vol1")));
        assert!(fs.is_dir(Path::new("/b/1")));
        assert_eq!(fs.created_dirs(), vec![PathBuf::from("/b/1/extract/vol1")]);
    }

    #[test]
    fn cannot_create_dir_over_a_file() {
        let fs = MockFileSystem::new();
        fs.add_file("/uploads/asset-1.tar");
        assert!(fs.is_file(Path::new("/uploads/asset-1.tar")));
        assert!(fs.create_dir_all(Path::new("/uploads/asset-1.tar")).is_err());
    }
}

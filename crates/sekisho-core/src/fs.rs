//! File-system collaborator used by the resolver and the export-map registry
//!
//! [`OsFileSystem`] goes to disk. [`MemoryFileSystem`] keeps files in memory with
//! a logical clock for modification times, which makes invalidation scenarios
//! deterministic and lets editor hosts serve unsaved buffers.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub trait FileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[derive(Debug, Clone)]
struct MemoryFile {
    content: String,
    modified: SystemTime,
}

#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RefCell<HashMap<PathBuf, MemoryFile>>,
    clock: Cell<u64>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `content` and advances the file's modification time.
    pub fn write(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let modified = self.tick();
        self.files.borrow_mut().insert(
            path.into(),
            MemoryFile {
                content: content.into(),
                modified,
            },
        );
    }

    /// Advances the modification time without touching the content.
    pub fn touch(&self, path: &Path) -> bool {
        let modified = self.tick();
        match self.files.borrow_mut().get_mut(path) {
            Some(file) => {
                file.modified = modified;
                true
            }
            None => false,
        }
    }

    /// Replaces the content while keeping the recorded modification time.
    pub fn write_preserving_mtime(&self, path: &Path, content: impl Into<String>) -> bool {
        match self.files.borrow_mut().get_mut(path) {
            Some(file) => {
                file.content = content.into();
                true
            }
            None => false,
        }
    }

    pub fn remove(&self, path: &Path) -> bool {
        self.files.borrow_mut().remove(path).is_some()
    }

    fn tick(&self) -> SystemTime {
        let next = self.clock.get() + 1;
        self.clock.set(next);
        UNIX_EPOCH + Duration::from_secs(next)
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files
            .borrow()
            .get(path)
            .map(|file| file.content.clone())
            .ok_or_else(|| not_found(path))
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        self.files
            .borrow()
            .get(path)
            .map(|file| file.modified)
            .ok_or_else(|| not_found(path))
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.borrow().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .borrow()
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_fs_reads_written_content() {
        let fs = MemoryFileSystem::new();
        fs.write("/src/a.js", "export const a = 1;");

        assert_eq!(
            fs.read_to_string(Path::new("/src/a.js")).unwrap(),
            "export const a = 1;"
        );
        assert!(fs.is_file(Path::new("/src/a.js")));
        assert!(fs.is_dir(Path::new("/src")));
        assert!(!fs.is_dir(Path::new("/src/a.js")));
    }

    #[test]
    fn memory_fs_missing_file_is_not_found() {
        let fs = MemoryFileSystem::new();

        let err = fs.read_to_string(Path::new("/nope.js")).unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(fs.modified(Path::new("/nope.js")).is_err());
    }

    #[test]
    fn every_write_advances_mtime() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/a.js");
        fs.write(path, "1");
        let first = fs.modified(path).unwrap();
        fs.write(path, "2");
        let second = fs.modified(path).unwrap();

        assert!(second > first);
    }

    #[test]
    fn touch_keeps_content() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/a.js");
        fs.write(path, "same");
        let before = fs.modified(path).unwrap();

        assert!(fs.touch(path));

        assert!(fs.modified(path).unwrap() > before);
        assert_eq!(fs.read_to_string(path).unwrap(), "same");
        assert!(!fs.touch(Path::new("/missing.js")));
    }

    #[test]
    fn write_preserving_mtime_keeps_clock() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("/a.js");
        fs.write(path, "old");
        let before = fs.modified(path).unwrap();

        assert!(fs.write_preserving_mtime(path, "new"));

        assert_eq!(fs.modified(path).unwrap(), before);
        assert_eq!(fs.read_to_string(path).unwrap(), "new");
    }

    #[test]
    fn os_fs_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.js");
        std::fs::write(&path, "export {};").unwrap();

        let fs = OsFileSystem;

        assert_eq!(fs.read_to_string(&path).unwrap(), "export {};");
        assert!(fs.modified(&path).is_ok());
        assert!(fs.is_file(&path));
        assert!(fs.is_dir(dir.path()));
    }
}

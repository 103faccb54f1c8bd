//! Access to source text, on disk or in memory.
//!
//! The pipeline never touches the file system directly: every read goes
//! through a `FileSpecification` handed out by the workspace, so editors can
//! overlay unsaved buffers on top of the disk.

use crate::error::CompileError;
use asc_scanner::{IncludeLoader, LoadedInclude};
use std::cell::Cell;
use std::fmt::Debug;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::UNIX_EPOCH;
use tracing::trace;

pub trait FileSpecification: Send + Sync + Debug {
    fn path(&self) -> &str;

    fn read(&self) -> Result<Arc<str>, CompileError>;

    /// Modification stamp; only compared for ordering.
    fn last_modified(&self) -> u64;
}

pub trait FileSpecificationGetter: Send + Sync {
    fn get_file_specification(&self, path: &str) -> Arc<dyn FileSpecification>;
}

/// Lexically normalized form of `path`: `.` dropped, `..` folded.
pub fn normalize_path(path: &str) -> String {
    let mut out = PathBuf::new();
    for component in Path::new(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out.to_string_lossy().replace('\\', "/")
}

#[derive(Debug, Clone)]
pub struct DiskFile {
    path: String,
}

impl DiskFile {
    pub fn new(path: &str) -> DiskFile {
        DiskFile {
            path: normalize_path(path),
        }
    }
}

impl FileSpecification for DiskFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn read(&self) -> Result<Arc<str>, CompileError> {
        std::fs::read_to_string(&self.path)
            .map(Arc::from)
            .map_err(|err| CompileError::io(self.path.clone(), err))
    }

    fn last_modified(&self) -> u64 {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map_or(0, |d| d.as_millis() as u64)
    }
}

/// An in-memory buffer. Every `set_text` bumps the modification stamp.
#[derive(Debug)]
pub struct MemoryFile {
    path: String,
    text: RwLock<Arc<str>>,
    modified: AtomicU64,
}

impl MemoryFile {
    pub fn new(path: &str, text: &str) -> MemoryFile {
        MemoryFile {
            path: normalize_path(path),
            text: RwLock::new(Arc::from(text)),
            modified: AtomicU64::new(1),
        }
    }

    pub fn set_text(&self, text: &str) {
        *self.text.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(text);
        self.modified.fetch_add(1, Ordering::AcqRel);
    }
}

impl FileSpecification for MemoryFile {
    fn path(&self) -> &str {
        &self.path
    }

    fn read(&self) -> Result<Arc<str>, CompileError> {
        Ok(self.text.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn last_modified(&self) -> u64 {
        self.modified.load(Ordering::Acquire)
    }
}

/// Resolves `include` targets relative to the including file through a
/// `FileSpecificationGetter`, tracking the newest modification stamp seen.
pub struct SpecIncludeLoader<'a> {
    getter: &'a dyn FileSpecificationGetter,
    newest: Cell<u64>,
}

impl<'a> SpecIncludeLoader<'a> {
    pub fn new(getter: &'a dyn FileSpecificationGetter) -> SpecIncludeLoader<'a> {
        SpecIncludeLoader {
            getter,
            newest: Cell::new(0),
        }
    }

    /// Newest stamp among the files loaded so far.
    pub fn newest_modified(&self) -> u64 {
        self.newest.get()
    }
}

impl IncludeLoader for SpecIncludeLoader<'_> {
    fn load(&self, including_file: &str, target: &str) -> Option<LoadedInclude> {
        let base = Path::new(including_file).parent().unwrap_or(Path::new(""));
        let path = normalize_path(&base.join(target).to_string_lossy());
        let spec = self.getter.get_file_specification(&path);
        let text = spec.read().ok()?;
        self.newest.set(self.newest.get().max(spec.last_modified()));
        trace!(including_file, target, path = %path, "loaded include");
        Some(LoadedInclude {
            path: Arc::from(spec.path()),
            text,
        })
    }
}

#[cfg(test)]
#[path = "../tests/file_spec_tests.rs"]
mod file_spec_tests;

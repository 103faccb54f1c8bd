//! The workspace: file access shared by every project, plus change tracking.
//!
//! Reads go to in-memory overlays first and to the disk otherwise. The
//! workspace also remembers which units pulled in which `include`d files, so
//! a change to an included file cleans its includers.

use crate::compilation_unit::CompilationUnit;
use crate::file_spec::{DiskFile, FileSpecification, FileSpecificationGetter, MemoryFile, normalize_path};
use crate::project::Project;
use asc_common::UnitId;
use dashmap::DashMap;
use rustc_hash::FxHashSet;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::{debug, info};

#[derive(Default)]
pub struct Workspace {
    overlays: DashMap<String, Arc<MemoryFile>>,
    projects: RwLock<Vec<Weak<Project>>>,
    /// Included file -> paths of the units including it.
    includes: DashMap<Arc<str>, FxHashSet<Arc<str>>>,
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("overlays", &self.overlays.len())
            .field("includes", &self.includes.len())
            .finish()
    }
}

impl Workspace {
    pub fn new() -> Workspace {
        Workspace::default()
    }

    pub(crate) fn add_project(&self, project: Weak<Project>) {
        self.projects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(project);
    }

    /// Live projects; dropped ones are forgotten.
    pub fn projects(&self) -> Vec<Arc<Project>> {
        let mut projects = self.projects.write().unwrap_or_else(PoisonError::into_inner);
        projects.retain(|p| p.strong_count() > 0);
        projects.iter().filter_map(Weak::upgrade).collect()
    }

    pub(crate) fn ensure_overlay(&self, path: &str, text: &str) {
        self.overlays
            .entry(normalize_path(path))
            .or_insert_with(|| Arc::new(MemoryFile::new(path, text)));
    }

    /// Overlay `path` with `text` and clean whatever depends on it.
    pub fn set_file_text(&self, path: &str, text: &str) -> Vec<Arc<CompilationUnit>> {
        let key = normalize_path(path);
        let existing = self.overlays.get(&key).map(|file| file.clone());
        match existing {
            Some(file) => file.set_text(text),
            None => {
                self.overlays.insert(key.clone(), Arc::new(MemoryFile::new(&key, text)));
            }
        }
        self.file_changed(&key)
    }

    /// Drop the overlay of `path`; reads fall back to the disk.
    pub fn remove_overlay(&self, path: &str) -> Vec<Arc<CompilationUnit>> {
        let key = normalize_path(path);
        if self.overlays.remove(&key).is_none() {
            return Vec::new();
        }
        self.file_changed(&key)
    }

    pub fn has_overlay(&self, path: &str) -> bool {
        self.overlays.contains_key(&normalize_path(path))
    }

    pub(crate) fn add_included_files(&self, unit_path: &str, files: &[Arc<str>]) {
        self.remove_included_files(unit_path);
        let unit_path: Arc<str> = Arc::from(unit_path);
        for file in files {
            self.includes
                .entry(Arc::from(normalize_path(file)))
                .or_default()
                .insert(unit_path.clone());
        }
    }

    pub(crate) fn remove_included_files(&self, unit_path: &str) {
        self.includes.retain(|_, includers| {
            includers.remove(unit_path);
            !includers.is_empty()
        });
    }

    /// Paths of the units whose last parse included `path`, sorted.
    pub fn units_including(&self, path: &str) -> Vec<Arc<str>> {
        let mut paths: Vec<Arc<str>> = self
            .includes
            .get(normalize_path(path).as_str())
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        paths.sort();
        paths
    }

    /// `path` changed. Its unit and the units including it lose their file
    /// scopes; units depending on any of them are cleaned but keep theirs.
    /// Returns every cleaned unit.
    pub fn file_changed(&self, path: &str) -> Vec<Arc<CompilationUnit>> {
        let path = normalize_path(path);
        let includers = self.units_including(&path);
        let mut cleaned = Vec::new();
        for project in self.projects() {
            let mut owners: Vec<Arc<CompilationUnit>> = project.unit_for_path(&path).into_iter().collect();
            owners.extend(includers.iter().filter_map(|p| project.unit_for_path(p)));
            owners.sort_by_key(|u| u.id());
            owners.dedup_by_key(|u| u.id());
            if owners.is_empty() {
                continue;
            }
            let ids: Vec<UnitId> = owners.iter().map(|u| u.id()).collect();
            // Edges disappear once the owners are cleaned.
            let dependents = project.invalidation_set(&ids);
            for unit in &owners {
                unit.clean(true);
            }
            for unit in dependents
                .into_iter()
                .filter(|id| !ids.contains(id))
                .filter_map(|id| project.unit(id))
            {
                unit.clean(false);
                cleaned.push(unit);
            }
            cleaned.extend(owners);
        }
        if !cleaned.is_empty() {
            info!(file = %path, cleaned = cleaned.len(), "file changed");
        }
        cleaned
    }

    /// `path` is gone: its units leave their projects.
    pub fn file_removed(&self, path: &str) -> Vec<Arc<CompilationUnit>> {
        let path = normalize_path(path);
        self.overlays.remove(&path);
        let mut cleaned = self.file_changed(&path);
        for project in self.projects() {
            if let Some(unit) = project.unit_for_path(&path) {
                project.remove_unit(unit.id());
                cleaned.retain(|u| !Arc::ptr_eq(u, &unit));
            }
        }
        debug!(file = %path, "file removed");
        cleaned
    }
}

impl FileSpecificationGetter for Workspace {
    fn get_file_specification(&self, path: &str) -> Arc<dyn FileSpecification> {
        let key = normalize_path(path);
        if let Some(file) = self.overlays.get(&key) {
            return file.clone();
        }
        Arc::new(DiskFile::new(&key))
    }
}

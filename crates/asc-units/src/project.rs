//! A project: compilation units sharing one symbol table.
//!
//! The project owns the units, the project-wide `ProjectScope`, the shared
//! reference cache, per-unit scope caches and the dependency graph. It is the
//! `ResolutionContext` every lookup runs against: asking it for another
//! unit's file scope runs (or waits for) that unit's file-scope request.

use crate::builtins::{BUILTIN_QNAMES, BUILTINS_PATH, BUILTINS_SOURCE};
use crate::codegen::{CodeGenerator, SummaryGenerator};
use crate::compilation_unit::{CompilationUnit, SwfTagsResult, UnitInit};
use crate::config::ProjectConfig;
use crate::dependency_graph::DependencyGraph;
use crate::error::CompileError;
use crate::file_spec::normalize_path;
use crate::request::CancelToken;
use crate::workspace::Workspace;
use asc_binder::{
    DefinitionOrigin, DefinitionPriority, FileScope, ProjectScope, ReferenceCache,
    ResolutionContext, ScopeCache,
};
use asc_common::{CompilerProblem, DependencyType, UnitId};
use dashmap::DashMap;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, Weak};
use tracing::{debug, debug_span, info, trace};
use walkdir::WalkDir;

/// Everything `build_all` produced.
#[derive(Debug, Default)]
pub struct BuildOutput {
    /// Built units, every unit after the units it inherits from.
    pub order: Vec<UnitId>,
    pub problems: Vec<CompilerProblem>,
    pub tags: Vec<Arc<SwfTagsResult>>,
}

impl BuildOutput {
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(CompilerProblem::is_error)
    }
}

pub struct Project {
    config: ProjectConfig,
    workspace: Arc<Workspace>,
    scope: ProjectScope,
    references: Arc<ReferenceCache>,
    units: RwLock<Vec<Option<Arc<CompilationUnit>>>>,
    by_path: DashMap<Arc<str>, UnitId>,
    by_qname: DashMap<Arc<str>, UnitId>,
    graph: RwLock<DependencyGraph>,
    scope_caches: DashMap<UnitId, Arc<ScopeCache>>,
    generator: Arc<dyn CodeGenerator>,
    cancel: CancelToken,
    manifest: DashMap<Arc<str>, Arc<str>>,
    next_order: AtomicU32,
    me: Weak<Project>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("config", &self.config)
            .field("units", &self.by_path.len())
            .finish()
    }
}

impl Project {
    pub fn new(config: ProjectConfig, workspace: Arc<Workspace>) -> Arc<Project> {
        Project::with_generator(config, workspace, Arc::new(SummaryGenerator))
    }

    pub fn with_generator(
        config: ProjectConfig,
        workspace: Arc<Workspace>,
        generator: Arc<dyn CodeGenerator>,
    ) -> Arc<Project> {
        let project = Arc::new_cyclic(|me| Project {
            config,
            workspace: workspace.clone(),
            scope: ProjectScope::new(),
            references: Arc::new(ReferenceCache::new()),
            units: RwLock::new(Vec::new()),
            by_path: DashMap::new(),
            by_qname: DashMap::new(),
            graph: RwLock::new(DependencyGraph::new()),
            scope_caches: DashMap::new(),
            generator,
            cancel: CancelToken::new(),
            manifest: DashMap::new(),
            next_order: AtomicU32::new(0),
            me: me.clone(),
        });
        workspace.add_project(Arc::downgrade(&project));
        workspace.ensure_overlay(BUILTINS_PATH, BUILTINS_SOURCE);
        project.register(UnitInit {
            id: UnitId::NONE,
            path: Arc::from(BUILTINS_PATH),
            priority: DefinitionPriority::new(DefinitionOrigin::Library, 0),
            qname: None,
            promises: BUILTIN_QNAMES.iter().map(|&q| Arc::from(q)).collect(),
            invisible: false,
        });
        project
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn workspace(&self) -> &Arc<Workspace> {
        &self.workspace
    }

    pub fn scope(&self) -> &ProjectScope {
        &self.scope
    }

    pub fn references(&self) -> &Arc<ReferenceCache> {
        &self.references
    }

    pub fn generator(&self) -> &dyn CodeGenerator {
        self.generator.as_ref()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Stop every running and waiting request.
    pub fn cancel(&self) {
        info!("build cancelled");
        self.cancel.cancel();
    }

    pub fn reset_cancel(&self) {
        self.cancel.reset();
    }

    pub fn dependency_graph(&self) -> RwLockReadGuard<'_, DependencyGraph> {
        self.graph.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Map a manifest name (component tag or alias) to a qname.
    pub fn add_manifest_entry(&self, name: &str, qname: &str) {
        self.manifest.insert(Arc::from(name), Arc::from(qname));
    }

    // =========================================================================
    // Units
    // =========================================================================

    fn register(&self, mut init: UnitInit) -> Arc<CompilationUnit> {
        let unit = {
            let mut units = self.units.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(id) = self.by_path.get(&init.path).map(|e| *e)
                && let Some(Some(existing)) = units.get(id.0 as usize)
            {
                return existing.clone();
            }
            init.id = UnitId(units.len() as u32);
            let unit = CompilationUnit::new(init, self.me.clone());
            units.push(Some(unit.clone()));
            self.by_path.insert(unit.path().clone(), unit.id());
            unit
        };
        if let Some(qname) = unit.qname() {
            self.by_qname.insert(qname.clone(), unit.id());
        }
        for qname in unit.promises() {
            self.scope.add_promise(unit.id(), qname, unit.priority());
        }
        self.graph
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_unit(unit.id());
        debug!(unit = %unit.path(), id = %unit.id(), "added compilation unit");
        unit
    }

    fn next_priority(&self, origin: DefinitionOrigin) -> DefinitionPriority {
        DefinitionPriority::new(origin, self.next_order.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn init(&self, path: &str, origin: DefinitionOrigin) -> UnitInit {
        UnitInit {
            id: UnitId::NONE,
            path: Arc::from(normalize_path(path)),
            priority: self.next_priority(origin),
            qname: None,
            promises: Vec::new(),
            invisible: false,
        }
    }

    /// A unit from the explicit source list.
    pub fn add_source_file(&self, path: &str) -> Arc<CompilationUnit> {
        self.register(self.init(path, DefinitionOrigin::SourceList))
    }

    pub fn add_library_file(&self, path: &str) -> Arc<CompilationUnit> {
        self.register(self.init(path, DefinitionOrigin::Library))
    }

    /// A unit compiled on its own: its definitions stay out of the
    /// project scope.
    pub fn add_invisible_file(&self, path: &str) -> Arc<CompilationUnit> {
        let mut init = self.init(path, DefinitionOrigin::SourceList);
        init.invisible = true;
        self.register(init)
    }

    /// A unit under source root `root`, promised to define the qname its
    /// relative path spells (`a/b/C.as` defines `a.b.C`).
    pub fn add_source_path_file(&self, root: &Path, path: &Path) -> Arc<CompilationUnit> {
        let mut init = self.init(&path.to_string_lossy(), DefinitionOrigin::SourcePath);
        if let Some(qname) = qname_for_source_path(root, path) {
            init.promises = vec![qname.clone()];
            init.qname = Some(qname);
        }
        self.register(init)
    }

    /// Add every unit named by the configuration.
    pub fn load_sources(&self) -> Result<Vec<Arc<CompilationUnit>>, CompileError> {
        let mut added = Vec::new();
        for path in &self.config.library_files {
            added.push(self.add_library_file(&path.to_string_lossy()));
        }
        for root in &self.config.source_path {
            for entry in WalkDir::new(root).sort_by_file_name() {
                let entry = entry.map_err(|err| {
                    let path = err
                        .path()
                        .unwrap_or(root)
                        .display()
                        .to_string();
                    CompileError::io(path, err.into())
                })?;
                let is_source = entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "as");
                if is_source {
                    added.push(self.add_source_path_file(root, entry.path()));
                }
            }
        }
        for path in &self.config.source_files {
            added.push(self.add_source_file(&path.to_string_lossy()));
        }
        info!(units = added.len(), "loaded sources");
        Ok(added)
    }

    pub fn unit(&self, id: UnitId) -> Option<Arc<CompilationUnit>> {
        if id.is_none() {
            return None;
        }
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.0 as usize)
            .cloned()
            .flatten()
    }

    pub fn unit_for_path(&self, path: &str) -> Option<Arc<CompilationUnit>> {
        let id = *self.by_path.get(normalize_path(path).as_str())?;
        self.unit(id)
    }

    /// The unit expected to define `qname`, from its source path location.
    pub fn unit_for_qname(&self, qname: &str) -> Option<Arc<CompilationUnit>> {
        let id = *self.by_qname.get(qname)?;
        self.unit(id)
    }

    /// Live units in id order; the builtin unit comes first.
    pub fn units(&self) -> Vec<Arc<CompilationUnit>> {
        self.units
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Drop a unit. Units depending on it are cleaned so they re-resolve.
    pub fn remove_unit(&self, id: UnitId) -> bool {
        let Some(unit) = self.unit(id) else {
            return false;
        };
        let dependents = self.invalidation_set(&[id]);
        unit.clean(true);
        self.scope.remove_unit(id, None);
        self.graph
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove_unit(id);
        if let Some(slot) = self
            .units
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(id.0 as usize)
        {
            *slot = None;
        }
        self.by_path.remove(unit.path());
        if let Some(qname) = unit.qname() {
            self.by_qname.remove(qname);
        }
        self.scope_caches.remove(&id);
        self.clean_units(dependents.iter().copied().filter(|&d| d != id));
        debug!(unit = %unit.path(), "removed compilation unit");
        true
    }

    /// Clean `ids`, keeping their file scopes.
    pub fn clean_units(&self, ids: impl IntoIterator<Item = UnitId>) {
        for unit in ids.into_iter().filter_map(|id| self.unit(id)) {
            unit.clean(false);
        }
    }

    /// Units to rebuild when `changed` change.
    pub fn invalidation_set(&self, changed: &[UnitId]) -> Vec<UnitId> {
        self.dependency_graph().compute_invalidation_set(changed)
    }

    pub(crate) fn remove_dependencies(&self, id: UnitId) {
        self.graph
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove_dependencies(id);
    }

    pub(crate) fn clear_scope_cache(&self, id: UnitId) {
        if let Some(cache) = self.scope_caches.get(&id) {
            cache.clear();
        }
    }

    // =========================================================================
    // Building
    // =========================================================================

    /// Build every source unit: file scopes of all units first, so every
    /// definition is registered, then the remaining requests. Problems come
    /// back in dependency order.
    pub fn build_all(&self) -> Result<BuildOutput, CompileError> {
        let _span = debug_span!("build_all").entered();
        let units = self.units();
        let parallel = self.config.parallel;

        let scopes: Vec<Result<(), CompileError>> = if parallel {
            units
                .par_iter()
                .map(|u| u.file_scope_result().map(|_| ()))
                .collect()
        } else {
            units.iter().map(|u| u.file_scope_result().map(|_| ())).collect()
        };
        if scopes.iter().any(|r| matches!(r, Err(CompileError::Cancelled))) {
            return Err(CompileError::Cancelled);
        }

        let targets: Vec<Arc<CompilationUnit>> = units
            .into_iter()
            .filter(|u| u.priority().origin != DefinitionOrigin::Library && !u.is_invisible())
            .collect();
        let built: Vec<(UnitId, Result<Vec<CompilerProblem>, CompileError>)> = if parallel {
            targets
                .par_iter()
                .map(|u| (u.id(), u.wait_for_build_finish()))
                .collect()
        } else {
            targets
                .iter()
                .map(|u| (u.id(), u.wait_for_build_finish()))
                .collect()
        };
        let mut problems_by_unit: FxHashMap<UnitId, Vec<CompilerProblem>> = FxHashMap::default();
        for (id, result) in built {
            problems_by_unit.insert(id, result?);
        }

        let roots: Vec<UnitId> = targets.iter().map(|u| u.id()).collect();
        let order: Vec<UnitId> = self
            .graph
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .topological_sort(&roots)
            .into_iter()
            .filter(|id| problems_by_unit.contains_key(id))
            .collect();

        let mut output = BuildOutput {
            order,
            ..BuildOutput::default()
        };
        for id in &output.order {
            output.problems.extend(problems_by_unit.remove(id).unwrap_or_default());
            if let Some(tags) = self.unit(*id).and_then(|u| u.swf_tags_result().ok()) {
                output.tags.push(tags);
            }
        }
        info!(
            units = output.order.len(),
            problems = output.problems.len(),
            "build finished"
        );
        Ok(output)
    }
}

impl ResolutionContext for Project {
    fn project_scope(&self) -> &ProjectScope {
        &self.scope
    }

    fn file_scope(&self, unit: UnitId) -> Option<Arc<FileScope>> {
        let unit = self.unit(unit)?;
        match unit.file_scope_result() {
            Ok(result) => Some(result.file_scope.clone()),
            Err(err) => {
                trace!(unit = %unit.path(), error = %err, "file scope unavailable");
                None
            }
        }
    }

    fn add_dependency(&self, from: UnitId, to: UnitId, dependency: DependencyType, qname: &str) {
        self.graph
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .add_dependency(from, to, dependency, qname);
    }

    fn scope_cache(&self, unit: UnitId) -> Option<Arc<ScopeCache>> {
        Some(
            self.scope_caches
                .entry(unit)
                .or_insert_with(|| Arc::new(ScopeCache::new()))
                .clone(),
        )
    }

    fn resolve_manifest(&self, name: &str) -> Option<Arc<str>> {
        self.manifest.get(name).map(|q| q.clone())
    }
}

/// `root/a/b/C.as` -> `a.b.C`.
fn qname_for_source_path(root: &Path, path: &Path) -> Option<Arc<str>> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(Arc::from(parts.join(".")))
}

#[cfg(test)]
#[path = "../tests/project_tests.rs"]
mod project_tests;

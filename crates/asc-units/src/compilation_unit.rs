//! A compilation unit and its request pipeline.
//!
//! Each unit answers five requests, each computed at most once per
//! invalidation through a `RequestSlot`:
//!
//! - syntax tree: parse (with includes), Bindable rewrite, reconnect an
//!   existing file scope to the new tree
//! - file scope: bind the tree and publish its definitions to the project
//! - outgoing dependencies: resolve declaration signatures, recording
//!   inheritance/signature/namespace edges, and collect semantic problems
//! - ABC bytes: run the code generator
//! - SWF tags: name the generated script
//!
//! Handlers get their prerequisites by calling the prerequisite request, so
//! asking for any result pulls in everything it needs. Once semantic problems
//! and ABC bytes are both done, the unit only keeps a weak reference to its
//! tree; `SyntaxTreeResult::ast` re-parses transparently if it was dropped.

use crate::bindable::apply_bindable_rewrite;
use crate::codegen::{AbcResult, EmbedDescriptor, GenerateInput};
use crate::config::Flavor;
use crate::error::CompileError;
use crate::file_spec::{FileSpecificationGetter, SpecIncludeLoader};
use crate::hard_to_weak::HardToWeak;
use crate::project::Project;
use crate::request::{Request, RequestSlot};
use asc_binder::{
    Definition, DefinitionKind, DefinitionPriority, FileScope, ProjectScope, Reference,
    ResolutionContext, ScopeCache, bind_file, find_property, reconnect, resolve_base_class,
};
use asc_common::limits::MAX_INHERITANCE_DEPTH;
use asc_common::problems::problem_codes;
use asc_common::{CompilerProblem, DependencyType, Span, UnitId};
use asc_parser::{FileNode, NodeIndex, ParseOptions, parse_file};
use bitflags::bitflags;
use rustc_hash::{FxHashSet, FxHasher};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::{debug, debug_span, trace, warn};

bitflags! {
    /// Operations a unit has completed since it was last cleaned.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Operations: u8 {
        const SYNTAX_TREE = 1 << 0;
        const FILE_SCOPE = 1 << 1;
        const SEMANTIC_PROBLEMS = 1 << 2;
        const ABC_BYTES = 1 << 3;
        const SWF_TAGS = 1 << 4;
    }
}

/// Both must be done before the tree is demoted to a weak reference.
const AST_RELEASE: Operations = Operations::SEMANTIC_PROBLEMS.union(Operations::ABC_BYTES);

// =============================================================================
// Request results
// =============================================================================

#[derive(Debug)]
pub struct SyntaxTreeResult {
    tree: HardToWeak<FileNode>,
    unit: Weak<CompilationUnit>,
    request: Weak<Request<SyntaxTreeResult>>,
    pub problems: Vec<CompilerProblem>,
    /// Every file spliced in by `include`, transitively.
    pub included_files: Vec<Arc<str>>,
    /// Newest modification stamp of the file and its includes.
    pub last_modified: u64,
}

impl SyntaxTreeResult {
    /// The tree, re-parsing the owning unit if it was dropped after
    /// eviction. Fails only when the unit itself is gone.
    pub fn ast(&self) -> Result<Arc<FileNode>, CompileError> {
        if let Some(tree) = self.tree.get() {
            return Ok(tree);
        }
        let unit = self.unit.upgrade().ok_or(CompileError::OrphanedResult)?;
        if let Some(request) = self.request.upgrade() {
            unit.syntax_tree.reset_if(&request);
        }
        debug!(unit = %unit.path, "syntax tree was evicted; re-parsing");
        let fresh = unit.syntax_tree_result()?;
        fresh.tree.get().ok_or(CompileError::OrphanedResult)
    }

    /// The tree is still reachable without re-parsing.
    pub fn is_ast_resident(&self) -> bool {
        self.tree.get().is_some()
    }
}

#[derive(Debug)]
pub struct FileScopeResult {
    pub file_scope: Arc<FileScope>,
    pub problems: Vec<CompilerProblem>,
}

#[derive(Debug)]
pub struct OutgoingDependenciesResult {
    pub problems: Vec<CompilerProblem>,
}

#[derive(Debug)]
pub struct SwfTagsResult {
    /// Script name: the externally visible qname with `.` turned into `/`.
    pub tag_name: Arc<str>,
    pub abc: Arc<AbcResult>,
}

impl SwfTagsResult {
    pub fn embeds(&self) -> &[EmbedDescriptor] {
        &self.abc.embeds
    }
}

// =============================================================================
// Compilation unit
// =============================================================================

pub struct CompilationUnit {
    id: UnitId,
    path: Arc<str>,
    priority: DefinitionPriority,
    /// Qname the unit is expected to define, when known from its location.
    qname: Option<Arc<str>>,
    /// Qnames registered as promises until the file scope is built.
    promises: Vec<Arc<str>>,
    /// Not part of the project's symbol table; bodies are parsed eagerly.
    invisible: bool,
    me: Weak<CompilationUnit>,
    project: Weak<Project>,
    operations: AtomicU8,
    pub(crate) syntax_tree: RequestSlot<SyntaxTreeResult>,
    pub(crate) file_scope: RequestSlot<FileScopeResult>,
    pub(crate) outgoing: RequestSlot<OutgoingDependenciesResult>,
    pub(crate) abc: RequestSlot<AbcResult>,
    pub(crate) tags: RequestSlot<SwfTagsResult>,
}

impl std::fmt::Debug for CompilationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompilationUnit")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("qname", &self.qname)
            .field("operations", &self.operations())
            .finish()
    }
}

/// How a unit enters the project.
#[derive(Debug, Clone)]
pub(crate) struct UnitInit {
    pub id: UnitId,
    pub path: Arc<str>,
    pub priority: DefinitionPriority,
    pub qname: Option<Arc<str>>,
    pub promises: Vec<Arc<str>>,
    pub invisible: bool,
}

impl CompilationUnit {
    pub(crate) fn new(init: UnitInit, project: Weak<Project>) -> Arc<CompilationUnit> {
        Arc::new_cyclic(|me| CompilationUnit {
            id: init.id,
            path: init.path,
            priority: init.priority,
            qname: init.qname,
            promises: init.promises,
            invisible: init.invisible,
            me: me.clone(),
            project,
            operations: AtomicU8::new(0),
            syntax_tree: RequestSlot::new(),
            file_scope: RequestSlot::new(),
            outgoing: RequestSlot::new(),
            abc: RequestSlot::new(),
            tags: RequestSlot::new(),
        })
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn path(&self) -> &Arc<str> {
        &self.path
    }

    pub fn priority(&self) -> DefinitionPriority {
        self.priority
    }

    pub fn qname(&self) -> Option<&Arc<str>> {
        self.qname.as_ref()
    }

    pub fn promises(&self) -> &[Arc<str>] {
        &self.promises
    }

    pub fn is_invisible(&self) -> bool {
        self.invisible
    }

    pub fn project(&self) -> Result<Arc<Project>, CompileError> {
        self.project.upgrade().ok_or(CompileError::ProjectDropped)
    }

    /// Stable name: a hash of the absolute path, then the file name with
    /// dots replaced by underscores.
    pub fn name(&self) -> String {
        let absolute = std::path::absolute(&*self.path)
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|_| self.path.to_string());
        let mut hasher = FxHasher::default();
        absolute.hash(&mut hasher);
        let file_name = Path::new(&*self.path)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{:016x}:{}", hasher.finish(), file_name.replace('.', "_"))
    }

    pub fn operations(&self) -> Operations {
        Operations::from_bits_truncate(self.operations.load(Ordering::Acquire))
    }

    fn mark(&self, done: Operations) {
        self.operations.fetch_or(done.bits(), Ordering::AcqRel);
    }

    // =========================================================================
    // Requests
    // =========================================================================

    pub fn syntax_tree_result(&self) -> Result<Arc<SyntaxTreeResult>, CompileError> {
        let project = self.project()?;
        let request = self.syntax_tree.current();
        request.get(&self.path, project.cancel_token(), || {
            self.compute_syntax_tree(&project, &request)
        })
    }

    /// The tree, parsing it if needed.
    pub fn ast(&self) -> Result<Arc<FileNode>, CompileError> {
        self.syntax_tree_result()?.ast()
    }

    pub fn file_scope_result(&self) -> Result<Arc<FileScopeResult>, CompileError> {
        let project = self.project()?;
        let request = self.file_scope.current();
        request.get(&self.path, project.cancel_token(), || {
            self.compute_file_scope(&project)
        })
    }

    pub fn outgoing_dependencies_result(&self) -> Result<Arc<OutgoingDependenciesResult>, CompileError> {
        let project = self.project()?;
        let request = self.outgoing.current();
        request.get(&self.path, project.cancel_token(), || {
            self.compute_outgoing(&project)
        })
    }

    pub fn abc_bytes_result(&self) -> Result<Arc<AbcResult>, CompileError> {
        let project = self.project()?;
        let request = self.abc.current();
        request.get(&self.path, project.cancel_token(), || self.compute_abc(&project))
    }

    pub fn swf_tags_result(&self) -> Result<Arc<SwfTagsResult>, CompileError> {
        let project = self.project()?;
        let request = self.tags.current();
        request.get(&self.path, project.cancel_token(), || self.compute_tags())
    }

    /// Embedded assets referenced by the generated script.
    pub fn get_embeds(&self) -> Result<Vec<EmbedDescriptor>, CompileError> {
        Ok(self.abc_bytes_result()?.embeds.clone())
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    fn compute_syntax_tree(
        &self,
        project: &Arc<Project>,
        request: &Arc<Request<SyntaxTreeResult>>,
    ) -> Result<SyntaxTreeResult, CompileError> {
        let _span = debug_span!("syntax_tree", unit = %self.path).entered();
        project.cancel_token().check()?;
        let workspace = project.workspace();
        let spec = workspace.get_file_specification(&self.path);

        let mut problems = Vec::new();
        let text = match spec.read() {
            Ok(text) => text,
            Err(err) => {
                warn!(unit = %self.path, error = %err, "cannot read compilation unit");
                problems.push(CompilerProblem::new(
                    problem_codes::FILE_NOT_FOUND,
                    &*self.path,
                    Span::default(),
                    &[&*self.path],
                ));
                Arc::from("")
            }
        };

        let loader = SpecIncludeLoader::new(workspace.as_ref());
        let options = ParseOptions {
            defer_function_bodies: project.config().defer_function_bodies && !self.invisible,
        };
        let mut tree = parse_file(self.path.clone(), text, Some(&loader), options);
        if project.config().flavor == Flavor::Royale {
            apply_bindable_rewrite(&mut tree);
        }
        let tree = Arc::new(tree);
        problems.extend(tree.problems().iter().cloned());

        let included_files = tree.included_files().to_vec();
        workspace.add_included_files(&self.path, &included_files);
        let last_modified = spec.last_modified().max(loader.newest_modified());

        if let Some(Ok(existing)) = self.file_scope.peek()
            && !reconnect(&existing.file_scope, &tree)
        {
            debug!(unit = %self.path, "declarations changed; dropping file scope");
            self.drop_file_scope(project);
        }
        project.clear_scope_cache(self.id);
        self.mark(Operations::SYNTAX_TREE);

        Ok(SyntaxTreeResult {
            tree: HardToWeak::new(tree),
            unit: self.me.clone(),
            request: Arc::downgrade(request),
            problems,
            included_files,
            last_modified,
        })
    }

    fn compute_file_scope(&self, project: &Arc<Project>) -> Result<FileScopeResult, CompileError> {
        let _span = debug_span!("file_scope", unit = %self.path).entered();
        let tree = self.ast()?;
        project.cancel_token().check()?;
        let file_scope = Arc::new(bind_file(self.id, &tree, project.references().clone()));
        if !self.invisible {
            let invalidated = project.scope().add_file_scope(&file_scope, self.priority);
            for unit in invalidated.iter().filter_map(|&id| project.unit(id)) {
                trace!(unit = %unit.path, "found a previously missing name; cleaning");
                unit.clean(false);
            }
        }
        self.mark(Operations::FILE_SCOPE);
        Ok(FileScopeResult {
            problems: file_scope.problems().to_vec(),
            file_scope,
        })
    }

    fn compute_outgoing(&self, project: &Arc<Project>) -> Result<OutgoingDependenciesResult, CompileError> {
        let _span = debug_span!("outgoing_dependencies", unit = %self.path).entered();
        let tree = self.ast()?;
        let file_scope = self.file_scope_result()?.file_scope.clone();
        self.start_import_discovery(project, &file_scope);
        project.cancel_token().check()?;

        let edges = PendingEdges::new(project);
        let mut checker = SignatureChecker {
            ctx: &edges,
            file_scope: &file_scope,
            tree: &tree,
            problems: Vec::new(),
        };
        for def in file_scope.definitions() {
            checker.check_definition(def);
        }
        checker.check_imports();
        let problems = checker.problems;
        project.cancel_token().check()?;
        edges.publish();

        drop(tree);
        self.mark(Operations::SEMANTIC_PROBLEMS);
        self.remove_ast();
        Ok(OutgoingDependenciesResult { problems })
    }

    fn compute_abc(&self, project: &Arc<Project>) -> Result<AbcResult, CompileError> {
        let _span = debug_span!("abc_bytes", unit = %self.path).entered();
        let tree = self.ast()?;
        let file_scope = self.file_scope_result()?.file_scope.clone();
        let mut result = project.generator().generate(&GenerateInput {
            ctx: project.as_ref(),
            unit: self.id,
            file_name: &self.path,
            tree: &tree,
            file_scope: &file_scope,
            strict: project.config().strict,
        })?;
        project.cancel_token().check()?;
        let mut problems = tree.body_problems();
        problems.append(&mut result.problems);
        result.problems = problems;

        drop(tree);
        self.mark(Operations::ABC_BYTES);
        self.remove_ast();
        Ok(result)
    }

    fn compute_tags(&self) -> Result<SwfTagsResult, CompileError> {
        let abc = self.abc_bytes_result()?;
        let file_scope = self.file_scope_result()?.file_scope.clone();
        let tag_name: Arc<str> = Arc::from(self.externally_visible_name(&file_scope).replace('.', "/"));
        self.mark(Operations::SWF_TAGS);
        Ok(SwfTagsResult { tag_name, abc })
    }

    /// The qname expected from the unit's location, else the first
    /// externally visible definition by (start offset, qname), else `name()`.
    pub fn externally_visible_name(&self, file_scope: &FileScope) -> String {
        if let Some(qname) = &self.qname {
            return qname.to_string();
        }
        file_scope
            .externally_visible()
            .first()
            .map(|def| def.qname().to_string())
            .unwrap_or_else(|| self.name())
    }

    /// Build file scopes of units defining explicitly imported names in the
    /// background.
    fn start_import_discovery(&self, project: &Arc<Project>, file_scope: &FileScope) {
        for import in file_scope.imports() {
            if import.wildcard {
                continue;
            }
            let Some(unit) = project.unit_for_qname(&import.name) else {
                continue;
            };
            if unit.id == self.id || unit.file_scope.is_done() {
                continue;
            }
            trace!(import = %import.name, unit = %unit.path, "eager file scope");
            rayon::spawn(move || {
                let _ = unit.file_scope_result();
            });
        }
    }

    /// Demote the tree to a weak reference once nothing downstream needs it.
    fn remove_ast(&self) {
        if !self.operations().contains(AST_RELEASE) {
            return;
        }
        if let Some(Ok(syntax)) = self.syntax_tree.peek() {
            trace!(unit = %self.path, "releasing syntax tree");
            syntax.tree.make_weak();
        }
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    /// Forget computed results. Outgoing edges, the scope cache and every
    /// downstream request go; with `clear_file_scope` the tree and file scope
    /// go too and the unit's definitions leave the project scope.
    pub fn clean(&self, clear_file_scope: bool) {
        let Some(project) = self.project.upgrade() else {
            return;
        };
        debug!(unit = %self.path, clear_file_scope, "clean");
        project.remove_dependencies(self.id);
        let kept = if clear_file_scope {
            project.workspace().remove_included_files(&self.path);
            self.withdraw_definitions(&project);
            self.file_scope.reset();
            self.syntax_tree.reset();
            Operations::empty()
        } else {
            Operations::SYNTAX_TREE | Operations::FILE_SCOPE
        };
        self.outgoing.reset();
        self.abc.reset();
        self.tags.reset();
        self.operations.fetch_and(kept.bits(), Ordering::AcqRel);
        project.clear_scope_cache(self.id);
    }

    /// A re-parse declared different things: the old file scope cannot be
    /// reconnected and everything derived from it is stale.
    fn drop_file_scope(&self, project: &Project) {
        project.remove_dependencies(self.id);
        self.withdraw_definitions(project);
        self.file_scope.reset();
        self.outgoing.reset();
        self.abc.reset();
        self.tags.reset();
        self.operations
            .fetch_and(Operations::SYNTAX_TREE.bits(), Ordering::AcqRel);
    }

    fn withdraw_definitions(&self, project: &Project) {
        project.scope().remove_unit(self.id, None);
        for qname in &self.promises {
            project.scope().add_promise(self.id, qname, self.priority);
        }
    }

    // =========================================================================
    // Build orchestration
    // =========================================================================

    /// Issue every request on the rayon pool without waiting.
    pub fn start_build_async(&self) {
        let Some(unit) = self.me.upgrade() else {
            return;
        };
        let spawn = |f: fn(&CompilationUnit)| {
            let unit = unit.clone();
            rayon::spawn(move || f(&unit));
        };
        spawn(|u| {
            let _ = u.syntax_tree_result();
        });
        spawn(|u| {
            let _ = u.file_scope_result();
        });
        spawn(|u| {
            let _ = u.outgoing_dependencies_result();
        });
        spawn(|u| {
            let _ = u.abc_bytes_result();
        });
        spawn(|u| {
            let _ = u.swf_tags_result();
        });
    }

    /// Wait for every request and gather their problems. Cancellation is an
    /// error; an internal failure becomes an internal-error problem.
    pub fn wait_for_build_finish(&self) -> Result<Vec<CompilerProblem>, CompileError> {
        let mut problems = Vec::new();
        if let Some(r) = self.gather(self.syntax_tree_result(), &mut problems)? {
            problems.extend(r.problems.iter().cloned());
        }
        let file_scope = self.gather(self.file_scope_result(), &mut problems)?;
        if let Some(r) = &file_scope {
            problems.extend(r.problems.iter().cloned());
        }
        if let Some(r) = self.gather(self.outgoing_dependencies_result(), &mut problems)? {
            problems.extend(r.problems.iter().cloned());
        }
        if let Some(r) = self.gather(self.abc_bytes_result(), &mut problems)? {
            problems.extend(r.problems.iter().cloned());
        }
        // Bodies are bound during code generation.
        if let Some(r) = &file_scope {
            problems.extend(r.file_scope.body_problems());
        }
        self.gather(self.swf_tags_result(), &mut problems)?;

        let mut seen = FxHashSet::default();
        problems.retain(|p| seen.insert(p.clone()));
        Ok(problems)
    }

    fn gather<T>(
        &self,
        result: Result<Arc<T>, CompileError>,
        problems: &mut Vec<CompilerProblem>,
    ) -> Result<Option<Arc<T>>, CompileError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(CompileError::Cancelled) => Err(CompileError::Cancelled),
            Err(err) => {
                let (unit, message) = match &err {
                    CompileError::Internal { unit, message } => (unit.clone(), message.clone()),
                    other => (self.path.to_string(), other.to_string()),
                };
                problems.push(CompilerProblem::new(
                    problem_codes::INTERNAL_ERROR,
                    &*self.path,
                    Span::default(),
                    &[unit.as_str(), message.as_str()],
                ));
                Ok(None)
            }
        }
    }
}

// =============================================================================
// Declaration checks of the outgoing-dependencies request
// =============================================================================

/// Dependency edges found by a computation, held back until it completes so
/// a cancelled run leaves the graph untouched.
struct PendingEdges<'a> {
    project: &'a Project,
    edges: Mutex<Vec<(UnitId, UnitId, DependencyType, Arc<str>)>>,
}

impl<'a> PendingEdges<'a> {
    fn new(project: &'a Project) -> PendingEdges<'a> {
        PendingEdges {
            project,
            edges: Mutex::new(Vec::new()),
        }
    }

    fn publish(self) {
        let edges = self.edges.into_inner().unwrap_or_else(PoisonError::into_inner);
        for (from, to, dependency, qname) in edges {
            self.project.add_dependency(from, to, dependency, &qname);
        }
    }
}

impl ResolutionContext for PendingEdges<'_> {
    fn project_scope(&self) -> &ProjectScope {
        self.project.project_scope()
    }

    fn file_scope(&self, unit: UnitId) -> Option<Arc<FileScope>> {
        self.project.file_scope(unit)
    }

    fn add_dependency(&self, from: UnitId, to: UnitId, dependency: DependencyType, qname: &str) {
        self.edges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((from, to, dependency, Arc::from(qname)));
    }

    fn scope_cache(&self, unit: UnitId) -> Option<Arc<ScopeCache>> {
        self.project.scope_cache(unit)
    }

    fn resolve_manifest(&self, name: &str) -> Option<Arc<str>> {
        self.project.resolve_manifest(name)
    }
}

struct SignatureChecker<'a> {
    ctx: &'a dyn ResolutionContext,
    file_scope: &'a FileScope,
    tree: &'a FileNode,
    problems: Vec<CompilerProblem>,
}

impl SignatureChecker<'_> {
    fn check_definition(&mut self, def: &Arc<Definition>) {
        match def.kind {
            DefinitionKind::Class | DefinitionKind::Interface => {
                let base_node = self.decl_field(def, |d| d.base);
                if let Some(base) = def.base_ref() {
                    let found = self.resolve(def, base, DependencyType::Inheritance, base_node);
                    if let Some(found) = found
                        && found.kind != DefinitionKind::Class
                    {
                        self.report(
                            problem_codes::BASE_NOT_A_CLASS,
                            base_node,
                            def,
                            &[&**def.base_name(), &**found.qname()],
                        );
                    }
                }
                let interface_nodes: Vec<NodeIndex> = self
                    .tree
                    .arena()
                    .decl(def.node().node)
                    .map(|d| d.interfaces.clone())
                    .unwrap_or_default();
                for (i, reference) in def.interface_refs().iter().enumerate() {
                    let node = interface_nodes.get(i).copied().unwrap_or(NodeIndex::NONE);
                    self.resolve(def, reference, DependencyType::Inheritance, node);
                }
                if def.kind == DefinitionKind::Class && self.is_circular(def) {
                    self.report(problem_codes::CIRCULAR_INHERITANCE, base_node, def, &[&**def.qname()]);
                }
            }
            kind if kind.is_variable() || kind.is_function() => {
                if let Some(ty) = def.type_ref() {
                    let node = self.decl_field(def, |d| d.type_annotation);
                    self.resolve(def, ty, DependencyType::Signature, node);
                }
            }
            _ => {}
        }
        if let asc_binder::NamespaceKey::Custom(ns) = def.namespace() {
            find_property(
                self.ctx,
                self.file_scope,
                def.containing_scope(),
                ns,
                Some(DependencyType::Namespace),
                true,
                false,
            );
        }
    }

    /// Resolve a declaration-level type reference, reporting failures.
    fn resolve(
        &mut self,
        def: &Definition,
        reference: &Reference,
        dependency: DependencyType,
        node: NodeIndex,
    ) -> Option<Arc<Definition>> {
        if matches!(reference, Reference::NotAType(_)) {
            return None;
        }
        let found = reference.resolve(
            self.ctx,
            self.file_scope,
            def.containing_scope(),
            Some(dependency),
            true,
        );
        let name = reference.name();
        match found {
            Some(found) if found.is_ambiguous() => {
                self.report(problem_codes::AMBIGUOUS_REFERENCE, node, def, &[&*name]);
                None
            }
            Some(found) => Some(found),
            None => {
                let code = match reference {
                    Reference::Parameterized(p)
                        if p
                            .base
                            .resolve(self.ctx, self.file_scope, def.containing_scope(), None, true)
                            .is_some_and(|b| &**b.qname() != "Vector") =>
                    {
                        problem_codes::INVALID_TYPE_APPLICATION
                    }
                    _ => problem_codes::UNRESOLVED_TYPE,
                };
                self.report(code, node, def, &[&*name]);
                None
            }
        }
    }

    /// `class` reaches itself through its base classes.
    fn is_circular(&self, class: &Arc<Definition>) -> bool {
        let mut seen: FxHashSet<*const Definition> = FxHashSet::default();
        let mut current = resolve_base_class(self.ctx, self.file_scope, class);
        for _ in 0..MAX_INHERITANCE_DEPTH {
            let Some(base) = current else {
                return false;
            };
            if Arc::ptr_eq(&base, class) {
                return true;
            }
            if !seen.insert(Arc::as_ptr(&base)) {
                // A cycle further up that `class` is not part of.
                return false;
            }
            let Some(base_scope) = self.ctx.file_scope(base.unit()) else {
                return false;
            };
            current = resolve_base_class(self.ctx, &base_scope, &base);
        }
        true
    }

    fn check_imports(&mut self) {
        let project = self.ctx.project_scope();
        for import in self.file_scope.imports() {
            let known = if import.wildcard {
                project.is_package(&import.name)
            } else {
                project.contains_qname(&import.name) || self.ctx.resolve_manifest(&import.name).is_some()
            };
            if !known {
                let shown = if import.wildcard {
                    format!("{}.*", import.name)
                } else {
                    import.name.to_string()
                };
                self.problems.push(
                    CompilerProblem::new(
                        problem_codes::UNRESOLVED_IMPORT,
                        &**self.file_scope.file_name(),
                        import.span,
                        &[&shown],
                    )
                    .locate(self.tree.lookup()),
                );
            }
        }
    }

    fn decl_field(&self, def: &Definition, field: impl Fn(&asc_parser::DeclData) -> NodeIndex) -> NodeIndex {
        let r = def.node();
        if r.in_body() {
            return NodeIndex::NONE;
        }
        self.tree.arena().decl(r.node).map_or(NodeIndex::NONE, field)
    }

    fn report(&mut self, code: u32, node: NodeIndex, def: &Definition, args: &[&str]) {
        let span = self
            .tree
            .arena()
            .get(node)
            .map_or_else(|| def.span(), |n| n.span());
        self.problems.push(
            CompilerProblem::new(code, &**self.file_scope.file_name(), span, args)
                .locate(self.tree.lookup()),
        );
    }
}

#[cfg(test)]
#[path = "../tests/compilation_unit_tests.rs"]
mod compilation_unit_tests;

//! Lexical scopes and the per-file scope table.
//!
//! A `FileScope` owns every scope of one compilation unit in an append-only
//! table addressed by `ScopeId`; scope 0 is the file scope itself. Scopes are
//! immutable once published. Function bodies get their own scope, populated
//! the first time something asks for a scope inside the body, so deferred
//! bodies stay unparsed until then.

use crate::definitions::Definition;
use crate::namespace::{NamespaceKey, OpenNamespaces};
use crate::reference_cache::ReferenceCache;
use asc_common::{CompilerProblem, Span, UnitId};
use asc_parser::{FileNode, NodeIndex, NodeRef};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use tracing::trace;

/// Index of a scope inside its `FileScope`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const NONE: ScopeId = ScopeId(u32::MAX);
    pub const FILE: ScopeId = ScopeId(0);

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeKind {
    File,
    Package,
    Class,
    Interface,
    /// Parameters of a function.
    Function,
    /// Locals of a function body.
    FunctionBody,
    Catch,
    /// `with (obj)`: names may resolve dynamically against `obj`.
    With,
}

impl ScopeKind {
    /// Scopes whose redeclared `var`s and functions merge instead of conflicting.
    pub fn allows_redeclaration(self) -> bool {
        matches!(
            self,
            ScopeKind::File | ScopeKind::Function | ScopeKind::FunctionBody
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportDirective {
    /// Dotted name as written, without `.*`.
    pub name: Arc<str>,
    pub wildcard: bool,
    pub span: Span,
}

impl ImportDirective {
    /// Package the import opens.
    pub fn package(&self) -> &str {
        if self.wildcard {
            &self.name
        } else {
            crate::namespace::split_qname(&self.name).0
        }
    }

    /// Imported base name for explicit imports.
    pub fn base_name(&self) -> Option<&str> {
        if self.wildcard {
            None
        } else {
            Some(crate::namespace::split_qname(&self.name).1)
        }
    }
}

#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: ScopeId,
    pub node: NodeRef,
    definitions: FxHashMap<Arc<str>, SmallVec<[Arc<Definition>; 1]>>,
    /// Definitions in population (source) order.
    order: Vec<Arc<Definition>>,
    imports: Vec<ImportDirective>,
    used_namespaces: Vec<Arc<str>>,
    package_name: Option<Arc<str>>,
    /// Class, interface or function that owns this scope.
    owner: Option<Arc<Definition>>,
}

impl Scope {
    pub(crate) fn new(kind: ScopeKind, parent: ScopeId, node: NodeRef) -> Scope {
        Scope {
            kind,
            parent,
            node,
            definitions: FxHashMap::default(),
            order: Vec::new(),
            imports: Vec::new(),
            used_namespaces: Vec::new(),
            package_name: None,
            owner: None,
        }
    }

    pub(crate) fn add_definition(&mut self, def: Arc<Definition>) {
        self.definitions
            .entry(def.base_name().clone())
            .or_default()
            .push(def.clone());
        self.order.push(def);
    }

    pub(crate) fn add_import(&mut self, import: ImportDirective) {
        self.imports.push(import);
    }

    pub(crate) fn add_used_namespace(&mut self, name: Arc<str>) {
        self.used_namespaces.push(name);
    }

    pub(crate) fn set_package_name(&mut self, name: Arc<str>) {
        self.package_name = Some(name);
    }

    pub(crate) fn set_owner(&mut self, owner: Arc<Definition>) {
        self.owner = Some(owner);
    }

    /// Definitions declared directly in this scope under `name`, in
    /// declaration order.
    pub fn get(&self, name: &str) -> &[Arc<Definition>] {
        self.definitions.get(name).map_or(&[], |defs| defs.as_slice())
    }

    pub fn definitions(&self) -> &[Arc<Definition>] {
        &self.order
    }

    pub fn imports(&self) -> &[ImportDirective] {
        &self.imports
    }

    pub fn used_namespaces(&self) -> &[Arc<str>] {
        &self.used_namespaces
    }

    pub fn package_name(&self) -> Option<&Arc<str>> {
        self.package_name.as_ref()
    }

    pub fn owner(&self) -> Option<&Arc<Definition>> {
        self.owner.as_ref()
    }
}

/// Lazily populated body of one function.
#[derive(Debug)]
pub(crate) struct BodySlot {
    pub(crate) function_scope: ScopeId,
    pub(crate) block: NodeIndex,
    pub(crate) cell: OnceCell<ScopeId>,
}

/// All scopes and definitions of one compilation unit.
#[derive(Debug)]
pub struct FileScope {
    unit: UnitId,
    file_name: Arc<str>,
    scopes: RwLock<Vec<Arc<Scope>>>,
    node_scopes: RwLock<FxHashMap<NodeRef, ScopeId>>,
    /// Keyed by the function node in the file arena.
    pub(crate) bodies: FxHashMap<NodeIndex, BodySlot>,
    /// Serializes body population so scope ids are allocated in one place.
    pub(crate) body_population: Mutex<()>,
    /// File-arena definitions in population order.
    definitions: Vec<Arc<Definition>>,
    open_sets: RwLock<FxHashMap<ScopeId, Arc<OpenNamespaces>>>,
    tree: RwLock<Weak<FileNode>>,
    pub(crate) references: Arc<ReferenceCache>,
    problems: Vec<CompilerProblem>,
    pub(crate) body_problems: Mutex<Vec<CompilerProblem>>,
}

impl FileScope {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        unit: UnitId,
        file_name: Arc<str>,
        scopes: Vec<Scope>,
        node_scopes: FxHashMap<NodeRef, ScopeId>,
        bodies: FxHashMap<NodeIndex, BodySlot>,
        definitions: Vec<Arc<Definition>>,
        tree: Weak<FileNode>,
        references: Arc<ReferenceCache>,
        problems: Vec<CompilerProblem>,
    ) -> FileScope {
        FileScope {
            unit,
            file_name,
            scopes: RwLock::new(scopes.into_iter().map(Arc::new).collect()),
            node_scopes: RwLock::new(node_scopes),
            bodies,
            body_population: Mutex::new(()),
            definitions,
            open_sets: RwLock::new(FxHashMap::default()),
            tree: RwLock::new(tree),
            references,
            problems,
            body_problems: Mutex::new(Vec::new()),
        }
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    pub fn file_name(&self) -> &Arc<str> {
        &self.file_name
    }

    pub fn references(&self) -> &Arc<ReferenceCache> {
        &self.references
    }

    pub fn scope(&self, id: ScopeId) -> Option<Arc<Scope>> {
        if id.is_none() {
            return None;
        }
        self.scopes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.0 as usize)
            .cloned()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub(crate) fn next_scope_id(&self) -> u32 {
        self.scope_count() as u32
    }

    /// Publish body scopes built by the binder.
    pub(crate) fn publish(&self, scopes: Vec<Scope>, node_scopes: FxHashMap<NodeRef, ScopeId>) {
        {
            let mut table = self.scopes.write().unwrap_or_else(PoisonError::into_inner);
            table.extend(scopes.into_iter().map(Arc::new));
        }
        self.node_scopes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(node_scopes);
    }

    /// Scope owned by exactly this node, if it owns one.
    pub fn scope_for_node(&self, node: NodeRef) -> Option<ScopeId> {
        self.node_scopes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&node)
            .copied()
    }

    /// Innermost scope enclosing `node`, populating function bodies on the
    /// way down as needed.
    pub fn scope_at(&self, file: &FileNode, node: NodeRef) -> ScopeId {
        // Bodies of file-level functions on the ancestor path come first.
        let mut current = node;
        while current.is_some() {
            if !current.in_body() && self.bodies.contains_key(&current.node) {
                self.ensure_body(file, current.node);
            }
            current = file.parent(current);
        }
        let mut current = node;
        while current.is_some() {
            if let Some(id) = self.scope_for_node(current) {
                return id;
            }
            current = file.parent(current);
        }
        ScopeId::FILE
    }

    /// Body scope of a file-level function, populating it on first use.
    pub fn body_scope(&self, file: &FileNode, function: NodeIndex) -> Option<ScopeId> {
        self.bodies.contains_key(&function).then(|| self.ensure_body(file, function))
    }

    pub fn is_body_populated(&self, function: NodeIndex) -> bool {
        self.bodies
            .get(&function)
            .is_some_and(|slot| slot.cell.get().is_some())
    }

    fn ensure_body(&self, file: &FileNode, function: NodeIndex) -> ScopeId {
        let Some(slot) = self.bodies.get(&function) else {
            return ScopeId::NONE;
        };
        *slot.cell.get_or_init(|| {
            trace!(file = %self.file_name, function = function.0, "populating body scope");
            crate::state::populate_body(self, file, slot)
        })
    }

    /// Populate every function body now.
    pub fn populate_all_bodies(&self, file: &FileNode) {
        let mut functions: Vec<NodeIndex> = self.bodies.keys().copied().collect();
        functions.sort();
        for function in functions {
            self.ensure_body(file, function);
        }
    }

    /// File-arena definitions in population order (members included).
    pub fn definitions(&self) -> &[Arc<Definition>] {
        &self.definitions
    }

    /// Package-level definitions visible outside this unit, ordered by
    /// (start offset, qname).
    pub fn externally_visible(&self) -> Vec<Arc<Definition>> {
        let mut visible: Vec<Arc<Definition>> = self
            .definitions
            .iter()
            .filter(|def| {
                matches!(
                    def.namespace(),
                    NamespaceKey::Public(_) | NamespaceKey::Internal(_)
                ) && self
                    .scope(def.containing_scope())
                    .is_some_and(|s| s.kind == ScopeKind::Package)
            })
            .cloned()
            .collect();
        visible.sort_by(|a, b| {
            a.start()
                .cmp(&b.start())
                .then_with(|| a.qname().cmp(b.qname()))
        });
        visible
    }

    /// Import directives of the file and package scopes.
    pub fn imports(&self) -> Vec<ImportDirective> {
        let table = self.scopes.read().unwrap_or_else(PoisonError::into_inner);
        table
            .iter()
            .filter(|s| matches!(s.kind, ScopeKind::File | ScopeKind::Package | ScopeKind::Class))
            .flat_map(|s| s.imports.iter().cloned())
            .collect()
    }

    /// Names opened by `use namespace` anywhere outside function bodies.
    pub fn used_namespaces(&self) -> Vec<Arc<str>> {
        let table = self.scopes.read().unwrap_or_else(PoisonError::into_inner);
        table
            .iter()
            .flat_map(|s| s.used_namespaces.iter().cloned())
            .collect()
    }

    /// Namespaces open at `scope`. Imports of the file scope do not apply
    /// inside a package.
    pub fn open_namespaces(&self, scope: ScopeId) -> Arc<OpenNamespaces> {
        if let Some(open) = self
            .open_sets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&scope)
        {
            return open.clone();
        }
        let open = Arc::new(self.compute_open_namespaces(scope));
        self.open_sets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(scope, open.clone());
        open
    }

    fn compute_open_namespaces(&self, scope: ScopeId) -> OpenNamespaces {
        let chain = self.chain(scope);
        let in_package = chain.iter().any(|(_, s)| s.kind == ScopeKind::Package);
        let mut open = OpenNamespaces::new();
        open.open(NamespaceKey::public_root());
        open.open(NamespaceKey::FilePrivate(self.unit));
        if !in_package {
            open.open(NamespaceKey::Internal(Arc::from("")));
        }
        for (_, s) in &chain {
            match s.kind {
                ScopeKind::Package => {
                    let pkg = s.package_name.clone().unwrap_or_else(|| Arc::from(""));
                    open.open(NamespaceKey::Public(pkg.clone()));
                    open.open(NamespaceKey::Internal(pkg));
                }
                ScopeKind::Class | ScopeKind::Interface => {
                    if let Some(owner) = &s.owner {
                        open.open(NamespaceKey::Private(owner.qname().clone()));
                        open.open(NamespaceKey::Protected(owner.qname().clone()));
                    }
                }
                _ => {}
            }
            if !(s.kind == ScopeKind::File && in_package) {
                for import in &s.imports {
                    match import.base_name() {
                        Some(base) => open.open_for_name(import.package(), base),
                        None => open.open(NamespaceKey::Public(Arc::from(import.package()))),
                    }
                }
            }
            for ns in &s.used_namespaces {
                open.open(NamespaceKey::Custom(ns.clone()));
            }
        }
        open
    }

    /// `scope` and its ancestors, innermost first.
    pub fn chain(&self, scope: ScopeId) -> Vec<(ScopeId, Arc<Scope>)> {
        let mut chain = Vec::new();
        let mut current = scope;
        let mut guard = 0u32;
        while let Some(s) = self.scope(current) {
            let parent = s.parent;
            chain.push((current, s));
            current = parent;
            guard += 1;
            if guard > asc_common::limits::MAX_SCOPE_WALK_ITERATIONS {
                break;
            }
        }
        chain
    }

    /// Package the scope belongs to (`""` outside any package block).
    pub fn package_of(&self, scope: ScopeId) -> Arc<str> {
        self.chain(scope)
            .iter()
            .find_map(|(_, s)| s.package_name.clone())
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Enclosing class or interface definition.
    pub fn enclosing_class(&self, scope: ScopeId) -> Option<Arc<Definition>> {
        self.chain(scope)
            .into_iter()
            .find(|(_, s)| matches!(s.kind, ScopeKind::Class | ScopeKind::Interface))
            .and_then(|(_, s)| s.owner.clone())
    }

    // =========================================================================
    // Syntax tree link
    // =========================================================================

    /// The tree this scope was built from or last reconnected to, if it is
    /// still alive.
    pub fn tree(&self) -> Option<Arc<FileNode>> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner).upgrade()
    }

    pub(crate) fn attach_tree(&self, tree: Weak<FileNode>) {
        *self.tree.write().unwrap_or_else(PoisonError::into_inner) = tree;
    }

    /// Problems found while populating file-level scopes.
    pub fn problems(&self) -> &[CompilerProblem] {
        &self.problems
    }

    /// Problems found while populating function bodies so far.
    pub fn body_problems(&self) -> Vec<CompilerProblem> {
        self.body_problems
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

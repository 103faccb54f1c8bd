//! Scope population.
//!
//! `BinderState` walks a syntax tree once and produces scopes and
//! definitions. The file-level pass stops at function bodies and leaves a
//! `BodySlot` per function; `populate_body` later binds one body into scopes
//! appended to the same `FileScope`. Function expressions and functions
//! nested inside a body are bound eagerly with their enclosing body.

use crate::definitions::{
    Definition, DefinitionFlags, DefinitionInit, DefinitionKind, ParamInfo,
};
use crate::namespace::{NamespaceKey, make_qname};
use crate::reference_cache::ReferenceCache;
use crate::references::Reference;
use crate::scopes::{BodySlot, FileScope, ImportDirective, Scope, ScopeId, ScopeKind};
use asc_common::problems::problem_codes;
use asc_common::{CompilerProblem, Span, UnitId};
use asc_parser::{
    AccessorKind, DeclData, FileNode, MetaTagData, ModifierFlags, NodeFlags, NodeIndex, NodeKind,
    NodeRef,
};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use std::sync::{Arc, PoisonError};
use tracing::{debug, debug_span, trace};

/// Where declarations encountered during the walk go.
#[derive(Clone)]
struct BindContext {
    /// Innermost lexical scope.
    scope: ScopeId,
    /// Scope receiving `var` and function declarations.
    var_scope: ScopeId,
    /// Kind of `var_scope`.
    var_kind: ScopeKind,
    /// Enclosing class or interface.
    class: Option<Arc<Definition>>,
    package: Arc<str>,
}

pub(crate) struct BinderState<'a> {
    unit: UnitId,
    file: &'a FileNode,
    refs: &'a ReferenceCache,
    /// Id of `scopes[0]`.
    base_id: u32,
    scopes: Vec<Scope>,
    node_scopes: FxHashMap<NodeRef, ScopeId>,
    bodies: FxHashMap<NodeIndex, BodySlot>,
    definitions: Vec<Arc<Definition>>,
    problems: Vec<CompilerProblem>,
    /// File-level pass: bodies of file-arena functions become slots.
    defer_bodies: bool,
}

impl<'a> BinderState<'a> {
    fn new(
        unit: UnitId,
        file: &'a FileNode,
        refs: &'a ReferenceCache,
        base_id: u32,
        defer_bodies: bool,
    ) -> BinderState<'a> {
        BinderState {
            unit,
            file,
            refs,
            base_id,
            scopes: Vec::new(),
            node_scopes: FxHashMap::default(),
            bodies: FxHashMap::default(),
            definitions: Vec::new(),
            problems: Vec::new(),
            defer_bodies,
        }
    }

    // =========================================================================
    // Scope table
    // =========================================================================

    fn push_scope(&mut self, kind: ScopeKind, parent: ScopeId, node: NodeRef) -> ScopeId {
        let id = ScopeId(self.base_id + self.scopes.len() as u32);
        self.scopes.push(Scope::new(kind, parent, node));
        if node.is_some() {
            self.node_scopes.insert(node, id);
        }
        id
    }

    /// Scopes created by this pass; published scopes are never touched.
    fn scope_mut(&mut self, id: ScopeId) -> Option<&mut Scope> {
        let index = id.0.checked_sub(self.base_id)?;
        self.scopes.get_mut(index as usize)
    }

    fn add_definition(&mut self, scope: ScopeId, def: Arc<Definition>) {
        self.check_redeclaration(scope, &def);
        if let Some(s) = self.scope_mut(scope) {
            s.add_definition(def.clone());
        }
        self.definitions.push(def);
    }

    fn check_redeclaration(&mut self, scope: ScopeId, def: &Definition) {
        let Some(s) = self.scope_mut(scope) else {
            return;
        };
        let conflict = s.get(def.base_name()).iter().any(|existing| {
            existing.namespace() == def.namespace()
                && (existing.kind == DefinitionKind::Constant
                    || def.kind == DefinitionKind::Constant)
        });
        if conflict {
            let problem = CompilerProblem::new(
                problem_codes::CONST_REDECLARED,
                &**self.file.file_name(),
                def.span(),
                &[&**def.base_name()],
            )
            .locate(self.file.lookup());
            self.problems.push(problem);
        }
    }

    // =========================================================================
    // Node helpers
    // =========================================================================

    fn decl(&self, r: NodeRef) -> Option<&'a DeclData> {
        self.file.get(r).and_then(|n| n.decl())
    }

    fn name_of(&self, decl: &DeclData, r: NodeRef) -> Arc<str> {
        let name = self.file.identifier_text(NodeRef {
            body: r.body,
            node: decl.name,
        });
        Arc::from(name.unwrap_or(""))
    }

    fn type_ref(&self, r: NodeRef, type_node: NodeIndex) -> Option<Reference> {
        if type_node.is_none() {
            return None;
        }
        let arena = self.file.arena_for(r.body)?;
        Some(Reference::from_type_node(self.refs, arena, type_node))
    }

    fn metadata(&self, r: NodeRef, decl: &DeclData) -> Vec<MetaTagData> {
        if decl.metadata.is_none() {
            return Vec::new();
        }
        self.file
            .get(NodeRef {
                body: r.body,
                node: decl.metadata,
            })
            .map(|n| n.meta_tags().to_vec())
            .unwrap_or_default()
    }

    fn span(&self, r: NodeRef) -> Span {
        self.file.get(r).map_or(Span::default(), |n| n.span())
    }

    /// Namespace of a declaration made into a scope of kind `kind`.
    fn namespace_for(&self, cx: &BindContext, kind: ScopeKind, decl: &DeclData) -> NamespaceKey {
        if let Some(custom) = &decl.namespace {
            return NamespaceKey::Custom(custom.clone());
        }
        let access = decl.modifiers.access();
        match kind {
            ScopeKind::Package => {
                if access.contains(ModifierFlags::PUBLIC) {
                    NamespaceKey::Public(cx.package.clone())
                } else {
                    NamespaceKey::Internal(cx.package.clone())
                }
            }
            ScopeKind::File => NamespaceKey::FilePrivate(self.unit),
            ScopeKind::Class => {
                let class = cx
                    .class
                    .as_ref()
                    .map_or_else(|| Arc::from(""), |c| c.qname().clone());
                if access.contains(ModifierFlags::PUBLIC) {
                    NamespaceKey::public_root()
                } else if access.contains(ModifierFlags::PRIVATE) {
                    NamespaceKey::Private(class)
                } else if access.contains(ModifierFlags::PROTECTED) {
                    NamespaceKey::Protected(class)
                } else {
                    NamespaceKey::Internal(cx.package.clone())
                }
            }
            _ => NamespaceKey::public_root(),
        }
    }

    fn qname_for(&self, cx: &BindContext, kind: ScopeKind, name: &str) -> Arc<str> {
        if kind == ScopeKind::Package {
            make_qname(&cx.package, name)
        } else {
            Arc::from(name)
        }
    }

    fn base_flags(&self, cx: &BindContext, decl: &DeclData) -> DefinitionFlags {
        let mut flags = DefinitionFlags::from_modifiers(decl.modifiers);
        if matches!(cx.var_kind, ScopeKind::FunctionBody) {
            flags |= DefinitionFlags::LOCAL;
        }
        flags
    }

    // =========================================================================
    // Walk
    // =========================================================================

    fn bind_children(&mut self, r: NodeRef, cx: &BindContext) {
        for child in self.file.children(r) {
            self.bind_node(child, cx);
        }
    }

    fn bind_node(&mut self, r: NodeRef, cx: &BindContext) {
        let Some(node) = self.file.get(r) else {
            return;
        };
        match node.kind {
            NodeKind::Package => self.bind_package(r, cx),
            NodeKind::Import => {
                let import = ImportDirective {
                    name: node.name().cloned().unwrap_or_else(|| Arc::from("")),
                    wildcard: node.flags.contains(NodeFlags::WILDCARD),
                    span: node.span(),
                };
                if let Some(scope) = self.scope_mut(cx.scope) {
                    scope.add_import(import);
                }
            }
            NodeKind::UseNamespace => {
                let names: Vec<Arc<str>> = self
                    .file
                    .children(r)
                    .into_iter()
                    .filter_map(|c| self.file.identifier_text(c).map(Arc::from))
                    .collect();
                if let Some(scope) = self.scope_mut(cx.scope) {
                    for name in names {
                        scope.add_used_namespace(name);
                    }
                }
            }
            NodeKind::Class | NodeKind::Interface => self.bind_class(r, cx),
            NodeKind::Function => self.bind_function(r, cx),
            NodeKind::FunctionExpression => self.bind_function_expression(r, cx),
            NodeKind::VariableList => self.bind_variables(r, cx),
            NodeKind::NamespaceDecl => self.bind_namespace(r, cx),
            NodeKind::Catch => self.bind_catch(r, cx),
            NodeKind::With => self.bind_with(r, cx),
            NodeKind::Metadata => {}
            _ => self.bind_children(r, cx),
        }
    }

    fn bind_package(&mut self, r: NodeRef, cx: &BindContext) {
        let Some(decl) = self.decl(r) else {
            return;
        };
        let name = self.name_of(decl, r);
        let scope = self.push_scope(ScopeKind::Package, cx.scope, r);
        if let Some(s) = self.scope_mut(scope) {
            s.set_package_name(name.clone());
        }
        trace!(package = %name, "bind package");
        let inner = BindContext {
            scope,
            var_scope: scope,
            var_kind: ScopeKind::Package,
            class: None,
            package: name,
        };
        self.bind_children(
            NodeRef {
                body: r.body,
                node: decl.body,
            },
            &inner,
        );
    }

    fn bind_class(&mut self, r: NodeRef, cx: &BindContext) {
        let (Some(node), Some(decl)) = (self.file.get(r), self.decl(r)) else {
            return;
        };
        let (kind, scope_kind) = if node.kind == NodeKind::Interface {
            (DefinitionKind::Interface, ScopeKind::Interface)
        } else {
            (DefinitionKind::Class, ScopeKind::Class)
        };
        let name = self.name_of(decl, r);
        let members = self.push_scope(scope_kind, cx.scope, r);

        let mut init = DefinitionInit::new(
            kind,
            name.clone(),
            self.qname_for(cx, cx.var_kind, &name),
            self.namespace_for(cx, cx.var_kind, decl),
            self.unit,
        );
        init.containing_scope = cx.var_scope;
        init.members_scope = members;
        init.node = r;
        init.span = self.span(r);
        init.flags = self.base_flags(cx, decl);
        init.metadata = self.metadata(r, decl);
        init.base_ref = self.type_ref(r, decl.base);
        init.interface_refs = decl
            .interfaces
            .iter()
            .filter_map(|&i| self.type_ref(r, i))
            .collect();
        let def = Arc::new(Definition::new(init));
        if let Some(s) = self.scope_mut(members) {
            s.set_owner(def.clone());
        }
        self.add_definition(cx.var_scope, def.clone());

        let inner = BindContext {
            scope: members,
            var_scope: members,
            var_kind: scope_kind,
            class: Some(def),
            package: cx.package.clone(),
        };
        self.bind_children(
            NodeRef {
                body: r.body,
                node: decl.body,
            },
            &inner,
        );
    }

    /// Parameters of `decl` as infos plus definitions in `scope`.
    fn bind_params(&mut self, r: NodeRef, decl: &DeclData, scope: ScopeId) -> Vec<ParamInfo> {
        let mut params = Vec::with_capacity(decl.params.len());
        for &p in &decl.params {
            let pr = NodeRef {
                body: r.body,
                node: p,
            };
            let (Some(node), Some(pdecl)) = (self.file.get(pr), self.decl(pr)) else {
                continue;
            };
            let name = self.name_of(pdecl, pr);
            let rest = node.flags.contains(NodeFlags::REST);
            let info = ParamInfo {
                name: name.clone(),
                type_ref: self.type_ref(pr, pdecl.type_annotation),
                has_default: pdecl.initializer.is_some(),
                rest,
            };
            let mut init = DefinitionInit::new(
                DefinitionKind::Parameter,
                name.clone(),
                name,
                NamespaceKey::public_root(),
                self.unit,
            );
            init.containing_scope = scope;
            init.node = pr;
            init.span = node.span();
            init.type_ref = info.type_ref.clone();
            init.flags.set(DefinitionFlags::REST, rest);
            init.flags.set(DefinitionFlags::HAS_DEFAULT, info.has_default);
            self.add_definition(scope, Arc::new(Definition::new(init)));
            params.push(info);
        }
        params
    }

    fn bind_function(&mut self, r: NodeRef, cx: &BindContext) {
        let Some(decl) = self.decl(r) else {
            return;
        };
        let kind = match decl.accessor {
            AccessorKind::Getter => DefinitionKind::Getter,
            AccessorKind::Setter => DefinitionKind::Setter,
            AccessorKind::None => DefinitionKind::Function,
        };
        let name = self.name_of(decl, r);
        let function_scope = self.push_scope(ScopeKind::Function, cx.scope, r);
        let params = self.bind_params(r, decl, function_scope);

        let mut init = DefinitionInit::new(
            kind,
            name.clone(),
            self.qname_for(cx, cx.var_kind, &name),
            self.namespace_for(cx, cx.var_kind, decl),
            self.unit,
        );
        init.containing_scope = cx.var_scope;
        init.members_scope = function_scope;
        init.node = r;
        init.span = self.span(r);
        init.flags = self.base_flags(cx, decl);
        init.metadata = self.metadata(r, decl);
        init.type_ref = self.type_ref(r, decl.type_annotation);
        init.params = params;
        let def = Arc::new(Definition::new(init));
        if let Some(s) = self.scope_mut(function_scope) {
            s.set_owner(def.clone());
        }
        self.add_definition(cx.var_scope, def);

        if decl.body.is_none() {
            return;
        }
        if self.defer_bodies && !r.in_body() {
            self.bodies.insert(
                r.node,
                BodySlot {
                    function_scope,
                    block: decl.body,
                    cell: OnceCell::new(),
                },
            );
        } else {
            self.bind_body(
                function_scope,
                NodeRef {
                    body: r.body,
                    node: decl.body,
                },
                cx,
            );
        }
    }

    fn bind_function_expression(&mut self, r: NodeRef, cx: &BindContext) {
        let Some(decl) = self.decl(r) else {
            return;
        };
        let function_scope = self.push_scope(ScopeKind::Function, cx.scope, r);
        let params = self.bind_params(r, decl, function_scope);
        if decl.name.is_some() {
            // A named function expression sees its own name.
            let name = self.name_of(decl, r);
            let mut init = DefinitionInit::new(
                DefinitionKind::Function,
                name.clone(),
                name,
                NamespaceKey::public_root(),
                self.unit,
            );
            init.containing_scope = function_scope;
            init.members_scope = function_scope;
            init.node = r;
            init.span = self.span(r);
            init.type_ref = self.type_ref(r, decl.type_annotation);
            init.params = params;
            init.flags = DefinitionFlags::LOCAL;
            let def = Arc::new(Definition::new(init));
            if let Some(s) = self.scope_mut(function_scope) {
                s.set_owner(def.clone());
            }
            self.add_definition(function_scope, def);
        }
        if decl.body.is_some() {
            self.bind_body(
                function_scope,
                NodeRef {
                    body: r.body,
                    node: decl.body,
                },
                cx,
            );
        }
    }

    /// Bind the statements of a function body into a new body scope.
    fn bind_body(&mut self, function_scope: ScopeId, block: NodeRef, cx: &BindContext) -> ScopeId {
        let body_scope = self.push_scope(ScopeKind::FunctionBody, function_scope, block);
        let inner = BindContext {
            scope: body_scope,
            var_scope: body_scope,
            var_kind: ScopeKind::FunctionBody,
            class: cx.class.clone(),
            package: cx.package.clone(),
        };
        self.bind_children(block, &inner);
        body_scope
    }

    fn bind_variables(&mut self, r: NodeRef, cx: &BindContext) {
        let (Some(node), Some(list_decl)) = (self.file.get(r), self.decl(r)) else {
            return;
        };
        let kind = if node.flags.contains(NodeFlags::CONST) {
            DefinitionKind::Constant
        } else {
            DefinitionKind::Variable
        };
        let namespace = self.namespace_for(cx, cx.var_kind, list_decl);
        let metadata = self.metadata(r, list_decl);
        let flags = self.base_flags(cx, list_decl);
        for variable in self.file.children(r) {
            let (Some(vnode), Some(vdecl)) = (self.file.get(variable), self.decl(variable)) else {
                continue;
            };
            if vnode.kind != NodeKind::Variable {
                continue;
            }
            let name = self.name_of(vdecl, variable);
            let mut init = DefinitionInit::new(
                kind,
                name.clone(),
                self.qname_for(cx, cx.var_kind, &name),
                namespace.clone(),
                self.unit,
            );
            init.containing_scope = cx.var_scope;
            init.node = variable;
            init.span = vnode.span();
            init.flags = flags;
            init.metadata = metadata.clone();
            init.type_ref = self.type_ref(variable, vdecl.type_annotation);
            self.add_definition(cx.var_scope, Arc::new(Definition::new(init)));
            if vdecl.initializer.is_some() {
                self.bind_node(
                    NodeRef {
                        body: variable.body,
                        node: vdecl.initializer,
                    },
                    cx,
                );
            }
        }
    }

    fn bind_namespace(&mut self, r: NodeRef, cx: &BindContext) {
        let Some(decl) = self.decl(r) else {
            return;
        };
        let name = self.name_of(decl, r);
        let uri = self
            .file
            .get(NodeRef {
                body: r.body,
                node: decl.initializer,
            })
            .and_then(|n| match &n.data {
                asc_parser::NodeData::Literal { text, .. } => Some(text.clone()),
                _ => None,
            });
        let mut init = DefinitionInit::new(
            DefinitionKind::Namespace,
            name.clone(),
            self.qname_for(cx, cx.var_kind, &name),
            self.namespace_for(cx, cx.var_kind, decl),
            self.unit,
        );
        init.containing_scope = cx.var_scope;
        init.node = r;
        init.span = self.span(r);
        init.flags = self.base_flags(cx, decl);
        init.metadata = self.metadata(r, decl);
        init.detail = uri;
        self.add_definition(cx.var_scope, Arc::new(Definition::new(init)));
    }

    fn bind_catch(&mut self, r: NodeRef, cx: &BindContext) {
        let scope = self.push_scope(ScopeKind::Catch, cx.scope, r);
        let children = self.file.children(r);
        let inner = BindContext {
            scope,
            ..cx.clone()
        };
        for child in children {
            let is_param = self.file.get(child).is_some_and(|n| n.kind == NodeKind::Parameter);
            if is_param {
                let Some(pdecl) = self.decl(child) else {
                    continue;
                };
                let name = self.name_of(pdecl, child);
                let mut init = DefinitionInit::new(
                    DefinitionKind::Parameter,
                    name.clone(),
                    name,
                    NamespaceKey::public_root(),
                    self.unit,
                );
                init.containing_scope = scope;
                init.node = child;
                init.span = self.span(child);
                init.type_ref = self.type_ref(child, pdecl.type_annotation);
                init.flags = DefinitionFlags::LOCAL;
                self.add_definition(scope, Arc::new(Definition::new(init)));
            } else {
                self.bind_node(child, &inner);
            }
        }
    }

    fn bind_with(&mut self, r: NodeRef, cx: &BindContext) {
        let children = self.file.children(r);
        let scope = self.push_scope(ScopeKind::With, cx.scope, r);
        let inner = BindContext {
            scope,
            ..cx.clone()
        };
        // The object expression is evaluated outside the `with`.
        for (i, child) in children.into_iter().enumerate() {
            if i == 0 {
                self.bind_node(child, cx);
            } else {
                self.bind_node(child, &inner);
            }
        }
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Populate the scopes of `tree` for `unit`. Function bodies are bound
/// later, on first use.
pub fn bind_file(unit: UnitId, tree: &Arc<FileNode>, refs: Arc<ReferenceCache>) -> FileScope {
    let _span = debug_span!("bind_file", file = %tree.file_name(), %unit).entered();
    let state = file_pass(unit, tree, &refs);
    debug!(
        scopes = state.scopes.len(),
        definitions = state.definitions.len(),
        bodies = state.bodies.len(),
        problems = state.problems.len(),
        "bound file"
    );
    let BinderState {
        scopes,
        node_scopes,
        bodies,
        definitions,
        problems,
        ..
    } = state;
    FileScope::from_parts(
        unit,
        tree.file_name().clone(),
        scopes,
        node_scopes,
        bodies,
        definitions,
        Arc::downgrade(tree),
        refs,
        problems,
    )
}

fn file_pass<'a>(unit: UnitId, tree: &'a FileNode, refs: &'a ReferenceCache) -> BinderState<'a> {
    let mut state = BinderState::new(unit, tree, refs, 0, true);
    let root = NodeRef::file(tree.root());
    let file_scope = state.push_scope(ScopeKind::File, ScopeId::NONE, root);
    let cx = BindContext {
        scope: file_scope,
        var_scope: file_scope,
        var_kind: ScopeKind::File,
        class: None,
        package: Arc::from(""),
    };
    state.bind_children(root, &cx);
    state
}

/// Attach a re-parsed `tree` to an existing file scope, keeping every
/// definition object. Returns `false` (and leaves the scope detached) when
/// the tree no longer declares the same things in the same order.
pub fn reconnect(file_scope: &FileScope, tree: &Arc<FileNode>) -> bool {
    let _span = debug_span!("reconnect", file = %tree.file_name()).entered();
    let fresh = file_pass(file_scope.unit(), tree, file_scope.references());
    let existing = file_scope.definitions();
    if fresh.definitions.len() != existing.len() {
        debug!(
            old = existing.len(),
            new = fresh.definitions.len(),
            "declaration count changed"
        );
        return false;
    }
    let matches = existing.iter().zip(&fresh.definitions).all(|(old, new)| {
        old.kind == new.kind && old.qname() == new.qname() && old.namespace() == new.namespace()
    });
    if !matches {
        debug!("declarations changed");
        return false;
    }
    for (old, new) in existing.iter().zip(&fresh.definitions) {
        old.set_node(new.node());
    }
    file_scope.attach_tree(Arc::downgrade(tree));
    true
}

/// Bind one deferred function body into scopes appended to `file_scope`.
pub(crate) fn populate_body(file_scope: &FileScope, file: &FileNode, slot: &BodySlot) -> ScopeId {
    let _guard = file_scope
        .body_population
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    let base_id = file_scope.next_scope_id();
    let class = file_scope.enclosing_class(slot.function_scope);
    let package = file_scope.package_of(slot.function_scope);

    let mut state = BinderState::new(file_scope.unit(), file, &file_scope.references, base_id, false);
    let cx = BindContext {
        scope: slot.function_scope,
        var_scope: slot.function_scope,
        var_kind: ScopeKind::Function,
        class,
        package,
    };
    let body_scope = state.bind_body(slot.function_scope, NodeRef::file(slot.block), &cx);
    trace!(
        scopes = state.scopes.len(),
        definitions = state.definitions.len(),
        "bound body"
    );
    if !state.problems.is_empty() {
        file_scope
            .body_problems
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(state.problems);
    }
    file_scope.publish(state.scopes, state.node_scopes);
    body_scope
}

#[cfg(test)]
#[path = "../tests/state_tests.rs"]
mod state_tests;

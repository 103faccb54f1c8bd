//! Deferred name-resolution strategies.
//!
//! A `Reference` records how to find a definition for a name, not the
//! definition itself. Resolving one never mutates it; references are shared
//! between definitions and call sites, and result caching is done by the
//! scope cache on the caller's side.

use crate::context::ResolutionContext;
use crate::definitions::{BuiltinType, Definition};
use crate::namespace::{NamespaceKey, split_qname};
use crate::reference_cache::ReferenceCache;
use crate::resolution::{
    find_property, find_property_multiname, find_property_qualified, record_dependency,
};
use crate::scopes::{FileScope, ScopeId};
use asc_common::DependencyType;
use asc_parser::{NodeArena, NodeIndex, NodeKind};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// A plain name looked up along the scope chain.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct LexicalReference {
    name: Arc<str>,
}

impl LexicalReference {
    pub(crate) fn new(name: Arc<str>) -> LexicalReference {
        LexicalReference { name }
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }
}

/// A name restricted to an already-resolved set of namespaces.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct QualifiedReference {
    pub namespaces: SmallVec<[NamespaceKey; 2]>,
    pub name: Arc<str>,
}

/// `Base.<Param>`.
#[derive(Debug)]
pub struct ParameterizedReference {
    pub base: Reference,
    pub param: Reference,
}

#[derive(Debug, Clone)]
pub enum Reference {
    Lexical(Arc<LexicalReference>),
    Qualified(Arc<QualifiedReference>),
    Builtin(BuiltinType),
    Parameterized(Arc<ParameterizedReference>),
    /// Bound up front; skips scope search.
    Resolved(Arc<Definition>),
    /// Never resolves; keeps the attempted name for problems.
    NotAType(Arc<str>),
}

impl Reference {
    pub fn qualified(namespaces: impl IntoIterator<Item = NamespaceKey>, name: &str) -> Reference {
        Reference::Qualified(Arc::new(QualifiedReference {
            namespaces: namespaces.into_iter().collect(),
            name: Arc::from(name),
        }))
    }

    /// `a.b.C` as a name qualified by the public namespace of `a.b`.
    pub fn package_qualified(qname: &str) -> Reference {
        let (package, base) = split_qname(qname);
        Reference::qualified([NamespaceKey::Public(Arc::from(package))], base)
    }

    pub fn parameterized(base: Reference, param: Reference) -> Reference {
        Reference::Parameterized(Arc::new(ParameterizedReference { base, param }))
    }

    /// Reference for a type annotation or type name node.
    pub fn from_type_node(refs: &ReferenceCache, arena: &NodeArena, node: NodeIndex) -> Reference {
        let Some(n) = arena.get(node) else {
            return Reference::NotAType(Arc::from(""));
        };
        match n.kind {
            NodeKind::AnyType => Reference::Builtin(BuiltinType::Any),
            NodeKind::VoidType => Reference::Builtin(BuiltinType::Void),
            NodeKind::Identifier => match arena.identifier_text(node) {
                Some(name) => Reference::Lexical(refs.lexical(name)),
                None => Reference::NotAType(Arc::from("")),
            },
            NodeKind::QualifiedName => match arena.identifier_text(node) {
                Some(qname) => Reference::package_qualified(qname),
                None => Reference::NotAType(Arc::from("")),
            },
            NodeKind::VectorType => {
                let children = arena.children(node);
                match (children.first(), children.get(1)) {
                    (Some(&base), Some(&param)) => Reference::parameterized(
                        Reference::from_type_node(refs, arena, base),
                        Reference::from_type_node(refs, arena, param),
                    ),
                    _ => Reference::NotAType(Arc::from("Vector")),
                }
            }
            _ => Reference::NotAType(Arc::from("")),
        }
    }

    /// Base name, for problems and cache keys.
    pub fn name(&self) -> Arc<str> {
        match self {
            Reference::Lexical(lexical) => lexical.name.clone(),
            Reference::Qualified(qualified) => qualified.name.clone(),
            Reference::Builtin(ty) => Arc::from(split_qname(ty.qname()).1),
            Reference::Parameterized(p) => Arc::from(format!("{}.<{}>", p.base.name(), p.param.name())),
            Reference::Resolved(def) => def.base_name().clone(),
            Reference::NotAType(name) => name.clone(),
        }
    }

    /// Resolve against `scope` of `file_scope`. `dependency`, when set, is
    /// recorded from the file's unit to the declaring unit of the result.
    pub fn resolve(
        &self,
        ctx: &dyn ResolutionContext,
        file_scope: &FileScope,
        scope: ScopeId,
        dependency: Option<DependencyType>,
        can_escape_with: bool,
    ) -> Option<Arc<Definition>> {
        match self {
            Reference::Lexical(lexical) => find_property(
                ctx,
                file_scope,
                scope,
                &lexical.name,
                dependency,
                can_escape_with,
                true,
            ),
            Reference::Qualified(qualified) => match qualified.namespaces.as_slice() {
                [single] => find_property_qualified(
                    ctx,
                    file_scope,
                    scope,
                    single,
                    &qualified.name,
                    dependency,
                    can_escape_with,
                ),
                many => find_property_multiname(
                    ctx,
                    file_scope,
                    scope,
                    many,
                    &qualified.name,
                    dependency,
                    can_escape_with,
                ),
            },
            Reference::Builtin(ty) => {
                let def = ctx.project_scope().builtin(ctx, *ty)?;
                record_dependency(ctx, file_scope.unit(), &def, dependency);
                Some(def)
            }
            Reference::Parameterized(p) => {
                let base = p
                    .base
                    .resolve(ctx, file_scope, scope, dependency, can_escape_with)?;
                let vector = ctx.project_scope().builtin(ctx, BuiltinType::Vector)?;
                if !Arc::ptr_eq(&base, &vector) {
                    return None;
                }
                let param = p
                    .param
                    .resolve(ctx, file_scope, scope, dependency, can_escape_with)?;
                if param.is_ambiguous() {
                    return None;
                }
                Some(ctx.project_scope().applied_vector(&vector, &param))
            }
            Reference::Resolved(def) => Some(def.clone()),
            Reference::NotAType(_) => None,
        }
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Reference) -> bool {
        match (self, other) {
            (Reference::Lexical(a), Reference::Lexical(b)) => Arc::ptr_eq(a, b) || a == b,
            (Reference::Qualified(a), Reference::Qualified(b)) => a == b,
            (Reference::Builtin(a), Reference::Builtin(b)) => a == b,
            (Reference::Parameterized(a), Reference::Parameterized(b)) => {
                a.base == b.base && a.param == b.param
            }
            (Reference::Resolved(a), Reference::Resolved(b)) => Arc::ptr_eq(a, b),
            (Reference::NotAType(a), Reference::NotAType(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Qualified(q) => match q.namespaces.as_slice() {
                [NamespaceKey::Public(pkg)] if !pkg.is_empty() => write!(f, "{pkg}.{}", q.name),
                [NamespaceKey::Custom(ns)] => write!(f, "{ns}::{}", q.name),
                _ => f.write_str(&q.name),
            },
            Reference::Builtin(ty) => f.write_str(ty.qname()),
            other => f.write_str(&other.name()),
        }
    }
}

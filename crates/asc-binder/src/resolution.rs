//! Scope-chain name resolution.
//!
//! All three lookups walk outward from a scope and stop at the first scope
//! with matching definitions. A class scope with no direct match also
//! searches inherited members. The project scope is consulted when nothing
//! matched, and also when the walk ended in the file or package scope, so
//! a local definition and an imported one with the same name are reported
//! as ambiguous instead of silently shadowing.
//!
//! A successful lookup made with a dependency type records a dependency on
//! the declaring unit. That side effect also happens on a cache hit.

use crate::ambiguity::resolve_ambiguities;
use crate::context::ResolutionContext;
use crate::definitions::{BuiltinType, Definition, DefinitionKind};
use crate::namespace::{NamespaceKey, OpenNamespaces};
use crate::scope_cache::{CacheKey, LookupKind};
use crate::scopes::{FileScope, ScopeId, ScopeKind};
use asc_common::limits::MAX_INHERITANCE_DEPTH;
use asc_common::{DependencyType, UnitId};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::trace;

type Candidates = SmallVec<[Arc<Definition>; 2]>;

/// Which definitions a lookup accepts.
enum Filter<'a> {
    Open(&'a OpenNamespaces),
    Exactly(&'a NamespaceKey),
    AnyOf(&'a [NamespaceKey]),
}

impl Filter<'_> {
    fn accepts(&self, ns: &NamespaceKey, name: &str) -> bool {
        match self {
            Filter::Open(open) => open.admits(ns, name),
            Filter::Exactly(only) => ns == *only,
            Filter::AnyOf(set) => set.contains(ns),
        }
    }

    /// Members found through a base class: private members never match,
    /// protected members always do, internal ones only within the package.
    fn accepts_inherited(&self, ns: &NamespaceKey, name: &str, package: &str) -> bool {
        match self {
            Filter::Open(open) => match ns {
                NamespaceKey::Private(_) | NamespaceKey::FilePrivate(_) => false,
                NamespaceKey::Protected(_) => true,
                NamespaceKey::Internal(pkg) => &**pkg == package,
                other => open.admits(other, name),
            },
            _ => !matches!(ns, NamespaceKey::Private(_)) && self.accepts(ns, name),
        }
    }
}

/// Resolve a plain name from `scope`. `favor_types` prefers a class over a
/// same-named function when the two are otherwise ambiguous.
pub fn find_property(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    scope: ScopeId,
    name: &str,
    dependency: Option<DependencyType>,
    can_escape_with: bool,
    favor_types: bool,
) -> Option<Arc<Definition>> {
    let open = file_scope.open_namespaces(scope);
    lookup(
        ctx,
        file_scope,
        scope,
        name,
        &Filter::Open(&open),
        LookupKind::Lexical { favor_types },
        dependency,
        can_escape_with,
        favor_types,
    )
}

/// Resolve `ns::name`.
pub fn find_property_qualified(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    scope: ScopeId,
    ns: &NamespaceKey,
    name: &str,
    dependency: Option<DependencyType>,
    can_escape_with: bool,
) -> Option<Arc<Definition>> {
    lookup(
        ctx,
        file_scope,
        scope,
        name,
        &Filter::Exactly(ns),
        LookupKind::Qualified(ns.clone()),
        dependency,
        can_escape_with,
        false,
    )
}

/// Resolve `name` against several candidate namespaces at once. Matches in
/// different namespaces of the same scope go through the ambiguity policy.
pub fn find_property_multiname(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    scope: ScopeId,
    namespaces: &[NamespaceKey],
    name: &str,
    dependency: Option<DependencyType>,
    can_escape_with: bool,
) -> Option<Arc<Definition>> {
    lookup(
        ctx,
        file_scope,
        scope,
        name,
        &Filter::AnyOf(namespaces),
        LookupKind::Multiname(namespaces.iter().cloned().collect()),
        dependency,
        can_escape_with,
        false,
    )
}

#[allow(clippy::too_many_arguments)]
fn lookup(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    scope: ScopeId,
    name: &str,
    filter: &Filter<'_>,
    kind: LookupKind,
    dependency: Option<DependencyType>,
    can_escape_with: bool,
    favor_types: bool,
) -> Option<Arc<Definition>> {
    let unit = file_scope.unit();
    let generation = ctx.project_scope().generation();
    let cache = dependency.and_then(|_| ctx.scope_cache(unit));
    let key = CacheKey {
        scope,
        name: Arc::from(name),
        lookup: kind,
        can_escape_with,
    };
    if let Some(cache) = &cache
        && let Some(def) = cache.get(&key, generation)
    {
        record_dependency(ctx, unit, &def, dependency);
        return Some(def);
    }

    let candidates = collect_candidates(ctx, file_scope, scope, name, filter);
    let candidates = if can_escape_with {
        candidates
    } else {
        filter_with(file_scope, scope, candidates)
    };

    let result = match candidates.len() {
        0 => None,
        1 => candidates.into_iter().next(),
        _ => Some(resolve_ambiguities(ctx, file_scope, &candidates, favor_types)),
    };
    trace!(
        name,
        %unit,
        scope = scope.0,
        found = result.as_ref().map(|d| &**d.qname()),
        "lookup"
    );

    if let Some(def) = &result
        && !def.is_ambiguous()
    {
        record_dependency(ctx, unit, def, dependency);
        if let Some(cache) = &cache {
            cache.insert(key, generation, def.clone());
        }
    }
    result
}

fn collect_candidates(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    scope: ScopeId,
    name: &str,
    filter: &Filter<'_>,
) -> Candidates {
    let mut candidates = Candidates::new();
    let mut last_kind = None;
    let package = file_scope.package_of(scope);
    for (_, s) in file_scope.chain(scope) {
        last_kind = Some(s.kind);
        candidates.extend(
            s.get(name)
                .iter()
                .filter(|def| filter.accepts(def.namespace(), name))
                .cloned(),
        );
        if candidates.is_empty()
            && matches!(s.kind, ScopeKind::Class | ScopeKind::Interface)
            && let Some(owner) = s.owner()
        {
            candidates.extend(inherited_members(ctx, file_scope, owner, name, filter, &package));
        }
        if !candidates.is_empty() {
            break;
        }
    }

    if candidates.is_empty() || matches!(last_kind, Some(ScopeKind::File | ScopeKind::Package)) {
        let project = ctx.project_scope();
        let found: Candidates = match filter {
            Filter::Open(open) => project.find_by_name(ctx, name, open, file_scope.unit()),
            Filter::Exactly(ns) => project
                .find_qualified(ctx, ns, name, file_scope.unit())
                .into_iter()
                .collect(),
            Filter::AnyOf(set) => set
                .iter()
                .filter_map(|ns| project.find_qualified(ctx, ns, name, file_scope.unit()))
                .collect(),
        };
        for def in found {
            if !candidates.iter().any(|c| Arc::ptr_eq(c, &def)) {
                candidates.push(def);
            }
        }
    }
    candidates
}

/// Members named `name` declared in base classes of `class`, nearest first.
fn inherited_members(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    class: &Arc<Definition>,
    name: &str,
    filter: &Filter<'_>,
    package: &str,
) -> Candidates {
    let mut visited: FxHashSet<*const Definition> = FxHashSet::default();
    visited.insert(Arc::as_ptr(class));
    let mut current = with_file_scope(ctx, file_scope, class.unit(), |fs| {
        resolve_base_class(ctx, fs, class)
    })
    .flatten();
    let mut depth = 0;
    while let Some(base) = current {
        if depth >= MAX_INHERITANCE_DEPTH || !visited.insert(Arc::as_ptr(&base)) {
            break;
        }
        depth += 1;
        let step = with_file_scope(ctx, file_scope, base.unit(), |fs| {
            let hits: Candidates = fs
                .scope(base.members_scope())
                .map(|members| {
                    members
                        .get(name)
                        .iter()
                        .filter(|def| filter.accepts_inherited(def.namespace(), name, package))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            (hits, resolve_base_class(ctx, fs, &base))
        });
        let Some((hits, next)) = step else {
            break;
        };
        if !hits.is_empty() {
            return hits;
        }
        current = next;
    }
    Candidates::new()
}

/// Drop candidates hidden by a `with` scope between `scope` and the scope
/// that declares them.
fn filter_with(file_scope: &FileScope, scope: ScopeId, candidates: Candidates) -> Candidates {
    let chain = file_scope.chain(scope);
    if !chain.iter().any(|(_, s)| s.kind == ScopeKind::With) {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|def| {
            for (id, s) in &chain {
                if def.unit() == file_scope.unit() && *id == def.containing_scope() {
                    return true;
                }
                if s.kind == ScopeKind::With {
                    return false;
                }
            }
            false
        })
        .collect()
}

/// Run `f` on the file scope of `unit`, reusing `file_scope` when it is the
/// same unit.
pub(crate) fn with_file_scope<R>(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    unit: UnitId,
    f: impl FnOnce(&FileScope) -> R,
) -> Option<R> {
    if unit == file_scope.unit() {
        Some(f(file_scope))
    } else {
        ctx.file_scope(unit).map(|fs| f(&fs))
    }
}

pub(crate) fn record_dependency(
    ctx: &dyn ResolutionContext,
    from: UnitId,
    def: &Definition,
    dependency: Option<DependencyType>,
) {
    let Some(dependency) = dependency else {
        return;
    };
    let to = def.unit();
    if from.is_none() || to.is_none() || from == to || def.is_ambiguous() {
        return;
    }
    ctx.add_dependency(from, to, dependency, def.qname());
}

// =============================================================================
// Definition-level helpers
// =============================================================================
//
// `file_scope` is always the file scope of the definition's own unit.

/// Base class of `class`: its `extends` clause resolved in the scope that
/// declares the class, or `Object` when there is none.
pub fn resolve_base_class(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    class: &Definition,
) -> Option<Arc<Definition>> {
    if class.kind != DefinitionKind::Class {
        return None;
    }
    match class.base_ref() {
        Some(base) => base
            .resolve(ctx, file_scope, class.containing_scope(), None, true)
            .filter(|def| def.kind == DefinitionKind::Class),
        None if &**class.qname() == BuiltinType::Object.qname() => None,
        None => ctx
            .project_scope()
            .builtin(ctx, BuiltinType::Object)
            .filter(|object| !std::ptr::eq(&**object, class)),
    }
}

/// Declared type of a variable or return type of a function. Untyped
/// declarations have type `*`.
pub fn resolve_type(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    def: &Definition,
    dependency: Option<DependencyType>,
) -> Option<Arc<Definition>> {
    match def.type_ref() {
        Some(reference) => reference.resolve(ctx, file_scope, def.containing_scope(), dependency, true),
        None => ctx.project_scope().builtin(ctx, BuiltinType::Any),
    }
}

#[cfg(test)]
#[path = "../tests/resolution_unit_tests.rs"]
mod resolution_unit_tests;

//! Choosing between several definitions found for one name.
//!
//! Applied in order:
//! 1. a getter/setter pair resolves to the first of the two;
//! 2. a function and a class or interface resolve to the type when types
//!    are favored, otherwise to the function;
//! 3. redeclarations in a file or function scope merge: same-typed `var`s
//!    keep the first, a `*`-typed `var` yields to the typed one, a function
//!    redeclared keeps the last one, and a function wins over a `var` typed
//!    `*` or `Function`;
//! 4. a single candidate declared in the referencing unit wins;
//! 5. otherwise the result is the `AmbiguousDefinition` sentinel.

use crate::context::ResolutionContext;
use crate::definitions::{BuiltinType, Definition, DefinitionKind};
use crate::resolution::{resolve_type, with_file_scope};
use crate::scopes::FileScope;
use std::sync::Arc;
use tracing::debug;

pub fn resolve_ambiguities(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    candidates: &[Arc<Definition>],
    favor_types: bool,
) -> Arc<Definition> {
    if let Some(def) = resolve_by_kind(ctx, file_scope, candidates, favor_types) {
        return def;
    }
    let local: Vec<&Arc<Definition>> = candidates
        .iter()
        .filter(|def| def.unit() == file_scope.unit())
        .collect();
    if let [only] = local.as_slice() {
        return Arc::clone(only);
    }
    debug!(
        name = %candidates.first().map_or("", |d| &**d.base_name()),
        count = candidates.len(),
        "ambiguous reference"
    );
    Definition::ambiguous()
}

fn resolve_by_kind(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    candidates: &[Arc<Definition>],
    favor_types: bool,
) -> Option<Arc<Definition>> {
    if let [a, b] = candidates {
        if is_getter_setter_pair(a, b) {
            return Some(a.clone());
        }
        let is_type = |d: &Definition| {
            matches!(d.kind, DefinitionKind::Class | DefinitionKind::Interface)
        };
        if a.kind == DefinitionKind::Function && is_type(b) {
            return Some(if favor_types { b.clone() } else { a.clone() });
        }
        if b.kind == DefinitionKind::Function && is_type(a) {
            return Some(if favor_types { a.clone() } else { b.clone() });
        }
    }

    let (first, rest) = candidates.split_first()?;
    let mut resolved = first.clone();
    for next in rest {
        let merged = if resolved.kind.is_variable() {
            if next.kind.is_variable() {
                merge_variables(ctx, file_scope, &resolved, next)
            } else if next.kind.is_function() {
                merge_function_and_variable(ctx, file_scope, next, &resolved)
            } else {
                None
            }
        } else if resolved.kind.is_function() {
            if next.kind.is_function() {
                merge_functions(ctx, file_scope, &resolved, next)
            } else if next.kind.is_variable() {
                merge_function_and_variable(ctx, file_scope, &resolved, next)
            } else {
                None
            }
        } else {
            None
        };
        resolved = merged?;
    }
    Some(resolved)
}

fn is_getter_setter_pair(a: &Definition, b: &Definition) -> bool {
    let pair = matches!(
        (a.kind, b.kind),
        (DefinitionKind::Getter, DefinitionKind::Setter)
            | (DefinitionKind::Setter, DefinitionKind::Getter)
    );
    pair && same_declaration_site(a, b)
}

/// Same base name, same namespace, same declaring scope.
fn same_declaration_site(a: &Definition, b: &Definition) -> bool {
    a.base_name() == b.base_name()
        && a.namespace() == b.namespace()
        && a.unit() == b.unit()
        && a.containing_scope() == b.containing_scope()
}

/// Redeclaration merges only happen in file and function scopes.
fn in_redeclarable_scope(ctx: &dyn ResolutionContext, file_scope: &FileScope, def: &Definition) -> bool {
    with_file_scope(ctx, file_scope, def.unit(), |fs| {
        fs.scope(def.containing_scope())
            .is_some_and(|s| s.kind.allows_redeclaration())
    })
    .unwrap_or(false)
}

fn declared_type(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    def: &Definition,
) -> Option<Arc<Definition>> {
    with_file_scope(ctx, file_scope, def.unit(), |fs| resolve_type(ctx, fs, def, None)).flatten()
}

fn same_definition(a: &Option<Arc<Definition>>, b: &Option<Arc<Definition>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn merge_variables(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    first: &Arc<Definition>,
    second: &Arc<Definition>,
) -> Option<Arc<Definition>> {
    if !same_declaration_site(first, second)
        || first.kind == DefinitionKind::Constant
        || second.kind == DefinitionKind::Constant
        || !in_redeclarable_scope(ctx, file_scope, first)
    {
        return None;
    }
    let first_type = declared_type(ctx, file_scope, first);
    let second_type = declared_type(ctx, file_scope, second);
    if same_definition(&first_type, &second_type) {
        return Some(first.clone());
    }
    let any = ctx.project_scope().builtin(ctx, BuiltinType::Any);
    if same_definition(&first_type, &any) {
        return Some(second.clone());
    }
    if same_definition(&second_type, &any) {
        return Some(first.clone());
    }
    None
}

fn merge_functions(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    first: &Arc<Definition>,
    second: &Arc<Definition>,
) -> Option<Arc<Definition>> {
    if !same_declaration_site(first, second) || !in_redeclarable_scope(ctx, file_scope, first) {
        return None;
    }
    // The last declaration wins.
    if first.start() >= second.start() {
        Some(first.clone())
    } else {
        Some(second.clone())
    }
}

fn merge_function_and_variable(
    ctx: &dyn ResolutionContext,
    file_scope: &FileScope,
    function: &Arc<Definition>,
    variable: &Arc<Definition>,
) -> Option<Arc<Definition>> {
    if !same_declaration_site(function, variable)
        || variable.kind == DefinitionKind::Constant
        || function.kind.is_accessor()
        || !in_redeclarable_scope(ctx, file_scope, variable)
    {
        return None;
    }
    let var_type = declared_type(ctx, file_scope, variable);
    let function_type = ctx.project_scope().builtin(ctx, BuiltinType::Function);
    let any = ctx.project_scope().builtin(ctx, BuiltinType::Any);
    if same_definition(&var_type, &function_type) || same_definition(&var_type, &any) {
        return Some(function.clone());
    }
    None
}

//! Scopes, definitions and name resolution for the asc compiler.
//!
//! `bind_file` turns a parsed `FileNode` into a `FileScope`: a tree of
//! scopes holding `Definition`s. Names are resolved through `Reference`s
//! against the scope chain and, past the file, the project-wide
//! `ProjectScope`. Everything a lookup needs from the rest of the project
//! goes through the `ResolutionContext` trait.

pub mod namespace;
pub use namespace::{NamespaceKey, OpenNamespaces, make_qname, split_qname};

pub mod definitions;
pub use definitions::{
    BuiltinType, Definition, DefinitionFlags, DefinitionInit, DefinitionKind, ParamInfo,
};

pub mod scopes;
pub use scopes::{FileScope, ImportDirective, Scope, ScopeId, ScopeKind};

pub mod references;
pub use references::{LexicalReference, ParameterizedReference, QualifiedReference, Reference};

pub mod reference_cache;
pub use reference_cache::ReferenceCache;

pub mod context;
pub use context::ResolutionContext;

pub mod project_scope;
pub use project_scope::{DefinitionOrigin, DefinitionPriority, ProjectScope};

pub mod scope_cache;
pub use scope_cache::{CacheKey, LookupKind, ScopeCache};

pub mod resolution;
pub use resolution::{
    find_property, find_property_multiname, find_property_qualified, resolve_base_class,
    resolve_type,
};

pub mod ambiguity;
pub use ambiguity::resolve_ambiguities;

mod state;
pub use state::{bind_file, reconnect};

//! What resolution needs from the surrounding project.

use crate::project_scope::ProjectScope;
use crate::scope_cache::ScopeCache;
use crate::scopes::FileScope;
use asc_common::{DependencyType, UnitId};
use std::sync::Arc;

/// The project as seen from a name lookup.
///
/// Implementations are shared across worker threads; `file_scope` may block
/// while another thread builds the requested unit's scope.
pub trait ResolutionContext: Send + Sync {
    fn project_scope(&self) -> &ProjectScope;

    /// File scope of `unit`, building it if needed. `None` when the unit is
    /// unknown or its scope could not be built.
    fn file_scope(&self, unit: UnitId) -> Option<Arc<FileScope>>;

    /// Record that `from` depends on a definition `qname` declared in `to`.
    /// Only called with two distinct, real units.
    fn add_dependency(&self, from: UnitId, to: UnitId, dependency: DependencyType, qname: &str);

    /// Lookup cache for resolutions made from `unit`.
    fn scope_cache(&self, _unit: UnitId) -> Option<Arc<ScopeCache>> {
        None
    }

    /// Map a manifest name (component tag or alias) to a qualified name.
    fn resolve_manifest(&self, _name: &str) -> Option<Arc<str>> {
        None
    }
}

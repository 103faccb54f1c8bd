//! The project-wide symbol table.
//!
//! Maps qualified names to the definitions units export. Before a unit's file
//! scope is built it may register a *promise* for the qname its path implies;
//! looking the promise up builds the unit's file scope through the
//! `ResolutionContext` and replaces it with the real definitions.
//!
//! When several units define the same qname, the one with the best
//! `DefinitionPriority` shadows the rest.

use crate::context::ResolutionContext;
use crate::definitions::{BuiltinType, Definition, DefinitionFlags, DefinitionInit, DefinitionKind};
use crate::namespace::{NamespaceKey, OpenNamespaces, make_qname, split_qname};
use crate::scopes::FileScope;
use asc_common::UnitId;
use dashmap::DashMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::cmp::Ordering as CmpOrdering;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Where a unit came from, lowest precedence first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DefinitionOrigin {
    Library,
    SourcePath,
    SourceList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DefinitionPriority {
    pub origin: DefinitionOrigin,
    /// Position within its list; earlier wins.
    pub order: u32,
}

impl DefinitionPriority {
    pub fn new(origin: DefinitionOrigin, order: u32) -> DefinitionPriority {
        DefinitionPriority { origin, order }
    }

    /// Greater is better.
    pub fn compare(&self, other: &DefinitionPriority) -> CmpOrdering {
        self.origin
            .cmp(&other.origin)
            .then_with(|| other.order.cmp(&self.order))
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Promise {
        unit: UnitId,
        priority: DefinitionPriority,
    },
    Actual {
        def: Arc<Definition>,
        priority: DefinitionPriority,
    },
}

impl Slot {
    fn unit(&self) -> UnitId {
        match self {
            Slot::Promise { unit, .. } => *unit,
            Slot::Actual { def, .. } => def.unit(),
        }
    }

    fn priority(&self) -> DefinitionPriority {
        match self {
            Slot::Promise { priority, .. } | Slot::Actual { priority, .. } => *priority,
        }
    }
}

#[derive(Debug)]
pub struct ProjectScope {
    entries: DashMap<Arc<str>, SmallVec<[Slot; 1]>>,
    /// Base name -> qnames.
    by_name: DashMap<Arc<str>, SmallVec<[Arc<str>; 2]>>,
    /// Package (and every parent package) -> number of qnames inside.
    packages: DashMap<Arc<str>, u32>,
    /// Base name -> units whose lookup of it came up empty.
    unfound: DashMap<Arc<str>, FxHashSet<UnitId>>,
    /// Element qname -> applied `Vector.<T>`.
    vectors: DashMap<Arc<str>, Arc<Definition>>,
    implicit: FxHashMap<BuiltinType, Arc<Definition>>,
    generation: AtomicU64,
}

impl Default for ProjectScope {
    fn default() -> Self {
        Self::new()
    }
}

const MAX_PROMISE_ROUNDS: usize = 3;

impl ProjectScope {
    pub fn new() -> ProjectScope {
        let scope = ProjectScope {
            entries: DashMap::new(),
            by_name: DashMap::new(),
            packages: DashMap::new(),
            unfound: DashMap::new(),
            vectors: DashMap::new(),
            implicit: BuiltinType::IMPLICIT
                .into_iter()
                .map(|ty| (ty, Arc::new(implicit_definition(ty))))
                .collect(),
            generation: AtomicU64::new(0),
        };
        let priority = DefinitionPriority::new(DefinitionOrigin::Library, 0);
        for def in scope.implicit.values() {
            scope.insert_slot(
                def.qname().clone(),
                Slot::Actual {
                    def: def.clone(),
                    priority,
                },
            );
        }
        scope
    }

    /// Bumped whenever the set of definitions changes.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn insert_slot(&self, qname: Arc<str>, slot: Slot) {
        let (package, base) = split_qname(&qname);
        let new_qname = {
            let mut entry = self.entries.entry(qname.clone()).or_default();
            let fresh = entry.is_empty();
            entry.push(slot);
            fresh
        };
        if new_qname {
            let mut names = self.by_name.entry(Arc::from(base)).or_default();
            if !names.contains(&qname) {
                names.push(qname.clone());
            }
            drop(names);
            for prefix in package_prefixes(package) {
                *self.packages.entry(Arc::from(prefix)).or_insert(0) += 1;
            }
        }
    }

    fn remove_slots(&self, qname: &Arc<str>, unit: UnitId) {
        let emptied = {
            let Some(mut entry) = self.entries.get_mut(qname) else {
                return;
            };
            entry.retain(|slot| slot.unit() != unit);
            entry.is_empty()
        };
        if !emptied {
            return;
        }
        self.entries.remove_if(qname, |_, slots| slots.is_empty());
        let (package, base) = split_qname(qname);
        if let Some(mut names) = self.by_name.get_mut(base) {
            names.retain(|n| n != qname);
        }
        self.by_name.remove_if(base, |_, names| names.is_empty());
        for prefix in package_prefixes(package) {
            if let Some(mut count) = self.packages.get_mut(prefix) {
                *count = count.saturating_sub(1);
            }
            self.packages.remove_if(prefix, |_, count| *count == 0);
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Promise that `unit` defines `qname`.
    pub fn add_promise(&self, unit: UnitId, qname: &str, priority: DefinitionPriority) {
        trace!(%unit, qname, "add promise");
        self.insert_slot(Arc::from(qname), Slot::Promise { unit, priority });
        self.bump();
    }

    /// Replace the unit's promises with its externally visible definitions.
    /// Returns units that failed to find one of the new names before.
    pub fn add_file_scope(&self, file_scope: &FileScope, priority: DefinitionPriority) -> Vec<UnitId> {
        let unit = file_scope.unit();
        let promised: Vec<Arc<str>> = self
            .entries
            .iter()
            .filter(|e| {
                e.value()
                    .iter()
                    .any(|s| matches!(s, Slot::Promise { unit: u, .. } if *u == unit))
            })
            .map(|e| e.key().clone())
            .collect();
        for qname in &promised {
            self.remove_slots(qname, unit);
        }

        let mut invalidated = FxHashSet::default();
        let visible = file_scope.externally_visible();
        for def in &visible {
            self.insert_slot(
                def.qname().clone(),
                Slot::Actual {
                    def: def.clone(),
                    priority,
                },
            );
            if let Some((_, waiting)) = self.unfound.remove(def.base_name()) {
                invalidated.extend(waiting.into_iter().filter(|&u| u != unit));
            }
        }
        self.vectors.clear();
        self.bump();
        debug!(
            %unit,
            definitions = visible.len(),
            invalidated = invalidated.len(),
            "added file scope to project"
        );
        let mut invalidated: Vec<UnitId> = invalidated.into_iter().collect();
        invalidated.sort();
        invalidated
    }

    /// Remove everything `unit` contributed; re-register `promise` if given.
    pub fn remove_unit(&self, unit: UnitId, promise: Option<(&str, DefinitionPriority)>) {
        let qnames: Vec<Arc<str>> = self
            .entries
            .iter()
            .filter(|e| e.value().iter().any(|s| s.unit() == unit))
            .map(|e| e.key().clone())
            .collect();
        for qname in &qnames {
            self.remove_slots(qname, unit);
        }
        for mut waiting in self.unfound.iter_mut() {
            waiting.remove(&unit);
        }
        self.vectors.clear();
        if let Some((qname, priority)) = promise {
            self.insert_slot(Arc::from(qname), Slot::Promise { unit, priority });
        }
        self.bump();
        trace!(%unit, removed = qnames.len(), "removed unit from project");
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    fn best_slot(&self, qname: &str) -> Option<Slot> {
        let entry = self.entries.get(qname)?;
        entry
            .iter()
            .reduce(|best, slot| {
                if slot.priority().compare(&best.priority()) == CmpOrdering::Greater {
                    slot
                } else {
                    best
                }
            })
            .cloned()
    }

    /// Winning definition for `qname`, fulfilling a promise if needed.
    pub fn lookup_qname(&self, ctx: &dyn ResolutionContext, qname: &str) -> Option<Arc<Definition>> {
        for _ in 0..MAX_PROMISE_ROUNDS {
            match self.best_slot(qname)? {
                Slot::Actual { def, .. } => return Some(def),
                Slot::Promise { unit, .. } => {
                    trace!(qname, %unit, "fulfilling promise");
                    if ctx.file_scope(unit).is_none() {
                        self.remove_slots(&Arc::from(qname), unit);
                    }
                }
            }
        }
        None
    }

    /// Definitions named `name` in namespaces open in `open`, ordered by
    /// qname. An empty result is remembered against `referencing`.
    pub fn find_by_name(
        &self,
        ctx: &dyn ResolutionContext,
        name: &str,
        open: &OpenNamespaces,
        referencing: UnitId,
    ) -> SmallVec<[Arc<Definition>; 2]> {
        let mut qnames: SmallVec<[Arc<str>; 2]> = match self.by_name.get(name) {
            Some(names) => names.clone(),
            None => SmallVec::new(),
        };
        qnames.sort();
        let mut found: SmallVec<[Arc<Definition>; 2]> = SmallVec::new();
        for qname in qnames {
            let package: Arc<str> = Arc::from(split_qname(&qname).0);
            if !open.admits(&NamespaceKey::Public(package.clone()), name)
                && !open.admits(&NamespaceKey::Internal(package), name)
            {
                continue;
            }
            if let Some(def) = self.lookup_qname(ctx, &qname)
                && open.admits(def.namespace(), name)
                && !found.iter().any(|f| Arc::ptr_eq(f, &def))
            {
                found.push(def);
            }
        }
        if found.is_empty() && referencing.is_some() {
            self.unfound
                .entry(Arc::from(name))
                .or_default()
                .insert(referencing);
        }
        found
    }

    /// Definition of `name` declared exactly in `ns`.
    pub fn find_qualified(
        &self,
        ctx: &dyn ResolutionContext,
        ns: &NamespaceKey,
        name: &str,
        referencing: UnitId,
    ) -> Option<Arc<Definition>> {
        let found = match ns {
            NamespaceKey::Public(pkg) | NamespaceKey::Internal(pkg) => self
                .lookup_qname(ctx, &make_qname(pkg, name))
                .filter(|def| def.namespace() == ns),
            NamespaceKey::Custom(_) => {
                let mut qnames: SmallVec<[Arc<str>; 2]> = match self.by_name.get(name) {
                    Some(names) => names.clone(),
                    None => SmallVec::new(),
                };
                qnames.sort();
                qnames
                    .into_iter()
                    .filter_map(|q| self.lookup_qname(ctx, &q))
                    .find(|def| def.namespace() == ns)
            }
            _ => None,
        };
        if found.is_none() && referencing.is_some() {
            self.unfound
                .entry(Arc::from(name))
                .or_default()
                .insert(referencing);
        }
        found
    }

    pub fn builtin(&self, ctx: &dyn ResolutionContext, ty: BuiltinType) -> Option<Arc<Definition>> {
        if let Some(def) = self.implicit.get(&ty) {
            return Some(def.clone());
        }
        self.lookup_qname(ctx, ty.qname())
    }

    /// `Vector.<element>`, one definition per element type.
    pub fn applied_vector(&self, vector: &Arc<Definition>, element: &Arc<Definition>) -> Arc<Definition> {
        self.vectors
            .entry(element.qname().clone())
            .or_insert_with(|| {
                let name: Arc<str> = Arc::from(format!("Vector.<{}>", element.qname()));
                let mut init = DefinitionInit::new(
                    DefinitionKind::AppliedVector,
                    name.clone(),
                    name,
                    vector.namespace().clone(),
                    vector.unit(),
                );
                init.members_scope = vector.members_scope();
                init.flags = DefinitionFlags::IMPLICIT;
                init.detail = Some(element.qname().clone());
                Arc::new(Definition::new(init))
            })
            .clone()
    }

    pub fn contains_qname(&self, qname: &str) -> bool {
        self.entries.contains_key(qname)
    }

    /// Some registered qname lives in `package` or below it.
    pub fn is_package(&self, package: &str) -> bool {
        package.is_empty() || self.packages.contains_key(package)
    }

    /// Units that looked up `name` and found nothing.
    pub fn unfound_dependents(&self, name: &str) -> Vec<UnitId> {
        let mut units: Vec<UnitId> = self
            .unfound
            .get(name)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        units.sort();
        units
    }
}

fn implicit_definition(ty: BuiltinType) -> Definition {
    let name: Arc<str> = Arc::from(ty.qname());
    let mut init = DefinitionInit::new(
        DefinitionKind::Implicit,
        name.clone(),
        name,
        NamespaceKey::public_root(),
        UnitId::NONE,
    );
    init.flags = DefinitionFlags::IMPLICIT;
    Definition::new(init)
}

/// `a.b.c` -> `a`, `a.b`, `a.b.c`. Nothing for the unnamed package.
fn package_prefixes(package: &str) -> impl Iterator<Item = &str> {
    package
        .match_indices('.')
        .map(|(i, _)| &package[..i])
        .chain((!package.is_empty()).then_some(package))
}

#[cfg(test)]
#[path = "../tests/project_scope_tests.rs"]
mod project_scope_tests;

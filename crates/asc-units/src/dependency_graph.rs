//! Dependency graph between compilation units, for ordering and invalidation.
//!
//! When a lookup in unit A resolves to a definition declared in unit B, an
//! edge A -> B is recorded with the kind of dependency and the qname that
//! caused it. Both directions are tracked:
//! - `dependencies`: A -> {B} (what A depends on)
//! - `dependents`: B -> {A} (what depends on B)
//!
//! Inheritance edges order the topological sort; every edge kind feeds
//! invalidation, but only non-expression edges propagate it further.

use asc_common::{DependencyType, DependencyTypeSet, UnitId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Everything A depends on in B.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Edge {
    pub types: DependencyTypeSet,
    /// Qualified name -> kinds it was referenced as.
    pub names: BTreeMap<Arc<str>, DependencyTypeSet>,
}

impl Edge {
    fn add(&mut self, dependency: DependencyType, qname: &str) {
        let ty = DependencyTypeSet::from(dependency);
        self.types |= ty;
        if let Some(types) = self.names.get_mut(qname) {
            *types |= ty;
        } else {
            self.names.insert(Arc::from(qname), ty);
        }
    }

    pub fn is_inheritance(&self) -> bool {
        self.types.contains(DependencyTypeSet::INHERITANCE)
    }
}

/// Edge kinds whose change forces the depender's dependents to rebuild too.
const RECURSIVE_INVALIDATION: DependencyTypeSet = DependencyTypeSet::INHERITANCE
    .union(DependencyTypeSet::SIGNATURE)
    .union(DependencyTypeSet::NAMESPACE);

#[derive(Default, Debug)]
pub struct DependencyGraph {
    units: FxHashSet<UnitId>,
    /// Forward edges: unit -> units it depends on
    dependencies: FxHashMap<UnitId, FxHashMap<UnitId, Edge>>,
    /// Reverse edges: unit -> units that depend on it
    dependents: FxHashMap<UnitId, FxHashSet<UnitId>>,
    /// Cycles broken by the last `topological_sort`.
    last_cycle: Option<Vec<UnitId>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, unit: UnitId) {
        self.units.insert(unit);
    }

    pub fn contains(&self, unit: UnitId) -> bool {
        self.units.contains(&unit)
    }

    /// Record that `from` uses `qname` declared in `to`. Self edges are ignored.
    pub fn add_dependency(&mut self, from: UnitId, to: UnitId, dependency: DependencyType, qname: &str) {
        if from == to {
            return;
        }
        self.units.insert(from);
        self.units.insert(to);
        self.dependencies
            .entry(from)
            .or_default()
            .entry(to)
            .or_default()
            .add(dependency, qname);
        self.dependents.entry(to).or_default().insert(from);
        trace!(%from, %to, dependency = dependency.as_str(), qname, "dependency");
    }

    /// Drop every outgoing edge of `unit`.
    pub fn remove_dependencies(&mut self, unit: UnitId) {
        let Some(old) = self.dependencies.remove(&unit) else {
            return;
        };
        for to in old.keys() {
            if let Some(rev) = self.dependents.get_mut(to) {
                rev.remove(&unit);
                if rev.is_empty() {
                    self.dependents.remove(to);
                }
            }
        }
    }

    /// Remove `unit` and every edge touching it.
    pub fn remove_unit(&mut self, unit: UnitId) {
        self.remove_dependencies(unit);
        if let Some(old_dependents) = self.dependents.remove(&unit) {
            for dependent in old_dependents {
                if let Some(edges) = self.dependencies.get_mut(&dependent) {
                    edges.remove(&unit);
                }
            }
        }
        self.units.remove(&unit);
    }

    /// Units `unit` depends on, sorted.
    pub fn direct_dependencies(&self, unit: UnitId) -> Vec<UnitId> {
        let mut units: Vec<UnitId> = self
            .dependencies
            .get(&unit)
            .map(|edges| edges.keys().copied().collect())
            .unwrap_or_default();
        units.sort();
        units
    }

    /// Units depending on `unit` through an edge with a kind in `types`, sorted.
    pub fn direct_reverse_dependencies(&self, unit: UnitId, types: DependencyTypeSet) -> Vec<UnitId> {
        let mut units: Vec<UnitId> = self
            .dependents
            .get(&unit)
            .into_iter()
            .flatten()
            .copied()
            .filter(|from| self.dependency_types(*from, unit).intersects(types))
            .collect();
        units.sort();
        units
    }

    pub fn edge(&self, from: UnitId, to: UnitId) -> Option<&Edge> {
        self.dependencies.get(&from)?.get(&to)
    }

    /// Kinds of every dependency from `from` on `to`; empty when unrelated.
    pub fn dependency_types(&self, from: UnitId, to: UnitId) -> DependencyTypeSet {
        self.edge(from, to).map(|e| e.types).unwrap_or_default()
    }

    /// `roots` and everything they depend on, transitively, with every unit
    /// after the units it inherits from. Ties and independent units are
    /// ordered by id. Inheritance cycles are broken at the edge that closes
    /// them; the cycle is kept in `last_cycle`.
    pub fn topological_sort(&mut self, roots: &[UnitId]) -> Vec<UnitId> {
        // Everything reachable from the roots, through any edge.
        let mut reachable = FxHashSet::default();
        let mut stack: Vec<UnitId> = roots.to_vec();
        while let Some(unit) = stack.pop() {
            if reachable.insert(unit) {
                stack.extend(self.direct_dependencies(unit));
            }
        }
        let mut order: Vec<UnitId> = reachable.into_iter().collect();
        order.sort();

        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }
        let mut marks: FxHashMap<UnitId, Mark> = FxHashMap::default();
        let mut sorted = Vec::with_capacity(order.len());
        let mut cycle = None;

        for &start in &order {
            if marks.contains_key(&start) {
                continue;
            }
            // Iterative DFS over inheritance edges; post-order is the answer.
            let mut path: Vec<(UnitId, Vec<UnitId>)> = Vec::new();
            marks.insert(start, Mark::Visiting);
            path.push((start, self.inheritance_targets(start)));
            while let Some((unit, pending)) = path.last_mut() {
                let unit = *unit;
                if let Some(next) = pending.pop() {
                    match marks.get(&next).copied() {
                        None => {
                            marks.insert(next, Mark::Visiting);
                            let targets = self.inheritance_targets(next);
                            path.push((next, targets));
                        }
                        Some(Mark::Visiting) => {
                            if cycle.is_none() {
                                let from = path.iter().position(|(u, _)| *u == next).unwrap_or(0);
                                cycle = Some(path[from..].iter().map(|(u, _)| *u).collect());
                            }
                        }
                        Some(Mark::Done) => {}
                    }
                } else {
                    marks.insert(unit, Mark::Done);
                    sorted.push(unit);
                    path.pop();
                }
            }
        }

        if let Some(cycle) = &cycle {
            debug!(?cycle, "inheritance cycle broken during sort");
        }
        self.last_cycle = cycle;
        sorted
    }

    /// Inheritance targets of `unit`, highest id first so popping visits
    /// them in ascending order.
    fn inheritance_targets(&self, unit: UnitId) -> Vec<UnitId> {
        let mut targets: Vec<UnitId> = self
            .dependencies
            .get(&unit)
            .into_iter()
            .flatten()
            .filter(|(_, edge)| edge.is_inheritance())
            .map(|(to, _)| *to)
            .collect();
        targets.sort_by(|a, b| b.cmp(a));
        targets
    }

    pub fn last_cycle(&self) -> Option<&[UnitId]> {
        self.last_cycle.as_deref()
    }

    /// Units to clean when `changed` change: the changed units, their direct
    /// dependents, and transitively the dependents of anything reached through
    /// an inheritance, signature or namespace edge.
    pub fn compute_invalidation_set(&self, changed: &[UnitId]) -> Vec<UnitId> {
        let mut result: FxHashSet<UnitId> = FxHashSet::default();
        let mut work: Vec<(UnitId, UnitId)> = Vec::new();
        let mut visited_edges: FxHashSet<(UnitId, UnitId)> = FxHashSet::default();

        for &unit in changed {
            if result.insert(unit) {
                work.extend(self.incoming(unit));
            }
        }
        while let Some((from, to)) = work.pop() {
            if !visited_edges.insert((from, to)) {
                continue;
            }
            result.insert(from);
            if self.dependency_types(from, to).intersects(RECURSIVE_INVALIDATION) {
                work.extend(self.incoming(from));
            }
        }

        let mut result: Vec<UnitId> = result.into_iter().collect();
        result.sort();
        result
    }

    fn incoming(&self, unit: UnitId) -> impl Iterator<Item = (UnitId, UnitId)> + '_ {
        self.dependents
            .get(&unit)
            .into_iter()
            .flatten()
            .map(move |&from| (from, unit))
    }

    /// Number of units tracked.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    pub fn clear(&mut self) {
        self.units.clear();
        self.dependencies.clear();
        self.dependents.clear();
        self.last_cycle = None;
    }
}

#[cfg(test)]
#[path = "../tests/dependency_graph_tests.rs"]
mod dependency_graph_tests;

//! Namespace qualifiers and the set of namespaces open at a scope.
//!
//! Every definition lives in exactly one namespace. A plain name is visible
//! at a scope when the definition's namespace is open there: the public and
//! internal namespaces of the enclosing package, the private and protected
//! namespaces of enclosing classes, imported packages, and namespaces opened
//! with `use namespace`.

use asc_common::UnitId;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NamespaceKey {
    /// Public namespace of a package (`""` for the unnamed package).
    Public(Arc<str>),
    /// Internal namespace of a package.
    Internal(Arc<str>),
    /// Private namespace of a class, keyed by the class qname.
    Private(Arc<str>),
    /// Protected namespace of a class, keyed by the class qname.
    Protected(Arc<str>),
    /// Definitions outside any package block are private to their file.
    FilePrivate(UnitId),
    /// User-declared namespace, compared by name.
    Custom(Arc<str>),
}

impl NamespaceKey {
    pub fn public_root() -> NamespaceKey {
        NamespaceKey::Public(Arc::from(""))
    }

    pub fn is_public(&self) -> bool {
        matches!(self, NamespaceKey::Public(_))
    }

    /// Package name of a public or internal namespace.
    pub fn package(&self) -> Option<&str> {
        match self {
            NamespaceKey::Public(pkg) | NamespaceKey::Internal(pkg) => Some(pkg),
            _ => None,
        }
    }
}

impl fmt::Display for NamespaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceKey::Public(pkg) => write!(f, "public({pkg})"),
            NamespaceKey::Internal(pkg) => write!(f, "internal({pkg})"),
            NamespaceKey::Private(class) => write!(f, "private({class})"),
            NamespaceKey::Protected(class) => write!(f, "protected({class})"),
            NamespaceKey::FilePrivate(unit) => write!(f, "file-private({unit})"),
            NamespaceKey::Custom(name) => f.write_str(name),
        }
    }
}

/// Split `a.b.C` into (`a.b`, `C`). Unqualified names have an empty package.
pub fn split_qname(qname: &str) -> (&str, &str) {
    match qname.rfind('.') {
        Some(dot) => (&qname[..dot], &qname[dot + 1..]),
        None => ("", qname),
    }
}

pub fn make_qname(package: &str, base: &str) -> Arc<str> {
    if package.is_empty() {
        Arc::from(base)
    } else {
        Arc::from(format!("{package}.{base}"))
    }
}

/// Namespaces open at one scope.
///
/// Explicit imports open a package's public namespace for a single name;
/// everything else opens a namespace for all names.
#[derive(Debug, Clone, Default)]
pub struct OpenNamespaces {
    open: FxHashSet<NamespaceKey>,
    per_name: FxHashMap<Arc<str>, SmallVec<[NamespaceKey; 1]>>,
    /// Packages whose public namespace is open, wildcard or not.
    imported_packages: FxHashSet<Arc<str>>,
}

impl OpenNamespaces {
    pub fn new() -> OpenNamespaces {
        OpenNamespaces::default()
    }

    pub fn open(&mut self, ns: NamespaceKey) {
        if let Some(pkg) = ns.package()
            && ns.is_public()
        {
            self.imported_packages.insert(Arc::from(pkg));
        }
        self.open.insert(ns);
    }

    /// `import pkg.name;`
    pub fn open_for_name(&mut self, package: &str, name: &str) {
        self.imported_packages.insert(Arc::from(package));
        let entry = self.per_name.entry(Arc::from(name)).or_default();
        let ns = NamespaceKey::Public(Arc::from(package));
        if !entry.contains(&ns) {
            entry.push(ns);
        }
    }

    /// Is a definition named `name` in `ns` visible here?
    pub fn admits(&self, ns: &NamespaceKey, name: &str) -> bool {
        self.open.contains(ns) || self.per_name.get(name).is_some_and(|list| list.contains(ns))
    }

    pub fn is_open(&self, ns: &NamespaceKey) -> bool {
        self.open.contains(ns)
    }

    /// Packages reachable through this set, for the project-wide search.
    pub fn candidate_packages(&self, name: &str) -> SmallVec<[Arc<str>; 4]> {
        let mut packages: SmallVec<[Arc<str>; 4]> = SmallVec::new();
        for ns in &self.open {
            if let Some(pkg) = ns.package()
                && !packages.iter().any(|p| &**p == pkg)
            {
                packages.push(Arc::from(pkg));
            }
        }
        if let Some(list) = self.per_name.get(name) {
            for ns in list {
                if let Some(pkg) = ns.package()
                    && !packages.iter().any(|p| &**p == pkg)
                {
                    packages.push(Arc::from(pkg));
                }
            }
        }
        packages.sort();
        packages
    }

    pub fn imported_packages(&self) -> impl Iterator<Item = &Arc<str>> {
        self.imported_packages.iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NamespaceKey> {
        self.open.iter()
    }
}

#[cfg(test)]
#[path = "../tests/namespace_tests.rs"]
mod namespace_tests;

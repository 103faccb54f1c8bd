//! Kinds of inter-unit dependencies.
//!
//! A dependency edge records why one unit's output depends on another unit's
//! declarations. The kind decides how much of the depender must be rebuilt
//! when the dependee changes.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    /// Base class or implemented interface.
    Inheritance,
    /// Type in a declaration signature (variable type, parameter, return).
    Signature,
    /// Namespace used as a declaration attribute or in `use namespace`.
    Namespace,
    /// Any reference from a function body or initializer.
    Expression,
}

impl DependencyType {
    pub const ALL: [DependencyType; 4] = [
        DependencyType::Inheritance,
        DependencyType::Signature,
        DependencyType::Namespace,
        DependencyType::Expression,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DependencyType::Inheritance => "inheritance",
            DependencyType::Signature => "signature",
            DependencyType::Namespace => "namespace",
            DependencyType::Expression => "expression",
        }
    }
}

bitflags! {
    /// Set of dependency kinds recorded on one edge.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DependencyTypeSet: u8 {
        const INHERITANCE = 1 << 0;
        const SIGNATURE = 1 << 1;
        const NAMESPACE = 1 << 2;
        const EXPRESSION = 1 << 3;
    }
}

impl From<DependencyType> for DependencyTypeSet {
    fn from(ty: DependencyType) -> Self {
        match ty {
            DependencyType::Inheritance => DependencyTypeSet::INHERITANCE,
            DependencyType::Signature => DependencyTypeSet::SIGNATURE,
            DependencyType::Namespace => DependencyTypeSet::NAMESPACE,
            DependencyType::Expression => DependencyTypeSet::EXPRESSION,
        }
    }
}

impl DependencyTypeSet {
    pub fn contains_type(&self, ty: DependencyType) -> bool {
        self.contains(ty.into())
    }

    pub fn types(&self) -> impl Iterator<Item = DependencyType> + '_ {
        DependencyType::ALL
            .into_iter()
            .filter(|ty| self.contains_type(*ty))
    }
}

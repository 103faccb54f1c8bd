//! Identifiers shared across crates.

use serde::{Deserialize, Serialize};

/// Identifies a compilation unit within a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub u32);

impl UnitId {
    pub const NONE: UnitId = UnitId(u32::MAX);

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            f.write_str("unit#none")
        } else {
            write!(f, "unit#{}", self.0)
        }
    }
}

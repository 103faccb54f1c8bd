//! Common types and utilities for the asc ActionScript compiler.
//!
//! This crate provides foundational types used across all asc crates:
//! - Source spans (`Span`)
//! - Position/Range types and line maps for source locations
//! - Absolute-offset lookup across included files (`OffsetLookup`)
//! - Compiler problems and their message table
//! - Compilation unit identifiers and dependency kinds
//! - Compiler limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Position/Range types for line/column source locations
pub mod position;
pub use position::{LineMap, Position, Range, SourceLocation};

// Absolute offsets across include boundaries
pub mod offset_lookup;
pub use offset_lookup::{OffsetLookup, OffsetRegion};

// Compiler problems (syntax and semantic diagnostics)
pub mod problems;
pub use problems::{CompilerProblem, ProblemSeverity, format_message};

// Identifiers and dependency classification shared by binder and units
pub mod ids;
pub use ids::UnitId;

pub mod dependency;
pub use dependency::{DependencyType, DependencyTypeSet};

// Centralized limits and thresholds
pub mod limits;

//! Incremental compilation units for the asc compiler.
//!
//! A `Workspace` hands out file text and tracks changes. Each `Project` in
//! it owns a set of `CompilationUnit`s, one per source file, sharing a
//! project scope and a dependency graph. A unit answers five requests
//! (syntax tree, file scope, outgoing dependencies, ABC bytes, SWF tags),
//! each computed at most once per invalidation no matter how many threads
//! ask for it.

pub mod error;
pub use error::{CompileError, CompileResult};

pub mod request;
pub use request::{CancelToken, Request, RequestSlot};

pub mod hard_to_weak;
pub use hard_to_weak::HardToWeak;

pub mod dependency_graph;
pub use dependency_graph::{DependencyGraph, Edge};

pub mod config;
pub use config::{Flavor, ProjectConfig};

pub mod file_spec;
pub use file_spec::{
    DiskFile, FileSpecification, FileSpecificationGetter, MemoryFile, SpecIncludeLoader,
    normalize_path,
};

pub mod builtins;

pub mod bindable;
pub use bindable::apply_bindable_rewrite;

pub mod codegen;
pub use codegen::{AbcResult, CodeGenerator, EmbedDescriptor, GenerateInput, SummaryGenerator};

pub mod compilation_unit;
pub use compilation_unit::{
    CompilationUnit, FileScopeResult, Operations, OutgoingDependenciesResult, SwfTagsResult,
    SyntaxTreeResult,
};

pub mod project;
pub use project::{BuildOutput, Project};

pub mod workspace;
pub use workspace::Workspace;

//! asc: an ActionScript 3 compiler front end.
//!
//! The work is split over the workspace crates, re-exported here:
//!
//! - [`common`]: spans, problems, unit ids and dependency kinds
//! - [`scanner`]: tokenizer with `include` splicing
//! - [`parser`]: the AST and the recursive-descent parser
//! - [`binder`]: scopes, definitions and name resolution
//! - [`units`]: compilation units, projects and workspaces
//!
//! The `asc` binary is a thin driver over [`cli`].

pub use asc_binder as binder;
pub use asc_common as common;
pub use asc_parser as parser;
pub use asc_scanner as scanner;
pub use asc_units as units;

pub mod cli;
pub mod tracing_config;

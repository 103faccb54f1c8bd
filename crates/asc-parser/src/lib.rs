//! ActionScript 3 parser and AST for the asc compiler.
//!
//! The tree for one compilation unit is a `FileNode`: an arena of `Node`s
//! addressed by `NodeIndex`, plus function bodies parsed on first use.

pub mod parser;
pub use parser::*;

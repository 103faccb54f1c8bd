//! ActionScript 3 parser.
//!
//! `parse_file` tokenizes a compilation unit (splicing includes), builds the
//! node arena with a recursive-descent `ParserState`, and wraps the result in a
//! `FileNode`. Function bodies can be left unparsed until first access.

pub mod node;
pub use node::{
    AccessorKind, DeclData, LiteralKind, MetaArg, MetaTagData, ModifierFlags, Node, NodeData,
    NodeFlags, NodeIndex, NodeKind,
};

pub mod node_arena;
pub use node_arena::NodeArena;

pub mod file_node;
pub use file_node::{FileNode, FunctionBody, NodeRef, ParseOptions, parse_file};

mod queries;

pub mod state;
pub use state::ParserState;

mod state_expressions;
mod state_statements;
mod state_types;

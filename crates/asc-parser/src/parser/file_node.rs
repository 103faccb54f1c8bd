//! `FileNode`: the syntax tree of one compilation unit.
//!
//! The file arena holds everything outside function bodies. When parsing with
//! deferred bodies, each function body is a `DEFERRED_BODY` placeholder block
//! whose statements live in their own arena, parsed from the retained tokens
//! on first access. A `NodeRef` names a node in either arena.
//!
//! Body parsing goes through a `OnceCell`, so concurrent readers of the same
//! body observe a single parse.

use super::node::{Node, NodeFlags, NodeIndex};
use super::node_arena::NodeArena;
use super::state::ParserState;
use asc_common::{CompilerProblem, OffsetLookup};
use asc_scanner::{IncludeLoader, Token, tokenize};
use once_cell::sync::OnceCell;
use rustc_hash::FxHashMap;
use serde_json::json;
use std::ops::Range;
use std::sync::Arc;
use tracing::{debug, debug_span, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Leave function bodies unparsed until first access.
    pub defer_function_bodies: bool,
}

/// A node in the file arena (`body == NONE`) or in a parsed function body
/// (`body` = the placeholder block in the file arena).
///
/// A body's root block is always named by its placeholder, `NodeRef::file`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    pub body: NodeIndex,
    pub node: NodeIndex,
}

impl NodeRef {
    pub const NONE: NodeRef = NodeRef {
        body: NodeIndex::NONE,
        node: NodeIndex::NONE,
    };

    #[inline]
    pub const fn file(node: NodeIndex) -> NodeRef {
        NodeRef {
            body: NodeIndex::NONE,
            node,
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        self.node.is_none()
    }

    #[inline]
    pub fn is_some(&self) -> bool {
        self.node.is_some()
    }

    #[inline]
    pub fn in_body(&self) -> bool {
        self.body.is_some()
    }
}

/// A parsed function body.
#[derive(Debug)]
pub struct FunctionBody {
    pub arena: NodeArena,
    /// Root block; same span as the placeholder.
    pub root: NodeIndex,
    /// Placeholder block in the file arena.
    pub placeholder: NodeIndex,
    /// Syntax problems, already located in physical files.
    pub problems: Vec<CompilerProblem>,
}

#[derive(Debug)]
struct DeferredBody {
    tokens: Range<usize>,
    cell: OnceCell<Arc<FunctionBody>>,
}

#[derive(Debug)]
pub struct FileNode {
    file_name: Arc<str>,
    arena: NodeArena,
    root: NodeIndex,
    lookup: OffsetLookup,
    problems: Vec<CompilerProblem>,
    included_files: Vec<Arc<str>>,
    tokens: Arc<[Token]>,
    bodies: FxHashMap<NodeIndex, DeferredBody>,
}

/// Tokenize (splicing includes through `loader`) and parse one file.
pub fn parse_file(
    file_name: Arc<str>,
    text: Arc<str>,
    loader: Option<&dyn IncludeLoader>,
    options: ParseOptions,
) -> FileNode {
    let _span = debug_span!("parse_file", file = %file_name).entered();
    let tokenized = tokenize(file_name.clone(), text, loader);
    let tokens: Arc<[Token]> = tokenized.tokens.into();

    let mut state = ParserState::new(
        file_name.clone(),
        tokens.clone(),
        0..tokens.len(),
        options.defer_function_bodies,
    );
    let root = state.parse_source_file();
    let (mut arena, parse_problems, deferred) = state.into_parts();
    arena.link_parents(root);

    let lookup = tokenized.lookup;
    let problems: Vec<CompilerProblem> = tokenized
        .problems
        .into_iter()
        .chain(parse_problems)
        .map(|p| p.locate(&lookup))
        .collect();

    let bodies: FxHashMap<NodeIndex, DeferredBody> = deferred
        .into_iter()
        .map(|d| {
            (
                d.block,
                DeferredBody {
                    tokens: d.tokens,
                    cell: OnceCell::new(),
                },
            )
        })
        .collect();

    debug!(
        nodes = arena.len(),
        deferred_bodies = bodies.len(),
        problems = problems.len(),
        includes = tokenized.included_files.len(),
        "parsed file"
    );

    FileNode {
        file_name,
        arena,
        root,
        lookup,
        problems,
        included_files: tokenized.included_files,
        tokens,
        bodies,
    }
}

impl FileNode {
    pub fn file_name(&self) -> &Arc<str> {
        &self.file_name
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Mutable file arena, for post-parse rewrites before the tree is shared.
    pub fn arena_mut(&mut self) -> &mut NodeArena {
        &mut self.arena
    }

    pub fn lookup(&self) -> &OffsetLookup {
        &self.lookup
    }

    /// Tokenizer and file-level parser problems. Body problems are reported
    /// through `FunctionBody::problems`.
    pub fn problems(&self) -> &[CompilerProblem] {
        &self.problems
    }

    pub fn included_files(&self) -> &[Arc<str>] {
        &self.included_files
    }

    // =========================================================================
    // Deferred bodies
    // =========================================================================

    pub fn is_deferred(&self, block: NodeIndex) -> bool {
        self.bodies.contains_key(&block)
    }

    pub fn is_body_parsed(&self, block: NodeIndex) -> bool {
        self.bodies
            .get(&block)
            .is_some_and(|b| b.cell.get().is_some())
    }

    /// Placeholder blocks in source order.
    pub fn deferred_blocks(&self) -> Vec<NodeIndex> {
        let mut blocks: Vec<NodeIndex> = self.bodies.keys().copied().collect();
        blocks.sort_by_key(|&b| self.arena.get(b).map_or(0, |n| n.start));
        blocks
    }

    /// The body behind a placeholder block, parsing it on first access.
    pub fn body(&self, block: NodeIndex) -> Option<&Arc<FunctionBody>> {
        let deferred = self.bodies.get(&block)?;
        Some(
            deferred
                .cell
                .get_or_init(|| Arc::new(self.parse_body(block, deferred.tokens.clone()))),
        )
    }

    fn parse_body(&self, block: NodeIndex, tokens: Range<usize>) -> FunctionBody {
        trace!(file = %self.file_name, block = block.0, "parsing deferred body");
        let mut state = ParserState::new(self.file_name.clone(), self.tokens.clone(), tokens, false);
        let root = state.parse_function_body();
        let (mut arena, problems, _) = state.into_parts();
        arena.link_parents(root);
        FunctionBody {
            arena,
            root,
            placeholder: block,
            problems: problems.into_iter().map(|p| p.locate(&self.lookup)).collect(),
        }
    }

    /// Parse every deferred body now.
    pub fn parse_all_bodies(&self) {
        for block in self.deferred_blocks() {
            let _ = self.body(block);
        }
    }

    /// Problems from bodies that have been parsed so far.
    pub fn body_problems(&self) -> Vec<CompilerProblem> {
        let mut problems = Vec::new();
        for block in self.deferred_blocks() {
            if let Some(body) = self.bodies.get(&block).and_then(|b| b.cell.get()) {
                problems.extend(body.problems.iter().cloned());
            }
        }
        problems
    }

    // =========================================================================
    // Node access through NodeRef
    // =========================================================================

    /// Arena holding nodes of `body` (`NONE` for the file arena).
    pub fn arena_for(&self, body: NodeIndex) -> Option<&NodeArena> {
        if body.is_none() {
            Some(&self.arena)
        } else {
            self.body(body).map(|b| &b.arena)
        }
    }

    pub fn get(&self, r: NodeRef) -> Option<&Node> {
        self.arena_for(r.body)?.get(r.node)
    }

    /// Children in source order. A deferred placeholder yields the body's
    /// top-level statements.
    pub fn children(&self, r: NodeRef) -> Vec<NodeRef> {
        let Some(node) = self.get(r) else {
            return Vec::new();
        };
        if r.body.is_none() && node.flags.contains(NodeFlags::DEFERRED_BODY) {
            let Some(body) = self.body(r.node) else {
                return Vec::new();
            };
            return body
                .arena
                .children(body.root)
                .iter()
                .map(|&c| NodeRef {
                    body: r.node,
                    node: c,
                })
                .collect();
        }
        node.children
            .iter()
            .map(|&c| NodeRef {
                body: r.body,
                node: c,
            })
            .collect()
    }

    pub fn parent(&self, r: NodeRef) -> NodeRef {
        let Some(node) = self.get(r) else {
            return NodeRef::NONE;
        };
        if r.body.is_none() {
            return NodeRef::file(node.parent);
        }
        let root = self.body(r.body).map_or(NodeIndex::NONE, |b| b.root);
        if r.node == root {
            return self.parent(NodeRef::file(r.body));
        }
        if node.parent == root {
            return NodeRef::file(r.body);
        }
        NodeRef {
            body: r.body,
            node: node.parent,
        }
    }

    /// Identifier or qualified-name text of `r`.
    pub fn identifier_text(&self, r: NodeRef) -> Option<&str> {
        self.arena_for(r.body)?.identifier_text(r.node)
    }

    /// Same structure and spans. Deferred bodies compare as placeholders.
    pub fn structurally_equal(&self, other: &FileNode) -> bool {
        self.root == other.root
            && self.arena == other.arena
            && self.deferred_blocks() == other.deferred_blocks()
    }

    /// JSON dump of the file arena and problems; parsed bodies are included
    /// when `with_bodies` is set (parsing them first).
    pub fn to_json(&self, with_bodies: bool) -> serde_json::Value {
        let mut value = json!({
            "file": &*self.file_name,
            "root": self.root,
            "nodes": &self.arena.nodes,
            "problems": &self.problems,
            "includedFiles": self.included_files.iter().map(|f| &**f).collect::<Vec<_>>(),
        });
        if with_bodies {
            let bodies: Vec<serde_json::Value> = self
                .deferred_blocks()
                .into_iter()
                .filter_map(|block| {
                    let body = self.body(block)?;
                    Some(json!({
                        "placeholder": block,
                        "root": body.root,
                        "nodes": &body.arena.nodes,
                        "problems": &body.problems,
                    }))
                })
                .collect();
            value["bodies"] = serde_json::Value::Array(bodies);
        }
        value
    }
}

//! AST node model.
//!
//! Every node is a small header (kind, flags, span, parent, ordered children)
//! plus a `NodeData` payload for the kinds that carry more than structure.
//!
//! # Spans
//!
//! `start..end` covers the node's own syntax. Declarations additionally record
//! a `spanning_start` that reaches back over leading metadata and attribute
//! keywords; those are attached to the declaration (`DeclData`) rather than
//! listed as children, so every child span stays inside its parent's
//! `start..end`.
//!
//! # Children
//!
//! Children are stored in source order. Typed accessors on `DeclData` and
//! friends point at the same indices for direct access.

use asc_common::Span;
use asc_scanner::SyntaxKind;
use bitflags::bitflags;
use serde::Serialize;
use std::sync::Arc;

/// Index of a node inside a `NodeArena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }

    #[inline]
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for NodeIndex {
    fn default() -> Self {
        NodeIndex::NONE
    }
}

#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    File,
    Package,
    Import,
    UseNamespace,
    NamespaceDecl,
    Metadata,
    Class,
    Interface,
    Function,
    Parameter,
    VariableList,
    Variable,

    // Statements
    Block,
    ExpressionStatement,
    Empty,
    If,
    While,
    DoWhile,
    For,
    ForIn,
    ForEach,
    Switch,
    Case,
    Default,
    Return,
    Throw,
    Try,
    Catch,
    Finally,
    With,
    Break,
    Continue,
    Labeled,

    // Expressions
    Identifier,
    QualifiedName,
    NamespaceAccess,
    MemberAccess,
    Index,
    Call,
    New,
    Binary,
    Unary,
    Postfix,
    Conditional,
    Assignment,
    ArrayLiteral,
    ObjectLiteral,
    ObjectProperty,
    VectorLiteral,
    FunctionExpression,
    Literal,
    This,
    Super,

    // Types
    AnyType,
    VoidType,
    VectorType,

    /// Placeholder produced by error recovery.
    Error,
}

impl NodeKind {
    /// Kinds that own a lexical scope.
    pub fn is_scope_owner(self) -> bool {
        matches!(
            self,
            NodeKind::File
                | NodeKind::Package
                | NodeKind::Class
                | NodeKind::Interface
                | NodeKind::Function
                | NodeKind::FunctionExpression
                | NodeKind::Catch
                | NodeKind::With
        )
    }

    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            NodeKind::Class
                | NodeKind::Interface
                | NodeKind::Function
                | NodeKind::VariableList
                | NodeKind::NamespaceDecl
        )
    }

    pub fn is_type(self) -> bool {
        matches!(
            self,
            NodeKind::AnyType
                | NodeKind::VoidType
                | NodeKind::VectorType
                | NodeKind::Identifier
                | NodeKind::QualifiedName
        )
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct NodeFlags: u16 {
        /// Synthesized by a post-parse rewrite; has no source text.
        const IMPLICIT = 1 << 0;
        /// A function body whose statements are parsed on first use.
        const DEFERRED_BODY = 1 << 1;
        /// Produced or truncated by error recovery.
        const HAS_ERROR = 1 << 2;
        /// `import a.b.*`
        const WILDCARD = 1 << 3;
        /// Rest parameter `...args`
        const REST = 1 << 4;
        /// `const` variable list
        const CONST = 1 << 5;
    }
}

bitflags! {
    /// Attribute keywords on a declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct ModifierFlags: u16 {
        const PUBLIC = 1 << 0;
        const PRIVATE = 1 << 1;
        const PROTECTED = 1 << 2;
        const INTERNAL = 1 << 3;
        const STATIC = 1 << 4;
        const FINAL = 1 << 5;
        const OVERRIDE = 1 << 6;
        const DYNAMIC = 1 << 7;
        const NATIVE = 1 << 8;
    }
}

impl ModifierFlags {
    pub fn from_word(word: &str) -> Option<ModifierFlags> {
        Some(match word {
            "public" => ModifierFlags::PUBLIC,
            "private" => ModifierFlags::PRIVATE,
            "protected" => ModifierFlags::PROTECTED,
            "internal" => ModifierFlags::INTERNAL,
            "static" => ModifierFlags::STATIC,
            "final" => ModifierFlags::FINAL,
            "override" => ModifierFlags::OVERRIDE,
            "dynamic" => ModifierFlags::DYNAMIC,
            "native" => ModifierFlags::NATIVE,
            _ => return None,
        })
    }

    pub fn access(self) -> ModifierFlags {
        self & (ModifierFlags::PUBLIC
            | ModifierFlags::PRIVATE
            | ModifierFlags::PROTECTED
            | ModifierFlags::INTERNAL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum AccessorKind {
    #[default]
    None,
    Getter,
    Setter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LiteralKind {
    String,
    Number,
    Boolean,
    Null,
    Regex,
}

/// One `[Tag(key="value", "positional")]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaTagData {
    pub name: Arc<str>,
    pub args: Vec<MetaArg>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetaArg {
    pub key: Option<Arc<str>>,
    pub value: Arc<str>,
}

impl MetaTagData {
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|a| a.key.as_deref() == Some(key))
            .map(|a| &*a.value)
    }
}

/// Payload for declarations and other named constructs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeclData {
    /// Name identifier (or qualified name for packages).
    pub name: NodeIndex,
    pub modifiers: ModifierFlags,
    /// Custom namespace attribute, e.g. `mx_internal var x`.
    pub namespace: Option<Arc<str>>,
    /// `Metadata` node attached to this declaration.
    pub metadata: NodeIndex,
    /// Variable/parameter type or function return type.
    pub type_annotation: NodeIndex,
    /// Variable initializer, parameter default, or namespace URI literal.
    pub initializer: NodeIndex,
    /// `extends` clause of a class.
    pub base: NodeIndex,
    /// `implements` (class) or `extends` (interface) list.
    pub interfaces: Vec<NodeIndex>,
    pub params: Vec<NodeIndex>,
    /// Class/interface/package member block or function body.
    pub body: NodeIndex,
    pub accessor: AccessorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeData {
    None,
    /// Identifier text, dotted qualified-name text, or a label.
    Name(Arc<str>),
    Literal {
        kind: LiteralKind,
        text: Arc<str>,
    },
    /// Operator of a binary, unary, postfix or assignment node.
    Operator(SyntaxKind),
    Decl(Box<DeclData>),
    /// Dotted import name; wildcard flag lives in `NodeFlags`.
    Import(Arc<str>),
    Metadata(Vec<MetaTagData>),
    /// `for (init; cond; update)` parts, `NONE` when omitted.
    ForParts {
        init: NodeIndex,
        condition: NodeIndex,
        update: NodeIndex,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub flags: NodeFlags,
    pub start: u32,
    pub end: u32,
    /// Start including leading metadata and attributes; equals `start` for
    /// nodes without them.
    pub spanning_start: u32,
    pub parent: NodeIndex,
    pub children: Vec<NodeIndex>,
    pub data: NodeData,
}

impl Node {
    pub fn new(kind: NodeKind, start: u32, end: u32) -> Node {
        Node {
            kind,
            flags: NodeFlags::empty(),
            start,
            end,
            spanning_start: start,
            parent: NodeIndex::NONE,
            children: Vec::new(),
            data: NodeData::None,
        }
    }

    pub fn with_children(mut self, children: Vec<NodeIndex>) -> Node {
        self.children = children;
        self
    }

    pub fn with_data(mut self, data: NodeData) -> Node {
        self.data = data;
        self
    }

    pub fn with_flags(mut self, flags: NodeFlags) -> Node {
        self.flags |= flags;
        self
    }

    #[inline]
    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    /// `start <= offset < end`
    #[inline]
    pub fn contains(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_implicit(&self) -> bool {
        self.flags.contains(NodeFlags::IMPLICIT)
    }

    pub fn name(&self) -> Option<&Arc<str>> {
        match &self.data {
            NodeData::Name(name) | NodeData::Import(name) => Some(name),
            _ => None,
        }
    }

    pub fn decl(&self) -> Option<&DeclData> {
        match &self.data {
            NodeData::Decl(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn decl_mut(&mut self) -> Option<&mut DeclData> {
        match &mut self.data {
            NodeData::Decl(decl) => Some(decl),
            _ => None,
        }
    }

    pub fn operator(&self) -> Option<SyntaxKind> {
        match self.data {
            NodeData::Operator(op) => Some(op),
            _ => None,
        }
    }

    pub fn meta_tags(&self) -> &[MetaTagData] {
        match &self.data {
            NodeData::Metadata(tags) => tags,
            _ => &[],
        }
    }
}

//! Type annotations: `*`, `void`, dotted names and `Vector.<T>`.

use super::node::{NodeData, NodeIndex, NodeKind};
use super::state::ParserState;
use asc_scanner::SyntaxKind;
use std::sync::Arc;

impl ParserState {
    /// Parse the annotation after `:` (the colon is already consumed).
    pub(crate) fn parse_type(&mut self) -> NodeIndex {
        let start = self.token_pos();
        match self.token() {
            SyntaxKind::AsteriskToken => {
                self.next_token();
                self.finish_node(NodeKind::AnyType, start, Vec::new(), NodeData::None)
            }
            SyntaxKind::VoidKeyword => {
                self.next_token();
                self.finish_node(NodeKind::VoidType, start, Vec::new(), NodeData::None)
            }
            SyntaxKind::Identifier => self.parse_type_name(),
            _ => self.error_node("type"),
        }
    }

    /// `a.b.C` or `a.b.C.<T>`. Dotted names become one `QualifiedName`.
    fn parse_type_name(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let name = self.parse_dotted_name();
        if !self.is_token(SyntaxKind::DotLessThanToken) {
            return name;
        }
        self.next_token();
        if !self.enter_recursion() {
            return name;
        }
        let param = self.parse_type();
        self.exit_recursion();
        // `>` is always a single token, so `>>` closes two levels naturally.
        self.parse_expected(SyntaxKind::GreaterThanToken);
        self.finish_node(NodeKind::VectorType, start, vec![name, param], NodeData::None)
    }

    /// Dotted identifier sequence as an `Identifier` (one part) or a
    /// `QualifiedName` (several). Stops before `.*` and `.<`.
    pub(crate) fn parse_dotted_name(&mut self) -> NodeIndex {
        let start = self.token_pos();
        if !self.is_token(SyntaxKind::Identifier) {
            return self.parse_identifier();
        }
        let mut text = String::from(self.current().text());
        self.next_token();
        let mut parts = 1;
        while self.is_token(SyntaxKind::DotToken) && self.peek_kind(1) == SyntaxKind::Identifier {
            self.next_token();
            text.push('.');
            text.push_str(self.current().text());
            self.next_token();
            parts += 1;
        }
        let kind = if parts == 1 {
            NodeKind::Identifier
        } else {
            NodeKind::QualifiedName
        };
        self.finish_node(kind, start, Vec::new(), NodeData::Name(Arc::from(text)))
    }
}

//! Parser state: token cursor, problem reporting, recovery and body deferral.
//!
//! The parser works over a pre-scanned token slice, so every offset it sees is
//! already absolute within the compilation unit. `ParserState` can be bounded
//! to a sub-range of the tokens, which is how deferred function bodies are
//! parsed later without rescanning.

use super::node::{Node, NodeData, NodeFlags, NodeIndex, NodeKind};
use super::node_arena::NodeArena;
use asc_common::limits::MAX_PARSER_RECURSION_DEPTH;
use asc_common::problems::problem_codes;
use asc_common::{CompilerProblem, Span};
use asc_scanner::{SyntaxKind, Token};
use std::ops::Range;
use std::sync::Arc;

/// A function body skipped during the file parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredRange {
    /// Placeholder `Block` left in the file arena.
    pub block: NodeIndex,
    /// Token indices from `{` through the matching `}`.
    pub tokens: Range<usize>,
}

pub struct ParserState {
    tokens: Arc<[Token]>,
    pos: usize,
    limit: usize,
    eof: Token,
    pub(crate) arena: NodeArena,
    pub(crate) problems: Vec<CompilerProblem>,
    file_name: Arc<str>,
    recursion_depth: u32,
    nesting_reported: bool,
    defer_bodies: bool,
    pub(crate) deferred: Vec<DeferredRange>,
    /// Inside a `for (...)` head, where `in` ends an expression.
    pub(crate) no_in: bool,
}

impl ParserState {
    /// Parser over `tokens[range]`. Past the end of the range the cursor sits
    /// on a synthetic end-of-file token.
    pub fn new(
        file_name: Arc<str>,
        tokens: Arc<[Token]>,
        range: Range<usize>,
        defer_bodies: bool,
    ) -> ParserState {
        let limit = range.end.min(tokens.len());
        let eof_at = if limit > 0 {
            tokens[limit - 1].end
        } else {
            0
        };
        ParserState {
            eof: Token {
                kind: SyntaxKind::EndOfFileToken,
                start: eof_at,
                end: eof_at,
                value: None,
                newline_before: true,
            },
            tokens,
            pos: range.start,
            limit,
            arena: NodeArena::with_capacity((limit.saturating_sub(range.start)) / 2 + 1),
            problems: Vec::new(),
            file_name,
            recursion_depth: 0,
            nesting_reported: false,
            defer_bodies,
            deferred: Vec::new(),
            no_in: false,
        }
    }

    pub fn into_parts(self) -> (NodeArena, Vec<CompilerProblem>, Vec<DeferredRange>) {
        (self.arena, self.problems, self.deferred)
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    #[inline]
    pub fn current(&self) -> &Token {
        self.peek(0)
    }

    /// Token `n` positions ahead of the cursor.
    #[inline]
    pub(crate) fn peek(&self, n: usize) -> &Token {
        let index = self.pos + n;
        if index < self.limit {
            &self.tokens[index]
        } else {
            &self.eof
        }
    }

    #[inline]
    pub fn token(&self) -> SyntaxKind {
        self.current().kind
    }

    #[inline]
    pub(crate) fn peek_kind(&self, n: usize) -> SyntaxKind {
        self.peek(n).kind
    }

    #[inline]
    pub fn token_pos(&self) -> u32 {
        self.current().start
    }

    #[inline]
    pub(crate) fn token_value(&self) -> Option<Arc<str>> {
        self.current().value.clone()
    }

    #[inline]
    pub fn is_token(&self, kind: SyntaxKind) -> bool {
        self.token() == kind
    }

    #[inline]
    pub(crate) fn is_identifier_named(&self, name: &str) -> bool {
        self.current().is_identifier_named(name)
    }

    #[inline]
    pub(crate) fn at_end(&self) -> bool {
        self.is_token(SyntaxKind::EndOfFileToken)
    }

    pub(crate) fn token_index(&self) -> usize {
        self.pos
    }

    pub(crate) fn next_token(&mut self) {
        if self.pos < self.limit && self.tokens[self.pos].kind != SyntaxKind::EndOfFileToken {
            self.pos += 1;
        }
    }

    /// End of the most recently consumed token.
    pub(crate) fn last_end(&self) -> u32 {
        if self.pos == 0 {
            return self.current().start;
        }
        self.tokens
            .get(self.pos - 1)
            .map_or(self.eof.end, |t| t.end)
    }

    /// `self.peek(n)` starts exactly where `self.peek(n - 1)` ends.
    pub(crate) fn adjacent(&self, n: usize) -> bool {
        n > 0 && self.peek(n).start == self.peek(n - 1).end && self.pos + n < self.limit
    }

    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind) -> bool {
        if self.parse_optional(kind) {
            return true;
        }
        self.error_expected(kind.text());
        false
    }

    /// `;` may be omitted before a line break, a `}` or the end of input.
    pub(crate) fn can_omit_semicolon(&self) -> bool {
        let current = self.current();
        current.newline_before
            || matches!(
                current.kind,
                SyntaxKind::CloseBraceToken | SyntaxKind::EndOfFileToken
            )
    }

    // =========================================================================
    // Problems
    // =========================================================================

    pub(crate) fn error_at(&mut self, span: Span, code: u32, args: &[&str]) {
        // One problem per offset keeps cascades after a bad token quiet.
        if self
            .problems
            .last()
            .is_some_and(|p| p.start == span.start && p.code == code)
        {
            return;
        }
        self.problems
            .push(CompilerProblem::new(code, &*self.file_name, span, args));
    }

    pub(crate) fn error_expected(&mut self, expected: &str) {
        let current = self.current();
        let span = Span::new(current.start, current.end);
        let found = current.text().to_string();
        self.error_at(span, problem_codes::EXPECTED_TOKEN, &[expected, &found]);
    }

    pub(crate) fn error_at_current(&mut self, message: &str) {
        let current = self.current();
        let span = Span::new(current.start, current.end);
        self.error_at(span, problem_codes::SYNTAX_ERROR, &[message]);
    }

    // =========================================================================
    // Recursion guard
    // =========================================================================

    /// Returns false, after reporting once, when nesting is too deep. The
    /// caller must then stop descending; remaining input is skipped.
    pub(crate) fn enter_recursion(&mut self) -> bool {
        if self.recursion_depth >= MAX_PARSER_RECURSION_DEPTH {
            if !self.nesting_reported {
                self.nesting_reported = true;
                let current = self.current();
                let span = Span::new(current.start, current.end);
                let depth = MAX_PARSER_RECURSION_DEPTH.to_string();
                self.error_at(span, problem_codes::NESTING_TOO_DEEP, &[&depth]);
            }
            self.pos = self.limit;
            return false;
        }
        self.recursion_depth += 1;
        true
    }

    pub(crate) fn exit_recursion(&mut self) {
        self.recursion_depth = self.recursion_depth.saturating_sub(1);
    }

    // =========================================================================
    // Node construction
    // =========================================================================

    pub(crate) fn add_node(&mut self, node: Node) -> NodeIndex {
        self.arena.add(node)
    }

    /// Node from `start` to the end of the last consumed token.
    pub(crate) fn finish_node(
        &mut self,
        kind: NodeKind,
        start: u32,
        children: Vec<NodeIndex>,
        data: NodeData,
    ) -> NodeIndex {
        let end = self.last_end().max(start);
        self.add_node(
            Node::new(kind, start, end)
                .with_children(children)
                .with_data(data),
        )
    }

    /// Zero-width error placeholder at the cursor. Consumes the current token
    /// unless it can start or end an enclosing construct.
    pub(crate) fn error_node(&mut self, expected: &str) -> NodeIndex {
        self.error_expected(expected);
        let start = self.token_pos();
        if !self.is_recovery_point() {
            self.next_token();
        }
        let end = self.last_end().max(start);
        self.add_node(Node::new(NodeKind::Error, start, end).with_flags(NodeFlags::HAS_ERROR))
    }

    /// Identifier, including contextual words. Reports and returns an error
    /// node when the cursor is not on one.
    pub(crate) fn parse_identifier(&mut self) -> NodeIndex {
        if self.is_token(SyntaxKind::Identifier) {
            return self.identifier_from_current();
        }
        self.error_expected("identifier");
        let start = self.token_pos();
        self.add_node(Node::new(NodeKind::Error, start, start).with_flags(NodeFlags::HAS_ERROR))
    }

    /// Names after `.` and `::`, and object literal keys, may be reserved words.
    pub(crate) fn parse_property_name(&mut self) -> NodeIndex {
        if self.token().is_keyword() {
            let text: Arc<str> = Arc::from(self.token().text());
            let start = self.token_pos();
            self.next_token();
            return self.finish_node(NodeKind::Identifier, start, Vec::new(), NodeData::Name(text));
        }
        self.parse_identifier()
    }

    pub(crate) fn identifier_from_current(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let name = self.token_value().unwrap_or_else(|| Arc::from(""));
        self.next_token();
        self.finish_node(NodeKind::Identifier, start, Vec::new(), NodeData::Name(name))
    }

    // =========================================================================
    // Recovery
    // =========================================================================

    /// Tokens an inner construct must not swallow while recovering.
    pub(crate) fn is_recovery_point(&self) -> bool {
        matches!(
            self.token(),
            SyntaxKind::CloseBraceToken
                | SyntaxKind::OpenBraceToken
                | SyntaxKind::SemicolonToken
                | SyntaxKind::EndOfFileToken
        ) || self.is_statement_keyword()
    }

    pub(crate) fn is_statement_keyword(&self) -> bool {
        matches!(
            self.token(),
            SyntaxKind::VarKeyword
                | SyntaxKind::ConstKeyword
                | SyntaxKind::FunctionKeyword
                | SyntaxKind::ClassKeyword
                | SyntaxKind::InterfaceKeyword
                | SyntaxKind::ImportKeyword
                | SyntaxKind::PackageKeyword
                | SyntaxKind::IfKeyword
                | SyntaxKind::ForKeyword
                | SyntaxKind::WhileKeyword
                | SyntaxKind::DoKeyword
                | SyntaxKind::ReturnKeyword
                | SyntaxKind::SwitchKeyword
                | SyntaxKind::TryKeyword
                | SyntaxKind::ThrowKeyword
                | SyntaxKind::PublicKeyword
                | SyntaxKind::PrivateKeyword
                | SyntaxKind::ProtectedKeyword
                | SyntaxKind::InternalKeyword
        )
    }

    /// Skip to the next statement boundary: past a `;`, or up to a brace, a
    /// statement keyword or a line break. Callers guard against no progress.
    pub(crate) fn skip_to_statement_boundary(&mut self) {
        let start = self.pos;
        loop {
            match self.token() {
                SyntaxKind::EndOfFileToken
                | SyntaxKind::CloseBraceToken
                | SyntaxKind::OpenBraceToken => break,
                SyntaxKind::SemicolonToken => {
                    self.next_token();
                    break;
                }
                _ if self.is_statement_keyword() => break,
                _ if self.pos != start && self.current().newline_before => break,
                _ => self.next_token(),
            }
        }

    }

    // =========================================================================
    // Function body deferral
    // =========================================================================

    pub(crate) fn defer_bodies(&self) -> bool {
        self.defer_bodies
    }

    /// Index of the `}` matching the `{` under the cursor.
    fn find_matching_brace(&self) -> Option<usize> {
        let mut depth = 0usize;
        for index in self.pos..self.limit {
            match self.tokens[index].kind {
                SyntaxKind::OpenBraceToken => depth += 1,
                SyntaxKind::CloseBraceToken => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(index);
                    }
                }
                SyntaxKind::EndOfFileToken => return None,
                _ => {}
            }
        }
        None
    }

    /// Skip a balanced `{ ... }` and leave a `DEFERRED_BODY` placeholder.
    /// Returns `None` (cursor untouched) when the braces do not balance, so
    /// the caller parses eagerly and recovers.
    pub(crate) fn try_defer_body(&mut self) -> Option<NodeIndex> {
        if !self.is_token(SyntaxKind::OpenBraceToken) {
            return None;
        }
        let close = self.find_matching_brace()?;
        let open = self.pos;
        let start = self.tokens[open].start;
        let end = self.tokens[close].end;
        self.pos = close + 1;
        let block = self.add_node(
            Node::new(NodeKind::Block, start, end).with_flags(NodeFlags::DEFERRED_BODY),
        );
        self.deferred.push(DeferredRange {
            block,
            tokens: open..close + 1,
        });
        Some(block)
    }
}

//! Parser state - statement and declaration parsing methods

use super::node::{
    AccessorKind, DeclData, MetaArg, MetaTagData, ModifierFlags, Node, NodeData, NodeFlags,
    NodeIndex, NodeKind,
};
use super::state::ParserState;
use asc_common::Span;
use asc_scanner::SyntaxKind;
use std::sync::Arc;

/// Leading metadata and attribute keywords of a declaration.
#[derive(Debug, Default)]
struct Attributes {
    spanning_start: u32,
    metadata: NodeIndex,
    modifiers: ModifierFlags,
    namespace: Option<Arc<str>>,
}

impl Attributes {
    fn none(start: u32) -> Attributes {
        Attributes {
            spanning_start: start,
            metadata: NodeIndex::NONE,
            modifiers: ModifierFlags::empty(),
            namespace: None,
        }
    }

    fn into_decl(self) -> DeclData {
        DeclData {
            modifiers: self.modifiers,
            namespace: self.namespace,
            metadata: self.metadata,
            ..DeclData::default()
        }
    }
}

fn is_access_keyword(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::PublicKeyword
            | SyntaxKind::PrivateKeyword
            | SyntaxKind::ProtectedKeyword
            | SyntaxKind::InternalKeyword
    )
}

fn is_declaration_keyword(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::VarKeyword
            | SyntaxKind::ConstKeyword
            | SyntaxKind::FunctionKeyword
            | SyntaxKind::ClassKeyword
            | SyntaxKind::InterfaceKeyword
    )
}

impl ParserState {
    // =========================================================================
    // Parse Methods - Roots
    // =========================================================================

    /// Parse the whole token range as a `File` node.
    pub fn parse_source_file(&mut self) -> NodeIndex {
        let mut children = Vec::new();
        while !self.at_end() {
            if self.is_token(SyntaxKind::CloseBraceToken) {
                self.error_at_current("unexpected '}'");
                self.next_token();
                continue;
            }
            let before = self.token_index();
            children.push(self.parse_directive());
            if self.token_index() == before {
                self.error_at_current("unexpected token");
                self.next_token();
            }
        }
        let end = self.current().end;
        self.add_node(Node::new(NodeKind::File, 0, end).with_children(children))
    }

    /// Parse a single block at the cursor, for deferred function bodies.
    pub fn parse_function_body(&mut self) -> NodeIndex {
        self.parse_block()
    }

    /// `{ directives }`
    pub(crate) fn parse_block(&mut self) -> NodeIndex {
        let start = self.token_pos();
        if !self.parse_expected(SyntaxKind::OpenBraceToken) {
            return self.add_node(
                Node::new(NodeKind::Block, start, start).with_flags(NodeFlags::HAS_ERROR),
            );
        }
        let children = self.parse_directives_until_close();
        let closed = self.parse_expected(SyntaxKind::CloseBraceToken);
        let block = self.finish_node(NodeKind::Block, start, children, NodeData::None);
        if !closed && let Some(node) = self.arena.get_mut(block) {
            node.flags |= NodeFlags::HAS_ERROR;
        }
        block
    }

    fn parse_directives_until_close(&mut self) -> Vec<NodeIndex> {
        let mut children = Vec::new();
        while !self.is_token(SyntaxKind::CloseBraceToken) && !self.at_end() {
            let before = self.token_index();
            children.push(self.parse_directive());
            if self.token_index() == before {
                self.error_at_current("unexpected token");
                self.next_token();
            }
        }
        children
    }

    // =========================================================================
    // Directives and attributes
    // =========================================================================

    fn parse_directive(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut attrs = Attributes::none(start);
        if self.is_metadata_start() {
            attrs.metadata = self.parse_metadata();
        }
        if is_access_keyword(self.token())
            || (self.is_token(SyntaxKind::Identifier) && self.attributes_lead_to_declaration())
        {
            self.parse_attributes(&mut attrs);
        }
        let has_attributes =
            attrs.metadata.is_some() || !attrs.modifiers.is_empty() || attrs.namespace.is_some();

        match self.token() {
            SyntaxKind::ClassKeyword => self.parse_class(attrs, false),
            SyntaxKind::InterfaceKeyword => self.parse_class(attrs, true),
            SyntaxKind::FunctionKeyword if has_attributes || self.is_function_declaration() => {
                self.parse_function_declaration(attrs)
            }
            SyntaxKind::VarKeyword | SyntaxKind::ConstKeyword => {
                self.parse_variable_list(attrs, false)
            }
            SyntaxKind::Identifier if self.is_namespace_declaration() => {
                self.parse_namespace_declaration(attrs)
            }
            _ if !attrs.modifiers.is_empty() || attrs.namespace.is_some() => {
                self.error_expected("declaration");
                self.parse_statement()
            }
            // Metadata with nothing to attach to stands alone.
            _ if attrs.metadata.is_some() => attrs.metadata,
            _ => self.parse_statement(),
        }
    }

    fn is_function_declaration(&self) -> bool {
        self.peek_kind(1) == SyntaxKind::Identifier
    }

    fn is_namespace_declaration(&self) -> bool {
        self.is_identifier_named("namespace")
            && self.peek_kind(1) == SyntaxKind::Identifier
            && !self.peek(1).newline_before
    }

    /// `[` Name followed by `]` or `(`.
    fn is_metadata_start(&self) -> bool {
        self.is_token(SyntaxKind::OpenBracketToken)
            && self.peek_kind(1) == SyntaxKind::Identifier
            && matches!(
                self.peek_kind(2),
                SyntaxKind::CloseBracketToken | SyntaxKind::OpenParenToken
            )
    }

    /// Lookahead over identifier and access-keyword attributes: true when they
    /// end at a declaration keyword.
    fn attributes_lead_to_declaration(&self) -> bool {
        let mut n = 0;
        while n < 16 {
            let token = self.peek(n);
            if is_declaration_keyword(token.kind) {
                return n > 0;
            }
            if is_access_keyword(token.kind) {
                n += 1;
                continue;
            }
            if token.kind != SyntaxKind::Identifier {
                return false;
            }
            if token.is_identifier_named("namespace")
                && self.peek_kind(n + 1) == SyntaxKind::Identifier
            {
                return n > 0;
            }
            // Identifier attributes share a line with what follows.
            if self.peek(n + 1).newline_before {
                return false;
            }
            n += 1;
        }
        false
    }

    fn parse_attributes(&mut self, attrs: &mut Attributes) {
        loop {
            let kind = self.token();
            if is_declaration_keyword(kind) || self.is_namespace_declaration() {
                return;
            }
            let word = match kind {
                SyntaxKind::Identifier => self.token_value().unwrap_or_else(|| Arc::from("")),
                _ if is_access_keyword(kind) => Arc::from(kind.text()),
                _ => return,
            };
            match ModifierFlags::from_word(&word) {
                Some(flag) => attrs.modifiers |= flag,
                None => attrs.namespace = Some(word),
            }
            self.next_token();
        }
    }

    /// One or more consecutive `[Tag(args)]` entries as a single node.
    fn parse_metadata(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut tags = Vec::new();
        while self.is_metadata_start() {
            let tag_start = self.token_pos();
            self.next_token();
            let name = self.token_value().unwrap_or_else(|| Arc::from(""));
            self.next_token();
            let mut args = Vec::new();
            if self.parse_optional(SyntaxKind::OpenParenToken) {
                while !self.is_token(SyntaxKind::CloseParenToken) && !self.at_end() {
                    let key = if self.is_token(SyntaxKind::Identifier)
                        && self.peek_kind(1) == SyntaxKind::EqualsToken
                    {
                        let key = self.token_value();
                        self.next_token();
                        self.next_token();
                        key
                    } else {
                        None
                    };
                    let value: Arc<str> = match self.token_value() {
                        Some(value) => value,
                        None => Arc::from(self.token().text()),
                    };
                    self.next_token();
                    args.push(MetaArg { key, value });
                    if !self.parse_optional(SyntaxKind::CommaToken) {
                        break;
                    }
                }
                self.parse_expected(SyntaxKind::CloseParenToken);
            }
            self.parse_expected(SyntaxKind::CloseBracketToken);
            tags.push(MetaTagData {
                name,
                args,
                span: Span::new(tag_start, self.last_end()),
            });
        }
        self.finish_node(NodeKind::Metadata, start, Vec::new(), NodeData::Metadata(tags))
    }

    /// Record the leading span and wrap the payload.
    fn finish_declaration(
        &mut self,
        kind: NodeKind,
        start: u32,
        spanning_start: u32,
        children: Vec<NodeIndex>,
        decl: DeclData,
    ) -> NodeIndex {
        let index = self.finish_node(kind, start, children, NodeData::Decl(Box::new(decl)));
        if let Some(node) = self.arena.get_mut(index) {
            node.spanning_start = spanning_start.min(start);
        }
        index
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    fn parse_package(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let mut decl = DeclData::default();
        let mut children = Vec::new();
        if self.is_token(SyntaxKind::Identifier) {
            decl.name = self.parse_dotted_name();
            children.push(decl.name);
        }
        decl.body = self.parse_block();
        children.push(decl.body);
        self.finish_declaration(NodeKind::Package, start, start, children, decl)
    }

    fn parse_import(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let name = self.parse_dotted_name();
        let mut flags = NodeFlags::empty();
        if self.is_token(SyntaxKind::DotToken) && self.peek_kind(1) == SyntaxKind::AsteriskToken {
            self.next_token();
            self.next_token();
            flags |= NodeFlags::WILDCARD;
        }
        self.parse_statement_end();
        let text = self
            .arena
            .identifier_text(name)
            .map(Arc::from)
            .unwrap_or_else(|| Arc::from(""));
        let index = self.finish_node(NodeKind::Import, start, vec![name], NodeData::Import(text));
        if let Some(node) = self.arena.get_mut(index) {
            node.flags |= flags;
        }
        index
    }

    /// `use namespace a, b;`
    fn parse_use_namespace(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        if !self.is_identifier_named("namespace") {
            self.error_expected("namespace");
        } else {
            self.next_token();
        }
        let mut names = Vec::new();
        loop {
            names.push(self.parse_dotted_name());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_statement_end();
        let first = names
            .first()
            .and_then(|&n| self.arena.identifier_text(n))
            .map(Arc::from)
            .unwrap_or_else(|| Arc::from(""));
        self.finish_node(NodeKind::UseNamespace, start, names, NodeData::Name(first))
    }

    /// `class`/`interface` with its member block.
    fn parse_class(&mut self, attrs: Attributes, is_interface: bool) -> NodeIndex {
        let start = self.token_pos();
        let spanning_start = attrs.spanning_start;
        self.next_token();
        let mut decl = attrs.into_decl();
        decl.name = self.parse_identifier();
        let mut children = vec![decl.name];

        if self.parse_optional(SyntaxKind::ExtendsKeyword) {
            if is_interface {
                decl.interfaces = self.parse_type_name_list();
            } else {
                decl.base = self.parse_dotted_name();
                children.push(decl.base);
            }
        }
        if !is_interface && self.parse_optional(SyntaxKind::ImplementsKeyword) {
            decl.interfaces = self.parse_type_name_list();
        }
        children.extend(decl.interfaces.iter().copied());

        decl.body = self.parse_block();
        children.push(decl.body);
        let kind = if is_interface {
            NodeKind::Interface
        } else {
            NodeKind::Class
        };
        self.finish_declaration(kind, start, spanning_start, children, decl)
    }

    fn parse_type_name_list(&mut self) -> Vec<NodeIndex> {
        let mut names = vec![self.parse_dotted_name()];
        while self.parse_optional(SyntaxKind::CommaToken) {
            names.push(self.parse_dotted_name());
        }
        names
    }

    fn parse_function_declaration(&mut self, attrs: Attributes) -> NodeIndex {
        let start = self.token_pos();
        let spanning_start = attrs.spanning_start;
        self.next_token();
        let mut decl = attrs.into_decl();

        if self.peek_kind(1) == SyntaxKind::Identifier && !self.peek(1).newline_before {
            if self.is_identifier_named("get") {
                decl.accessor = AccessorKind::Getter;
                self.next_token();
            } else if self.is_identifier_named("set") {
                decl.accessor = AccessorKind::Setter;
                self.next_token();
            }
        }
        decl.name = self.parse_identifier();
        let mut children = vec![decl.name];

        decl.params = self.parse_parameter_list();
        children.extend(decl.params.iter().copied());
        if self.parse_optional(SyntaxKind::ColonToken) {
            decl.type_annotation = self.parse_type();
            children.push(decl.type_annotation);
        }

        if self.is_token(SyntaxKind::OpenBraceToken) {
            decl.body = if self.defer_bodies() {
                match self.try_defer_body() {
                    Some(block) => block,
                    None => self.parse_block(),
                }
            } else {
                self.parse_block()
            };
            children.push(decl.body);
        } else {
            // Interface methods and native functions have no body.
            self.parse_statement_end();
        }
        self.finish_declaration(NodeKind::Function, start, spanning_start, children, decl)
    }

    pub(crate) fn parse_parameter_list(&mut self) -> Vec<NodeIndex> {
        let mut params = Vec::new();
        if !self.parse_expected(SyntaxKind::OpenParenToken) {
            return params;
        }
        while !self.is_token(SyntaxKind::CloseParenToken) && !self.at_end() {
            params.push(self.parse_parameter());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParenToken);
        params
    }

    /// `[...]name[: T][= default]`
    fn parse_parameter(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let rest = self.parse_optional(SyntaxKind::DotDotDotToken);
        let mut decl = DeclData {
            name: self.parse_identifier(),
            ..DeclData::default()
        };
        let mut children = vec![decl.name];
        if self.parse_optional(SyntaxKind::ColonToken) {
            decl.type_annotation = self.parse_type();
            children.push(decl.type_annotation);
        }
        if self.parse_optional(SyntaxKind::EqualsToken) {
            decl.initializer = self.parse_assignment_expression();
            children.push(decl.initializer);
        }
        let index = self.finish_declaration(NodeKind::Parameter, start, start, children, decl);
        if rest && let Some(node) = self.arena.get_mut(index) {
            node.flags |= NodeFlags::REST;
        }
        index
    }

    /// `var a: T = x, b;` or `const ...`. Inside a `for` head the trailing
    /// semicolon belongs to the loop.
    fn parse_variable_list(&mut self, attrs: Attributes, in_for_head: bool) -> NodeIndex {
        let start = self.token_pos();
        let spanning_start = attrs.spanning_start;
        let is_const = self.is_token(SyntaxKind::ConstKeyword);
        self.next_token();
        let mut variables = Vec::new();
        loop {
            variables.push(self.parse_variable());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        if !in_for_head {
            self.parse_statement_end();
        }
        let decl = attrs.into_decl();
        let index =
            self.finish_declaration(NodeKind::VariableList, start, spanning_start, variables, decl);
        if is_const && let Some(node) = self.arena.get_mut(index) {
            node.flags |= NodeFlags::CONST;
        }
        index
    }

    fn parse_variable(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut decl = DeclData {
            name: self.parse_identifier(),
            ..DeclData::default()
        };
        let mut children = vec![decl.name];
        if self.parse_optional(SyntaxKind::ColonToken) {
            decl.type_annotation = self.parse_type();
            children.push(decl.type_annotation);
        }
        if self.parse_optional(SyntaxKind::EqualsToken) {
            decl.initializer = self.parse_assignment_expression();
            children.push(decl.initializer);
        }
        self.finish_declaration(NodeKind::Variable, start, start, children, decl)
    }

    /// `namespace name [= "uri"];`
    fn parse_namespace_declaration(&mut self, attrs: Attributes) -> NodeIndex {
        let start = self.token_pos();
        let spanning_start = attrs.spanning_start;
        self.next_token();
        let mut decl = attrs.into_decl();
        decl.name = self.parse_identifier();
        let mut children = vec![decl.name];
        if self.parse_optional(SyntaxKind::EqualsToken) {
            decl.initializer = self.parse_assignment_expression();
            children.push(decl.initializer);
        }
        self.parse_statement_end();
        self.finish_declaration(NodeKind::NamespaceDecl, start, spanning_start, children, decl)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Consume a statement terminator, recovering past junk when it is missing.
    fn parse_statement_end(&mut self) {
        if self.parse_optional(SyntaxKind::SemicolonToken) || self.can_omit_semicolon() {
            return;
        }
        self.error_expected(";");
        self.skip_to_statement_boundary();
    }

    pub(crate) fn parse_statement(&mut self) -> NodeIndex {
        if !self.enter_recursion() {
            let start = self.token_pos();
            return self.add_node(
                Node::new(NodeKind::Error, start, start).with_flags(NodeFlags::HAS_ERROR),
            );
        }
        let statement = self.parse_statement_inner();
        self.exit_recursion();
        statement
    }

    fn parse_statement_inner(&mut self) -> NodeIndex {
        let start = self.token_pos();
        match self.token() {
            SyntaxKind::OpenBraceToken => self.parse_block(),
            SyntaxKind::SemicolonToken => {
                self.next_token();
                self.finish_node(NodeKind::Empty, start, Vec::new(), NodeData::None)
            }
            SyntaxKind::VarKeyword | SyntaxKind::ConstKeyword => {
                self.parse_variable_list(Attributes::none(start), false)
            }
            SyntaxKind::FunctionKeyword if self.is_function_declaration() => {
                self.parse_function_declaration(Attributes::none(start))
            }
            SyntaxKind::ClassKeyword => self.parse_class(Attributes::none(start), false),
            SyntaxKind::InterfaceKeyword => self.parse_class(Attributes::none(start), true),
            SyntaxKind::PackageKeyword => self.parse_package(),
            SyntaxKind::ImportKeyword => self.parse_import(),
            SyntaxKind::UseKeyword => self.parse_use_namespace(),
            SyntaxKind::IfKeyword => self.parse_if_statement(),
            SyntaxKind::WhileKeyword => self.parse_while_statement(),
            SyntaxKind::DoKeyword => self.parse_do_statement(),
            SyntaxKind::ForKeyword => self.parse_for_statement(),
            SyntaxKind::SwitchKeyword => self.parse_switch_statement(),
            SyntaxKind::TryKeyword => self.parse_try_statement(),
            SyntaxKind::WithKeyword => self.parse_with_statement(),
            SyntaxKind::ReturnKeyword => self.parse_return_statement(),
            SyntaxKind::ThrowKeyword => self.parse_throw_statement(),
            SyntaxKind::BreakKeyword => self.parse_jump_statement(NodeKind::Break),
            SyntaxKind::ContinueKeyword => self.parse_jump_statement(NodeKind::Continue),
            SyntaxKind::Identifier if self.peek_kind(1) == SyntaxKind::ColonToken => {
                self.parse_labeled_statement()
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let before = self.token_index();
        let expression = self.parse_expression();
        if self.token_index() == before {
            self.skip_to_statement_boundary();
        } else {
            self.parse_statement_end();
        }
        self.finish_node(
            NodeKind::ExpressionStatement,
            start,
            vec![expression],
            NodeData::None,
        )
    }

    /// `( expression )` heads of `if`, `while`, `switch` and `with`.
    fn parse_parenthesized(&mut self) -> NodeIndex {
        self.parse_expected(SyntaxKind::OpenParenToken);
        let expression = self.parse_expression();
        self.parse_expected(SyntaxKind::CloseParenToken);
        expression
    }

    fn parse_if_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let condition = self.parse_parenthesized();
        let then_branch = self.parse_statement();
        let mut children = vec![condition, then_branch];
        if self.parse_optional(SyntaxKind::ElseKeyword) {
            children.push(self.parse_statement());
        }
        self.finish_node(NodeKind::If, start, children, NodeData::None)
    }

    fn parse_while_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let condition = self.parse_parenthesized();
        let body = self.parse_statement();
        self.finish_node(NodeKind::While, start, vec![condition, body], NodeData::None)
    }

    fn parse_do_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let body = self.parse_statement();
        self.parse_expected(SyntaxKind::WhileKeyword);
        let condition = self.parse_parenthesized();
        self.parse_optional(SyntaxKind::SemicolonToken);
        self.finish_node(NodeKind::DoWhile, start, vec![body, condition], NodeData::None)
    }

    /// `for (;;)`, `for (x in o)` and `for each (x in o)`.
    fn parse_for_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let each = self.is_identifier_named("each");
        if each {
            self.next_token();
        }
        self.parse_expected(SyntaxKind::OpenParenToken);

        let saved = std::mem::replace(&mut self.no_in, true);
        let init_start = self.token_pos();
        let init = match self.token() {
            SyntaxKind::VarKeyword | SyntaxKind::ConstKeyword => {
                self.parse_variable_list(Attributes::none(init_start), true)
            }
            SyntaxKind::SemicolonToken => NodeIndex::NONE,
            _ => self.parse_expression(),
        };
        self.no_in = saved;

        if self.parse_optional(SyntaxKind::InKeyword) {
            let collection = self.parse_expression();
            self.parse_expected(SyntaxKind::CloseParenToken);
            let body = self.parse_statement();
            let kind = if each {
                NodeKind::ForEach
            } else {
                NodeKind::ForIn
            };
            return self.finish_node(kind, start, vec![init, collection, body], NodeData::None);
        }
        if each {
            self.error_expected("in");
        }

        self.parse_expected(SyntaxKind::SemicolonToken);
        let condition = if self.is_token(SyntaxKind::SemicolonToken) {
            NodeIndex::NONE
        } else {
            self.parse_expression()
        };
        self.parse_expected(SyntaxKind::SemicolonToken);
        let update = if self.is_token(SyntaxKind::CloseParenToken) {
            NodeIndex::NONE
        } else {
            self.parse_expression()
        };
        self.parse_expected(SyntaxKind::CloseParenToken);
        let body = self.parse_statement();

        let children = [init, condition, update, body]
            .into_iter()
            .filter(|n| n.is_some())
            .collect();
        self.finish_node(
            NodeKind::For,
            start,
            children,
            NodeData::ForParts {
                init,
                condition,
                update,
            },
        )
    }

    fn parse_switch_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let discriminant = self.parse_parenthesized();
        let mut children = vec![discriminant];
        self.parse_expected(SyntaxKind::OpenBraceToken);
        while !self.is_token(SyntaxKind::CloseBraceToken) && !self.at_end() {
            let clause_start = self.token_pos();
            let (kind, mut clause) = match self.token() {
                SyntaxKind::CaseKeyword => {
                    self.next_token();
                    (NodeKind::Case, vec![self.parse_expression()])
                }
                SyntaxKind::DefaultKeyword => {
                    self.next_token();
                    (NodeKind::Default, Vec::new())
                }
                _ => {
                    self.error_expected("case");
                    self.skip_to_statement_boundary();
                    continue;
                }
            };
            self.parse_expected(SyntaxKind::ColonToken);
            while !matches!(
                self.token(),
                SyntaxKind::CaseKeyword
                    | SyntaxKind::DefaultKeyword
                    | SyntaxKind::CloseBraceToken
                    | SyntaxKind::EndOfFileToken
            ) {
                let before = self.token_index();
                clause.push(self.parse_directive());
                if self.token_index() == before {
                    self.next_token();
                }
            }
            children.push(self.finish_node(kind, clause_start, clause, NodeData::None));
        }
        self.parse_expected(SyntaxKind::CloseBraceToken);
        self.finish_node(NodeKind::Switch, start, children, NodeData::None)
    }

    fn parse_try_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let mut children = vec![self.parse_block()];
        while self.is_token(SyntaxKind::CatchKeyword) {
            let catch_start = self.token_pos();
            self.next_token();
            self.parse_expected(SyntaxKind::OpenParenToken);
            let param = self.parse_parameter();
            self.parse_expected(SyntaxKind::CloseParenToken);
            let block = self.parse_block();
            children.push(self.finish_node(
                NodeKind::Catch,
                catch_start,
                vec![param, block],
                NodeData::None,
            ));
        }
        if self.is_token(SyntaxKind::FinallyKeyword) {
            let finally_start = self.token_pos();
            self.next_token();
            let block = self.parse_block();
            children.push(self.finish_node(
                NodeKind::Finally,
                finally_start,
                vec![block],
                NodeData::None,
            ));
        }
        if children.len() == 1 {
            self.error_expected("catch");
        }
        self.finish_node(NodeKind::Try, start, children, NodeData::None)
    }

    fn parse_with_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let object = self.parse_parenthesized();
        let body = self.parse_statement();
        self.finish_node(NodeKind::With, start, vec![object, body], NodeData::None)
    }

    fn parse_return_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let mut children = Vec::new();
        if !self.is_token(SyntaxKind::SemicolonToken) && !self.can_omit_semicolon() {
            children.push(self.parse_expression());
        }
        self.parse_statement_end();
        self.finish_node(NodeKind::Return, start, children, NodeData::None)
    }

    fn parse_throw_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let value = self.parse_expression();
        self.parse_statement_end();
        self.finish_node(NodeKind::Throw, start, vec![value], NodeData::None)
    }

    /// `break`/`continue` with an optional label on the same line.
    fn parse_jump_statement(&mut self, kind: NodeKind) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let mut data = NodeData::None;
        if self.is_token(SyntaxKind::Identifier) && !self.current().newline_before {
            if let Some(label) = self.token_value() {
                data = NodeData::Name(label);
            }
            self.next_token();
        }
        self.parse_statement_end();
        self.finish_node(kind, start, Vec::new(), data)
    }

    fn parse_labeled_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let label = self.token_value().unwrap_or_else(|| Arc::from(""));
        self.next_token();
        self.next_token();
        let body = self.parse_statement();
        self.finish_node(NodeKind::Labeled, start, vec![body], NodeData::Name(label))
    }
}

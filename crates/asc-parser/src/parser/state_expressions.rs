//! Parser state - expression parsing methods

use super::node::{DeclData, LiteralKind, Node, NodeData, NodeFlags, NodeIndex, NodeKind};
use super::state::ParserState;
use asc_scanner::SyntaxKind;
use std::sync::Arc;

/// Binary operator precedence, higher binds tighter. `None` for non-binary.
fn binary_precedence(op: SyntaxKind, no_in: bool) -> Option<u8> {
    use SyntaxKind::*;
    Some(match op {
        BarBarToken => 1,
        AmpersandAmpersandToken => 2,
        BarToken => 3,
        CaretToken => 4,
        AmpersandToken => 5,
        EqualsEqualsToken
        | ExclamationEqualsToken
        | EqualsEqualsEqualsToken
        | ExclamationEqualsEqualsToken => 6,
        LessThanToken
        | GreaterThanToken
        | LessThanEqualsToken
        | GreaterThanEqualsToken
        | InstanceofKeyword
        | IsKeyword
        | AsKeyword => 7,
        InKeyword if !no_in => 7,
        LessThanLessThanToken
        | GreaterThanGreaterThanToken
        | GreaterThanGreaterThanGreaterThanToken => 8,
        PlusToken | MinusToken => 9,
        AsteriskToken | SlashToken | PercentToken => 10,
        _ => return None,
    })
}

fn is_assignment_operator(op: SyntaxKind) -> bool {
    use SyntaxKind::*;
    matches!(
        op,
        EqualsToken
            | PlusEqualsToken
            | MinusEqualsToken
            | AsteriskEqualsToken
            | SlashEqualsToken
            | PercentEqualsToken
            | LessThanLessThanEqualsToken
            | GreaterThanGreaterThanEqualsToken
            | GreaterThanGreaterThanGreaterThanEqualsToken
            | AmpersandEqualsToken
            | BarEqualsToken
            | CaretEqualsToken
            | AmpersandAmpersandEqualsToken
            | BarBarEqualsToken
    )
}

impl ParserState {
    /// Operator under the cursor and its token count. Adjacent `>` tokens are
    /// joined here into `>=`, `>>`, `>>>`, `>>=` and `>>>=`.
    pub(crate) fn current_operator(&self) -> (SyntaxKind, usize) {
        let kind = self.token();
        if kind != SyntaxKind::GreaterThanToken {
            return (kind, 1);
        }
        let joined = |n: usize, k: SyntaxKind| self.adjacent(n) && self.peek_kind(n) == k;
        if joined(1, SyntaxKind::GreaterThanToken) {
            if joined(2, SyntaxKind::GreaterThanToken) {
                if joined(3, SyntaxKind::EqualsToken) {
                    return (SyntaxKind::GreaterThanGreaterThanGreaterThanEqualsToken, 4);
                }
                return (SyntaxKind::GreaterThanGreaterThanGreaterThanToken, 3);
            }
            if joined(2, SyntaxKind::EqualsToken) {
                return (SyntaxKind::GreaterThanGreaterThanEqualsToken, 3);
            }
            return (SyntaxKind::GreaterThanGreaterThanToken, 2);
        }
        if joined(1, SyntaxKind::EqualsToken) {
            return (SyntaxKind::GreaterThanEqualsToken, 2);
        }
        // `>==` would scan as `>` `==`; only a single `=` joins.
        (SyntaxKind::GreaterThanToken, 1)
    }

    fn consume_operator(&mut self, width: usize) {
        for _ in 0..width {
            self.next_token();
        }
    }

    /// Comma expression.
    pub(crate) fn parse_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut left = self.parse_assignment_expression();
        while self.is_token(SyntaxKind::CommaToken) {
            self.next_token();
            let right = self.parse_assignment_expression();
            left = self.finish_node(
                NodeKind::Binary,
                start,
                vec![left, right],
                NodeData::Operator(SyntaxKind::CommaToken),
            );
        }
        left
    }

    pub(crate) fn parse_assignment_expression(&mut self) -> NodeIndex {
        if !self.enter_recursion() {
            let start = self.token_pos();
            return self.add_node(Node::new(NodeKind::Error, start, start).with_flags(NodeFlags::HAS_ERROR));
        }
        let start = self.token_pos();
        let left = self.parse_conditional_expression();
        let (op, width) = self.current_operator();
        let result = if is_assignment_operator(op) {
            self.consume_operator(width);
            let right = self.parse_assignment_expression();
            self.finish_node(
                NodeKind::Assignment,
                start,
                vec![left, right],
                NodeData::Operator(op),
            )
        } else {
            left
        };
        self.exit_recursion();
        result
    }

    fn parse_conditional_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let condition = self.parse_binary_expression(0);
        if !self.parse_optional(SyntaxKind::QuestionToken) {
            return condition;
        }
        // `in` is allowed again between `?` and `:`.
        let saved = std::mem::replace(&mut self.no_in, false);
        let when_true = self.parse_assignment_expression();
        self.no_in = saved;
        self.parse_expected(SyntaxKind::ColonToken);
        let when_false = self.parse_assignment_expression();
        self.finish_node(
            NodeKind::Conditional,
            start,
            vec![condition, when_true, when_false],
            NodeData::None,
        )
    }

    /// Precedence climbing over left-associative binary operators.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> NodeIndex {
        let start = self.token_pos();
        let mut left = self.parse_unary_expression();
        loop {
            let (op, width) = self.current_operator();
            let Some(precedence) = binary_precedence(op, self.no_in) else {
                break;
            };
            if precedence <= min_precedence {
                break;
            }
            self.consume_operator(width);
            let right = if matches!(op, SyntaxKind::AsKeyword | SyntaxKind::IsKeyword)
                && matches!(self.token(), SyntaxKind::AsteriskToken | SyntaxKind::VoidKeyword)
            {
                self.parse_type()
            } else {
                self.parse_binary_expression(precedence)
            };
            left = self.finish_node(
                NodeKind::Binary,
                start,
                vec![left, right],
                NodeData::Operator(op),
            );
        }
        left
    }

    fn parse_unary_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let op = self.token();
        match op {
            SyntaxKind::ExclamationToken
            | SyntaxKind::TildeToken
            | SyntaxKind::PlusToken
            | SyntaxKind::MinusToken
            | SyntaxKind::PlusPlusToken
            | SyntaxKind::MinusMinusToken
            | SyntaxKind::TypeofKeyword
            | SyntaxKind::VoidKeyword
            | SyntaxKind::DeleteKeyword => {
                self.next_token();
                if !self.enter_recursion() {
                    return self.finish_node(NodeKind::Error, start, Vec::new(), NodeData::None);
                }
                let operand = self.parse_unary_expression();
                self.exit_recursion();
                self.finish_node(NodeKind::Unary, start, vec![operand], NodeData::Operator(op))
            }
            _ => self.parse_postfix_expression(),
        }
    }

    fn parse_postfix_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let operand = self.parse_left_hand_side_expression();
        let op = self.token();
        if matches!(op, SyntaxKind::PlusPlusToken | SyntaxKind::MinusMinusToken)
            && !self.current().newline_before
        {
            self.next_token();
            return self.finish_node(NodeKind::Postfix, start, vec![operand], NodeData::Operator(op));
        }
        operand
    }

    fn parse_left_hand_side_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let expression = if self.is_token(SyntaxKind::NewKeyword) {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        self.parse_member_suffixes(start, expression, true)
    }

    /// `.name`, `..name`, `::name`, `[index]`, `.<T>` and (when allowed)
    /// call suffixes.
    fn parse_member_suffixes(
        &mut self,
        start: u32,
        mut expression: NodeIndex,
        allow_call: bool,
    ) -> NodeIndex {
        loop {
            match self.token() {
                SyntaxKind::DotToken | SyntaxKind::DotDotToken => {
                    self.next_token();
                    if self.is_token(SyntaxKind::AtToken) {
                        self.next_token();
                    }
                    let name = self.parse_property_name();
                    expression = self.finish_node(
                        NodeKind::MemberAccess,
                        start,
                        vec![expression, name],
                        NodeData::None,
                    );
                }
                SyntaxKind::ColonColonToken => {
                    self.next_token();
                    let name = if self.is_token(SyntaxKind::AsteriskToken) {
                        let at = self.token_pos();
                        self.next_token();
                        self.finish_node(NodeKind::Identifier, at, Vec::new(), NodeData::Name(Arc::from("*")))
                    } else {
                        self.parse_property_name()
                    };
                    expression = self.finish_node(
                        NodeKind::NamespaceAccess,
                        start,
                        vec![expression, name],
                        NodeData::None,
                    );
                }
                SyntaxKind::DotLessThanToken => {
                    self.next_token();
                    let param = self.parse_type();
                    self.parse_expected(SyntaxKind::GreaterThanToken);
                    expression = self.finish_node(
                        NodeKind::VectorType,
                        start,
                        vec![expression, param],
                        NodeData::None,
                    );
                }
                SyntaxKind::OpenBracketToken => {
                    self.next_token();
                    let saved = std::mem::replace(&mut self.no_in, false);
                    let index = self.parse_expression();
                    self.no_in = saved;
                    self.parse_expected(SyntaxKind::CloseBracketToken);
                    expression = self.finish_node(
                        NodeKind::Index,
                        start,
                        vec![expression, index],
                        NodeData::None,
                    );
                }
                SyntaxKind::OpenParenToken if allow_call => {
                    let mut children = vec![expression];
                    children.extend(self.parse_arguments());
                    expression = self.finish_node(NodeKind::Call, start, children, NodeData::None);
                }
                _ => return expression,
            }
        }
    }

    fn parse_arguments(&mut self) -> Vec<NodeIndex> {
        let mut args = Vec::new();
        if !self.parse_expected(SyntaxKind::OpenParenToken) {
            return args;
        }
        let saved = std::mem::replace(&mut self.no_in, false);
        while !self.is_token(SyntaxKind::CloseParenToken) && !self.at_end() {
            args.push(self.parse_assignment_expression());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.no_in = saved;
        self.parse_expected(SyntaxKind::CloseParenToken);
        args
    }

    /// `new C(args)`, `new a.b.C`, and `new <T>[...]` vector literals.
    fn parse_new_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();

        if self.is_token(SyntaxKind::LessThanToken) {
            self.next_token();
            let element_type = self.parse_type();
            self.parse_expected(SyntaxKind::GreaterThanToken);
            let mut children = vec![element_type];
            children.extend(self.parse_array_elements());
            return self.finish_node(NodeKind::VectorLiteral, start, children, NodeData::None);
        }

        if !self.enter_recursion() {
            return self.finish_node(NodeKind::Error, start, Vec::new(), NodeData::None);
        }
        let callee_start = self.token_pos();
        let callee = if self.is_token(SyntaxKind::NewKeyword) {
            self.parse_new_expression()
        } else {
            self.parse_primary_expression()
        };
        let callee = self.parse_member_suffixes(callee_start, callee, false);
        self.exit_recursion();

        let mut children = vec![callee];
        if self.is_token(SyntaxKind::OpenParenToken) {
            children.extend(self.parse_arguments());
        }
        self.finish_node(NodeKind::New, start, children, NodeData::None)
    }

    fn parse_primary_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        match self.token() {
            SyntaxKind::Identifier => self.identifier_from_current(),
            SyntaxKind::AtToken => {
                self.next_token();
                let name = self.parse_property_name();
                if let Some(node) = self.arena.get_mut(name) {
                    node.start = start;
                }
                name
            }
            SyntaxKind::ThisKeyword => {
                self.next_token();
                self.finish_node(NodeKind::This, start, Vec::new(), NodeData::None)
            }
            SyntaxKind::SuperKeyword => {
                self.next_token();
                self.finish_node(NodeKind::Super, start, Vec::new(), NodeData::None)
            }
            SyntaxKind::StringLiteral => self.parse_literal(LiteralKind::String),
            SyntaxKind::NumericLiteral => self.parse_literal(LiteralKind::Number),
            SyntaxKind::RegexLiteral => self.parse_literal(LiteralKind::Regex),
            SyntaxKind::TrueKeyword | SyntaxKind::FalseKeyword => {
                self.parse_literal(LiteralKind::Boolean)
            }
            SyntaxKind::NullKeyword => self.parse_literal(LiteralKind::Null),
            SyntaxKind::OpenParenToken => {
                self.next_token();
                let saved = std::mem::replace(&mut self.no_in, false);
                let inner = self.parse_expression();
                self.no_in = saved;
                self.parse_expected(SyntaxKind::CloseParenToken);
                // Parentheses only group; widen the inner node over them.
                let end = self.last_end();
                if let Some(node) = self.arena.get_mut(inner) {
                    node.start = node.start.min(start);
                    node.spanning_start = node.spanning_start.min(start);
                    node.end = node.end.max(end);
                }
                inner
            }
            SyntaxKind::OpenBracketToken => {
                let elements = self.parse_array_elements();
                self.finish_node(NodeKind::ArrayLiteral, start, elements, NodeData::None)
            }
            SyntaxKind::OpenBraceToken => self.parse_object_literal(),
            SyntaxKind::FunctionKeyword => self.parse_function_expression(),
            _ => self.error_node("expression"),
        }
    }

    fn parse_literal(&mut self, kind: LiteralKind) -> NodeIndex {
        let start = self.token_pos();
        let text: Arc<str> = match self.token_value() {
            Some(value) => value,
            None => Arc::from(self.token().text()),
        };
        self.next_token();
        self.finish_node(NodeKind::Literal, start, Vec::new(), NodeData::Literal { kind, text })
    }

    /// `[a, , b]`; holes are skipped.
    fn parse_array_elements(&mut self) -> Vec<NodeIndex> {
        let mut elements = Vec::new();
        if !self.parse_expected(SyntaxKind::OpenBracketToken) {
            return elements;
        }
        let saved = std::mem::replace(&mut self.no_in, false);
        while !self.is_token(SyntaxKind::CloseBracketToken) && !self.at_end() {
            if self.parse_optional(SyntaxKind::CommaToken) {
                continue;
            }
            elements.push(self.parse_assignment_expression());
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.no_in = saved;
        self.parse_expected(SyntaxKind::CloseBracketToken);
        elements
    }

    fn parse_object_literal(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let saved = std::mem::replace(&mut self.no_in, false);
        let mut properties = Vec::new();
        while !self.is_token(SyntaxKind::CloseBraceToken) && !self.at_end() {
            let prop_start = self.token_pos();
            let key = match self.token() {
                SyntaxKind::StringLiteral => self.parse_literal(LiteralKind::String),
                SyntaxKind::NumericLiteral => self.parse_literal(LiteralKind::Number),
                _ => self.parse_property_name(),
            };
            self.parse_expected(SyntaxKind::ColonToken);
            let value = self.parse_assignment_expression();
            properties.push(self.finish_node(
                NodeKind::ObjectProperty,
                prop_start,
                vec![key, value],
                NodeData::None,
            ));
            if !self.parse_optional(SyntaxKind::CommaToken) {
                break;
            }
        }
        self.no_in = saved;
        self.parse_expected(SyntaxKind::CloseBraceToken);
        self.finish_node(NodeKind::ObjectLiteral, start, properties, NodeData::None)
    }

    /// `function [name](params)[: T] { ... }`. Bodies of function expressions
    /// are always parsed eagerly.
    fn parse_function_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let mut decl = DeclData::default();
        let mut children = Vec::new();
        if self.is_token(SyntaxKind::Identifier) {
            decl.name = self.identifier_from_current();
            children.push(decl.name);
        }
        decl.params = self.parse_parameter_list();
        children.extend(decl.params.iter().copied());
        if self.parse_optional(SyntaxKind::ColonToken) {
            decl.type_annotation = self.parse_type();
            children.push(decl.type_annotation);
        }
        decl.body = self.parse_block();
        children.push(decl.body);
        self.finish_node(
            NodeKind::FunctionExpression,
            start,
            children,
            NodeData::Decl(Box::new(decl)),
        )
    }
}

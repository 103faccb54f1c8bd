//! Scanner state: converts one source text into tokens.

use crate::{SyntaxKind, Token};
use asc_common::problems::problem_codes;
use asc_common::{CompilerProblem, Span};
use std::sync::Arc;

/// Scanner over a single physical text.
///
/// Offsets produced are `base + local`; the include driver moves `base` as
/// it splices files together.
pub struct ScannerState {
    text: Arc<str>,
    pos: usize,
    base: u32,
    file_name: Arc<str>,
    problems: Vec<CompilerProblem>,
}

/// Saved scanner position for one-token lookahead.
#[derive(Clone, Copy, Debug)]
pub struct ScannerSnapshot {
    pos: usize,
    problem_count: usize,
}

impl ScannerState {
    pub fn new(file_name: Arc<str>, text: Arc<str>) -> ScannerState {
        ScannerState {
            text,
            pos: 0,
            base: 0,
            file_name,
            problems: Vec::new(),
        }
    }

    pub fn source_text(&self) -> &str {
        &self.text
    }

    /// Local position of the next character to scan.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn set_base(&mut self, base: u32) {
        self.base = base;
    }

    pub fn snapshot(&self) -> ScannerSnapshot {
        ScannerSnapshot {
            pos: self.pos,
            problem_count: self.problems.len(),
        }
    }

    pub fn restore(&mut self, snapshot: ScannerSnapshot) {
        self.pos = snapshot.pos;
        self.problems.truncate(snapshot.problem_count);
    }

    pub fn take_problems(&mut self) -> Vec<CompilerProblem> {
        std::mem::take(&mut self.problems)
    }

    #[inline]
    fn abs(&self, local: usize) -> u32 {
        self.base + local as u32
    }

    #[inline]
    fn peek_byte(&self, ahead: usize) -> Option<u8> {
        self.text.as_bytes().get(self.pos + ahead).copied()
    }

    fn report(&mut self, code: u32, start: usize, end: usize, args: &[&str]) {
        let span = Span::new(self.abs(start), self.abs(end));
        self.problems
            .push(CompilerProblem::new(code, &*self.file_name, span, args));
    }

    /// Skip whitespace and comments. Returns true if a line terminator was seen.
    fn skip_trivia(&mut self) -> bool {
        let text = self.text.clone();
        let bytes = text.as_bytes();
        let mut newline = false;
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\n' | b'\r' => {
                    newline = true;
                    self.pos += 1;
                }
                b' ' | b'\t' | 0x0B | 0x0C => self.pos += 1,
                b'/' if bytes.get(self.pos + 1) == Some(&b'/') => {
                    while self.pos < bytes.len() && bytes[self.pos] != b'\n' && bytes[self.pos] != b'\r' {
                        self.pos += 1;
                    }
                }
                b'/' if bytes.get(self.pos + 1) == Some(&b'*') => {
                    let start = self.pos;
                    self.pos += 2;
                    let mut closed = false;
                    while self.pos < bytes.len() {
                        if bytes[self.pos] == b'*' && bytes.get(self.pos + 1) == Some(&b'/') {
                            self.pos += 2;
                            closed = true;
                            break;
                        }
                        if bytes[self.pos] == b'\n' || bytes[self.pos] == b'\r' {
                            newline = true;
                        }
                        self.pos += 1;
                    }
                    if !closed {
                        self.report(problem_codes::UNTERMINATED_COMMENT, start, self.pos, &[]);
                    }
                }
                _ => {
                    // Non-ASCII whitespace (NBSP, BOM, line/paragraph separators)
                    let Some(ch) = text[self.pos..].chars().next() else {
                        break;
                    };
                    if ch == '\u{2028}' || ch == '\u{2029}' {
                        newline = true;
                        self.pos += ch.len_utf8();
                    } else if ch.is_whitespace() || ch == '\u{FEFF}' {
                        self.pos += ch.len_utf8();
                    } else {
                        break;
                    }
                }
            }
        }
        newline
    }

    /// Scan the next token. `regex_allowed` tells the scanner whether a `/`
    /// at this point begins a regular expression literal.
    pub fn scan(&mut self, regex_allowed: bool) -> Token {
        let newline_before = self.skip_trivia();
        let start = self.pos;
        let bytes = self.text.as_bytes();

        let Some(&b) = bytes.get(self.pos) else {
            return self.token(SyntaxKind::EndOfFileToken, start, None, newline_before);
        };

        let kind = match b {
            b'{' => self.single(SyntaxKind::OpenBraceToken),
            b'}' => self.single(SyntaxKind::CloseBraceToken),
            b'(' => self.single(SyntaxKind::OpenParenToken),
            b')' => self.single(SyntaxKind::CloseParenToken),
            b'[' => self.single(SyntaxKind::OpenBracketToken),
            b']' => self.single(SyntaxKind::CloseBracketToken),
            b';' => self.single(SyntaxKind::SemicolonToken),
            b',' => self.single(SyntaxKind::CommaToken),
            b'?' => self.single(SyntaxKind::QuestionToken),
            b'~' => self.single(SyntaxKind::TildeToken),
            b'@' => self.single(SyntaxKind::AtToken),
            // Always alone; see `SyntaxKind` docs.
            b'>' => self.single(SyntaxKind::GreaterThanToken),
            b'.' => {
                if self.peek_byte(1).is_some_and(|c| c.is_ascii_digit()) {
                    return self.scan_number(start, newline_before);
                }
                match (self.peek_byte(1), self.peek_byte(2)) {
                    (Some(b'.'), Some(b'.')) => self.multi(3, SyntaxKind::DotDotDotToken),
                    (Some(b'.'), _) => self.multi(2, SyntaxKind::DotDotToken),
                    (Some(b'<'), _) => self.multi(2, SyntaxKind::DotLessThanToken),
                    _ => self.single(SyntaxKind::DotToken),
                }
            }
            b':' => {
                if self.peek_byte(1) == Some(b':') {
                    self.multi(2, SyntaxKind::ColonColonToken)
                } else {
                    self.single(SyntaxKind::ColonToken)
                }
            }
            b'=' => match (self.peek_byte(1), self.peek_byte(2)) {
                (Some(b'='), Some(b'=')) => self.multi(3, SyntaxKind::EqualsEqualsEqualsToken),
                (Some(b'='), _) => self.multi(2, SyntaxKind::EqualsEqualsToken),
                _ => self.single(SyntaxKind::EqualsToken),
            },
            b'!' => match (self.peek_byte(1), self.peek_byte(2)) {
                (Some(b'='), Some(b'=')) => {
                    self.multi(3, SyntaxKind::ExclamationEqualsEqualsToken)
                }
                (Some(b'='), _) => self.multi(2, SyntaxKind::ExclamationEqualsToken),
                _ => self.single(SyntaxKind::ExclamationToken),
            },
            b'<' => match (self.peek_byte(1), self.peek_byte(2)) {
                (Some(b'<'), Some(b'=')) => self.multi(3, SyntaxKind::LessThanLessThanEqualsToken),
                (Some(b'<'), _) => self.multi(2, SyntaxKind::LessThanLessThanToken),
                (Some(b'='), _) => self.multi(2, SyntaxKind::LessThanEqualsToken),
                _ => self.single(SyntaxKind::LessThanToken),
            },
            b'+' => match self.peek_byte(1) {
                Some(b'+') => self.multi(2, SyntaxKind::PlusPlusToken),
                Some(b'=') => self.multi(2, SyntaxKind::PlusEqualsToken),
                _ => self.single(SyntaxKind::PlusToken),
            },
            b'-' => match self.peek_byte(1) {
                Some(b'-') => self.multi(2, SyntaxKind::MinusMinusToken),
                Some(b'=') => self.multi(2, SyntaxKind::MinusEqualsToken),
                _ => self.single(SyntaxKind::MinusToken),
            },
            b'*' => match self.peek_byte(1) {
                Some(b'=') => self.multi(2, SyntaxKind::AsteriskEqualsToken),
                _ => self.single(SyntaxKind::AsteriskToken),
            },
            b'%' => match self.peek_byte(1) {
                Some(b'=') => self.multi(2, SyntaxKind::PercentEqualsToken),
                _ => self.single(SyntaxKind::PercentToken),
            },
            b'^' => match self.peek_byte(1) {
                Some(b'=') => self.multi(2, SyntaxKind::CaretEqualsToken),
                _ => self.single(SyntaxKind::CaretToken),
            },
            b'&' => match (self.peek_byte(1), self.peek_byte(2)) {
                (Some(b'&'), Some(b'=')) => {
                    self.multi(3, SyntaxKind::AmpersandAmpersandEqualsToken)
                }
                (Some(b'&'), _) => self.multi(2, SyntaxKind::AmpersandAmpersandToken),
                (Some(b'='), _) => self.multi(2, SyntaxKind::AmpersandEqualsToken),
                _ => self.single(SyntaxKind::AmpersandToken),
            },
            b'|' => match (self.peek_byte(1), self.peek_byte(2)) {
                (Some(b'|'), Some(b'=')) => self.multi(3, SyntaxKind::BarBarEqualsToken),
                (Some(b'|'), _) => self.multi(2, SyntaxKind::BarBarToken),
                (Some(b'='), _) => self.multi(2, SyntaxKind::BarEqualsToken),
                _ => self.single(SyntaxKind::BarToken),
            },
            b'/' => {
                if regex_allowed {
                    return self.scan_regex(start, newline_before);
                }
                match self.peek_byte(1) {
                    Some(b'=') => self.multi(2, SyntaxKind::SlashEqualsToken),
                    _ => self.single(SyntaxKind::SlashToken),
                }
            }
            b'"' | b'\'' => return self.scan_string(start, b, newline_before),
            b'0'..=b'9' => return self.scan_number(start, newline_before),
            _ => {
                let ch = self.text[self.pos..].chars().next().unwrap_or('\0');
                if is_identifier_start(ch) {
                    return self.scan_identifier(start, newline_before);
                }
                self.pos += ch.len_utf8().max(1);
                let text = ch.to_string();
                self.report(problem_codes::INVALID_CHARACTER, start, self.pos, &[&text]);
                SyntaxKind::Unknown
            }
        };

        self.token(kind, start, None, newline_before)
    }

    #[inline]
    fn single(&mut self, kind: SyntaxKind) -> SyntaxKind {
        self.pos += 1;
        kind
    }

    #[inline]
    fn multi(&mut self, len: usize, kind: SyntaxKind) -> SyntaxKind {
        self.pos += len;
        kind
    }

    fn token(
        &self,
        kind: SyntaxKind,
        start: usize,
        value: Option<Arc<str>>,
        newline_before: bool,
    ) -> Token {
        Token {
            kind,
            start: self.abs(start),
            end: self.abs(self.pos),
            value,
            newline_before,
        }
    }

    fn scan_identifier(&mut self, start: usize, newline_before: bool) -> Token {
        let rest = &self.text[self.pos..];
        let len = rest
            .char_indices()
            .find(|&(_, c)| !is_identifier_part(c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        let word = &self.text[start..self.pos];
        match SyntaxKind::from_keyword(word) {
            Some(keyword) => self.token(keyword, start, None, newline_before),
            None => {
                let value: Arc<str> = Arc::from(word);
                self.token(SyntaxKind::Identifier, start, Some(value), newline_before)
            }
        }
    }

    fn scan_number(&mut self, start: usize, newline_before: bool) -> Token {
        let bytes = self.text.as_bytes();
        if bytes[self.pos] == b'0' && matches!(self.peek_byte(1), Some(b'x' | b'X')) {
            self.pos += 2;
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_hexdigit() {
                self.pos += 1;
            }
        } else {
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
            // A fraction needs a digit or end-of-number after the dot so `1..2`
            // and `a[0].x` keep their dots.
            if self.pos < bytes.len()
                && bytes[self.pos] == b'.'
                && self.peek_byte(1) != Some(b'.')
                && !self.peek_byte(1).is_some_and(is_identifier_start_byte)
            {
                self.pos += 1;
                while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                    self.pos += 1;
                }
            }
            if self.pos < bytes.len() && matches!(bytes[self.pos], b'e' | b'E') {
                let mut look = self.pos + 1;
                if matches!(bytes.get(look), Some(b'+' | b'-')) {
                    look += 1;
                }
                if bytes.get(look).is_some_and(|c| c.is_ascii_digit()) {
                    self.pos = look;
                    while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                        self.pos += 1;
                    }
                }
            }
        }
        let value: Arc<str> = Arc::from(&self.text[start..self.pos]);
        self.token(SyntaxKind::NumericLiteral, start, Some(value), newline_before)
    }

    fn scan_string(&mut self, start: usize, quote: u8, newline_before: bool) -> Token {
        self.pos += 1;
        let mut value = String::new();
        let mut closed = false;
        while self.pos < self.text.len() {
            let Some(ch) = self.text[self.pos..].chars().next() else {
                break;
            };
            if ch as u32 == quote as u32 {
                self.pos += 1;
                closed = true;
                break;
            }
            if ch == '\n' || ch == '\r' {
                break;
            }
            self.pos += ch.len_utf8();
            if ch == '\\' {
                let Some(esc) = self.text[self.pos..].chars().next() else {
                    break;
                };
                self.pos += esc.len_utf8();
                match esc {
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'b' => value.push('\u{8}'),
                    'f' => value.push('\u{c}'),
                    'v' => value.push('\u{b}'),
                    '0' => value.push('\0'),
                    'u' => {
                        let hex = self.text.get(self.pos..self.pos + 4).unwrap_or("");
                        match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                            Some(c) if hex.len() == 4 => {
                                value.push(c);
                                self.pos += 4;
                            }
                            _ => value.push('u'),
                        }
                    }
                    'x' => {
                        let hex = self.text.get(self.pos..self.pos + 2).unwrap_or("");
                        match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                            Some(c) if hex.len() == 2 => {
                                value.push(c);
                                self.pos += 2;
                            }
                            _ => value.push('x'),
                        }
                    }
                    '\r' => {
                        if self.peek_byte(0) == Some(b'\n') {
                            self.pos += 1;
                        }
                    }
                    '\n' => {}
                    other => value.push(other),
                }
            } else {
                value.push(ch);
            }
        }
        if !closed {
            self.report(problem_codes::UNTERMINATED_STRING, start, self.pos, &[]);
        }
        let value: Arc<str> = Arc::from(value);
        self.token(SyntaxKind::StringLiteral, start, Some(value), newline_before)
    }

    fn scan_regex(&mut self, start: usize, newline_before: bool) -> Token {
        let text = self.text.clone();
        let bytes = text.as_bytes();
        self.pos += 1;
        let mut in_class = false;
        let mut closed = false;
        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\\' => self.pos += 2,
                b'[' => {
                    in_class = true;
                    self.pos += 1;
                }
                b']' => {
                    in_class = false;
                    self.pos += 1;
                }
                b'/' if !in_class => {
                    self.pos += 1;
                    closed = true;
                    break;
                }
                b'\n' | b'\r' => break,
                _ => self.pos += 1,
            }
        }
        self.pos = self.pos.min(bytes.len());
        if closed {
            // Flags
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_alphabetic() {
                self.pos += 1;
            }
        } else {
            self.report(problem_codes::UNTERMINATED_REGEX, start, self.pos, &[]);
        }
        let value: Arc<str> = Arc::from(&self.text[start..self.pos]);
        self.token(SyntaxKind::RegexLiteral, start, Some(value), newline_before)
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphabetic()
}

fn is_identifier_start_byte(b: u8) -> bool {
    b == b'_' || b == b'$' || b.is_ascii_alphabetic()
}

fn is_identifier_part(ch: char) -> bool {
    ch == '_' || ch == '$' || ch.is_alphanumeric()
}

#[cfg(test)]
#[path = "../tests/scanner_tests.rs"]
mod scanner_tests;

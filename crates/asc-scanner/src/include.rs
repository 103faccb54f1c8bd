//! Whole-unit tokenization with `include` splicing.
//!
//! `include "path";` is textual: the included file's tokens replace the
//! directive in the stream, and the including file's later offsets move past
//! the included text. The resulting `OffsetLookup` maps every absolute offset
//! back to its physical file.

use crate::scanner::ScannerState;
use crate::{SyntaxKind, Token};
use asc_common::limits::MAX_INCLUDE_DEPTH;
use asc_common::problems::problem_codes;
use asc_common::{CompilerProblem, OffsetLookup, Span};
use std::sync::Arc;
use tracing::{debug, trace};

/// Text of an included file, as found by an `IncludeLoader`.
#[derive(Debug, Clone)]
pub struct LoadedInclude {
    /// Normalized path of the included file.
    pub path: Arc<str>,
    pub text: Arc<str>,
}

/// Resolves the target of an `include` directive.
pub trait IncludeLoader {
    /// `including_file` is the file containing the directive; `target` is the
    /// string literal. Returns `None` when the file cannot be read.
    fn load(&self, including_file: &str, target: &str) -> Option<LoadedInclude>;
}

/// Tokens and bookkeeping for one compilation unit.
#[derive(Debug, Default)]
pub struct TokenizeResult {
    pub tokens: Vec<Token>,
    pub lookup: OffsetLookup,
    /// Every file spliced in, transitively, in inclusion order.
    pub included_files: Vec<Arc<str>>,
    pub problems: Vec<CompilerProblem>,
}

struct Tokenizer<'a> {
    root_file: Arc<str>,
    loader: Option<&'a dyn IncludeLoader>,
    result: TokenizeResult,
    /// Next free absolute offset.
    abs: u32,
    stack: Vec<Arc<str>>,
}

/// Tokenize `text` as the root file `file`, splicing includes through `loader`.
/// Without a loader, include directives report a missing file.
pub fn tokenize(
    file: Arc<str>,
    text: Arc<str>,
    loader: Option<&dyn IncludeLoader>,
) -> TokenizeResult {
    let mut tokenizer = Tokenizer {
        root_file: file.clone(),
        loader,
        result: TokenizeResult::default(),
        abs: 0,
        stack: Vec::new(),
    };
    tokenizer.tokenize_file(file, text);
    let eof = tokenizer.abs;
    let newline_before = false;
    tokenizer.result.tokens.push(Token {
        kind: SyntaxKind::EndOfFileToken,
        start: eof,
        end: eof,
        value: None,
        newline_before,
    });
    tokenizer.result
}

impl Tokenizer<'_> {
    fn regex_allowed(&self) -> bool {
        self.result
            .tokens
            .last()
            .is_none_or(|t| !t.kind.ends_operand())
    }

    fn tokenize_file(&mut self, file: Arc<str>, text: Arc<str>) {
        trace!(file = %file, depth = self.stack.len(), "tokenize_file");
        self.stack.push(file.clone());
        self.result.lookup.add_file(file.clone(), text.clone());

        let mut scanner = ScannerState::new(self.root_file.clone(), text.clone());
        // Local offset where the current region of this file began.
        let mut region_local = 0u32;
        let mut region_abs = self.abs;
        scanner.set_base(region_abs);

        loop {
            let token = scanner.scan(self.regex_allowed());
            if token.kind == SyntaxKind::EndOfFileToken {
                break;
            }

            if token.is_identifier_named("include") {
                let snapshot = scanner.snapshot();
                let target = scanner.scan(false);
                if target.kind == SyntaxKind::StringLiteral {
                    // Directive ends after the string, or after an optional `;`.
                    let after_string = scanner.snapshot();
                    let semi = scanner.scan(false);
                    if semi.kind != SyntaxKind::SemicolonToken {
                        scanner.restore(after_string);
                    }
                    let directive_end_local = scanner.pos() as u32;
                    let directive_span = Span::new(token.start, target.end);

                    // Close the current region at the end of the directive.
                    let region_end_abs = region_abs + (directive_end_local - region_local);
                    self.result.lookup.push_region(
                        file.clone(),
                        region_abs,
                        region_end_abs,
                        region_local,
                    );
                    self.abs = region_end_abs;

                    let target_path = target.value.clone().unwrap_or_else(|| Arc::from(""));
                    self.include(&file, &target_path, directive_span);

                    // Resume this file after the included text.
                    region_local = directive_end_local;
                    region_abs = self.abs;
                    scanner.set_base(region_abs - region_local);
                    continue;
                }
                scanner.restore(snapshot);
            }

            self.result.tokens.push(token);
        }

        let end_local = text.len() as u32;
        let end_abs = region_abs + (end_local - region_local);
        self.result
            .lookup
            .push_region(file, region_abs, end_abs, region_local);
        self.abs = end_abs;
        self.result.problems.extend(scanner.take_problems());
        self.stack.pop();
    }

    fn include(&mut self, including: &Arc<str>, target: &str, directive: Span) {
        let report = |code: u32, args: &[&str]| {
            CompilerProblem::new(code, &*self.root_file, directive, args)
        };

        if self.stack.len() as u32 >= MAX_INCLUDE_DEPTH {
            let depth = MAX_INCLUDE_DEPTH.to_string();
            let problem = report(problem_codes::INCLUDE_TOO_DEEP, &[&depth, target]);
            self.result.problems.push(problem);
            return;
        }

        let Some(loaded) = self.loader.and_then(|l| l.load(including, target)) else {
            let problem = report(problem_codes::INCLUDE_NOT_FOUND, &[target]);
            self.result.problems.push(problem);
            return;
        };

        if self.stack.iter().any(|f| **f == *loaded.path) {
            let problem = report(problem_codes::INCLUDE_CYCLE, &[&loaded.path]);
            self.result.problems.push(problem);
            return;
        }

        debug!(including = %including, included = %loaded.path, at = self.abs, "splicing include");
        if !self.result.included_files.contains(&loaded.path) {
            self.result.included_files.push(loaded.path.clone());
        }
        self.tokenize_file(loaded.path, loaded.text);
    }
}

#[cfg(test)]
#[path = "../tests/include_tests.rs"]
mod include_tests;

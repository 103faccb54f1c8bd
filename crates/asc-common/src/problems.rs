//! Compiler problems.
//!
//! Every recoverable condition the front end detects (syntax errors, bad
//! includes, unresolved or ambiguous names) becomes a `CompilerProblem` value
//! collected on the request result that found it. Problems are never thrown.

pub mod data;

use crate::offset_lookup::OffsetLookup;
use crate::span::Span;
use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProblemSeverity {
    Error,
    Warning,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ProblemMessage {
    pub code: u32,
    pub severity: ProblemSeverity,
    pub message: &'static str,
}

pub mod problem_codes {
    pub use super::data::problem_codes::*;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CompilerProblem {
    pub code: u32,
    pub severity: ProblemSeverity,
    /// Physical file the problem is reported against.
    pub file: String,
    /// Offset local to `file`.
    pub start: u32,
    pub length: u32,
    /// 0-indexed line, filled in by `locate`.
    pub line: u32,
    /// 0-indexed column, filled in by `locate`.
    pub column: u32,
    pub message: String,
}

impl CompilerProblem {
    /// Build a problem from the message table. `span` is absolute; call
    /// `locate` to translate it into the physical file.
    pub fn new(code: u32, file: impl Into<String>, span: Span, args: &[&str]) -> Self {
        let (severity, message) = match get_message(code) {
            Some(msg) => (msg.severity, format_message(msg.message, args)),
            None => (ProblemSeverity::Error, args.join(" ")),
        };
        CompilerProblem {
            code,
            severity,
            file: file.into(),
            start: span.start,
            length: span.len(),
            line: 0,
            column: 0,
            message,
        }
    }

    pub fn with_severity(mut self, severity: ProblemSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Translate the absolute start offset into (file, local offset, line, column).
    pub fn locate(mut self, lookup: &OffsetLookup) -> Self {
        if let Some(loc) = lookup.location(self.start) {
            self.file = loc.file;
            self.start = loc.offset;
            self.line = loc.line;
            self.column = loc.character;
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == ProblemSeverity::Error
    }
}

impl std::fmt::Display for CompilerProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            ProblemSeverity::Error => "error",
            ProblemSeverity::Warning => "warning",
        };
        write!(
            f,
            "{}({},{}): {} {}: {}",
            self.file,
            self.line + 1,
            self.column + 1,
            severity,
            self.code,
            self.message
        )
    }
}

pub fn get_message(code: u32) -> Option<&'static ProblemMessage> {
    data::PROBLEM_MESSAGES.iter().find(|m| m.code == code)
}

pub fn format_message(message: &str, args: &[&str]) -> String {
    let mut result = message.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

#[cfg(test)]
#[path = "../tests/problems_tests.rs"]
mod problems_tests;

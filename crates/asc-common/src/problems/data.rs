//! Problem message table.

use super::{ProblemMessage, ProblemSeverity};

pub mod problem_codes {
    // Syntax (1000-1099)
    pub const SYNTAX_ERROR: u32 = 1000;
    pub const EXPECTED_TOKEN: u32 = 1001;
    pub const UNTERMINATED_STRING: u32 = 1002;
    pub const UNTERMINATED_COMMENT: u32 = 1003;
    pub const INVALID_CHARACTER: u32 = 1004;
    pub const UNTERMINATED_REGEX: u32 = 1005;
    pub const NESTING_TOO_DEEP: u32 = 1006;

    // Includes (1100-1199)
    pub const INCLUDE_NOT_FOUND: u32 = 1100;
    pub const INCLUDE_CYCLE: u32 = 1101;
    pub const INCLUDE_TOO_DEEP: u32 = 1102;

    // Semantics (1200-1399)
    pub const UNRESOLVED_IMPORT: u32 = 1200;
    pub const UNRESOLVED_TYPE: u32 = 1201;
    pub const AMBIGUOUS_REFERENCE: u32 = 1202;
    pub const UNDEFINED_PROPERTY: u32 = 1203;
    pub const INVALID_TYPE_APPLICATION: u32 = 1204;
    pub const CIRCULAR_INHERITANCE: u32 = 1205;
    pub const CONST_REDECLARED: u32 = 1206;
    pub const BASE_NOT_A_CLASS: u32 = 1207;

    // Infrastructure (1500-1599)
    pub const INTERNAL_ERROR: u32 = 1500;
    pub const FILE_NOT_FOUND: u32 = 1501;
}

use problem_codes::*;

pub static PROBLEM_MESSAGES: &[ProblemMessage] = &[
    ProblemMessage {
        code: SYNTAX_ERROR,
        severity: ProblemSeverity::Error,
        message: "Syntax error: {0}.",
    },
    ProblemMessage {
        code: EXPECTED_TOKEN,
        severity: ProblemSeverity::Error,
        message: "Syntax error: expecting {0} but found '{1}'.",
    },
    ProblemMessage {
        code: UNTERMINATED_STRING,
        severity: ProblemSeverity::Error,
        message: "Syntax error: unterminated string literal.",
    },
    ProblemMessage {
        code: UNTERMINATED_COMMENT,
        severity: ProblemSeverity::Error,
        message: "Syntax error: unterminated block comment.",
    },
    ProblemMessage {
        code: INVALID_CHARACTER,
        severity: ProblemSeverity::Error,
        message: "Syntax error: invalid character '{0}'.",
    },
    ProblemMessage {
        code: UNTERMINATED_REGEX,
        severity: ProblemSeverity::Error,
        message: "Syntax error: unterminated regular expression.",
    },
    ProblemMessage {
        code: NESTING_TOO_DEEP,
        severity: ProblemSeverity::Error,
        message: "Syntax error: nesting exceeds the maximum depth of {0}.",
    },
    ProblemMessage {
        code: INCLUDE_NOT_FOUND,
        severity: ProblemSeverity::Error,
        message: "Unable to open included file: {0}.",
    },
    ProblemMessage {
        code: INCLUDE_CYCLE,
        severity: ProblemSeverity::Error,
        message: "Included file {0} includes itself.",
    },
    ProblemMessage {
        code: INCLUDE_TOO_DEEP,
        severity: ProblemSeverity::Error,
        message: "Include nesting exceeds the maximum depth of {0} at {1}.",
    },
    ProblemMessage {
        code: UNRESOLVED_IMPORT,
        severity: ProblemSeverity::Error,
        message: "Definition {0} could not be found.",
    },
    ProblemMessage {
        code: UNRESOLVED_TYPE,
        severity: ProblemSeverity::Error,
        message: "Type was not found or was not a compile-time constant: {0}.",
    },
    ProblemMessage {
        code: AMBIGUOUS_REFERENCE,
        severity: ProblemSeverity::Error,
        message: "Ambiguous reference to {0}.",
    },
    ProblemMessage {
        code: UNDEFINED_PROPERTY,
        severity: ProblemSeverity::Warning,
        message: "Access of possibly undefined property {0}.",
    },
    ProblemMessage {
        code: INVALID_TYPE_APPLICATION,
        severity: ProblemSeverity::Error,
        message: "Type parameters can only be applied to Vector, not {0}.",
    },
    ProblemMessage {
        code: CIRCULAR_INHERITANCE,
        severity: ProblemSeverity::Error,
        message: "Circular type reference was detected in {0}.",
    },
    ProblemMessage {
        code: CONST_REDECLARED,
        severity: ProblemSeverity::Error,
        message: "A conflict exists with definition {0}.",
    },
    ProblemMessage {
        code: BASE_NOT_A_CLASS,
        severity: ProblemSeverity::Error,
        message: "{0} cannot extend {1} because it is not a class.",
    },
    ProblemMessage {
        code: INTERNAL_ERROR,
        severity: ProblemSeverity::Error,
        message: "Internal error while processing {0}: {1}",
    },
    ProblemMessage {
        code: FILE_NOT_FOUND,
        severity: ProblemSeverity::Error,
        message: "File not found: {0}.",
    },
];

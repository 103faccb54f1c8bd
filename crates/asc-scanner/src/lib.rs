//! ActionScript 3 scanner for the asc compiler.
//!
//! `ScannerState` turns one text into tokens. `tokenize` drives it over a
//! whole compilation unit, splicing `include "file"` directives into a single
//! token stream with absolute offsets.

use serde::Serialize;
use std::sync::Arc;

pub mod scanner;
pub use scanner::ScannerState;

pub mod include;
pub use include::{IncludeLoader, LoadedInclude, TokenizeResult, tokenize};

/// Token kinds.
///
/// `>` is always scanned alone; the parser joins adjacent `>` tokens into
/// shift and comparison operators so `Vector.<Vector.<int>>` needs no rescan.
/// Contextual words (`get`, `set`, `each`, `namespace`, `include`, `static`,
/// `override`, `final`, `dynamic`, `native`) are scanned as identifiers.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SyntaxKind {
    Unknown,
    EndOfFileToken,
    Identifier,
    StringLiteral,
    NumericLiteral,
    RegexLiteral,

    // Punctuation
    OpenBraceToken,
    CloseBraceToken,
    OpenParenToken,
    CloseParenToken,
    OpenBracketToken,
    CloseBracketToken,
    DotToken,
    DotDotToken,
    DotDotDotToken,
    DotLessThanToken,
    SemicolonToken,
    CommaToken,
    LessThanToken,
    GreaterThanToken,
    LessThanEqualsToken,
    EqualsEqualsToken,
    ExclamationEqualsToken,
    EqualsEqualsEqualsToken,
    ExclamationEqualsEqualsToken,
    PlusToken,
    MinusToken,
    AsteriskToken,
    SlashToken,
    PercentToken,
    PlusPlusToken,
    MinusMinusToken,
    LessThanLessThanToken,
    AmpersandToken,
    BarToken,
    CaretToken,
    ExclamationToken,
    TildeToken,
    AmpersandAmpersandToken,
    BarBarToken,
    QuestionToken,
    ColonToken,
    ColonColonToken,
    AtToken,
    EqualsToken,
    PlusEqualsToken,
    MinusEqualsToken,
    AsteriskEqualsToken,
    SlashEqualsToken,
    PercentEqualsToken,
    LessThanLessThanEqualsToken,
    AmpersandEqualsToken,
    BarEqualsToken,
    CaretEqualsToken,
    AmpersandAmpersandEqualsToken,
    BarBarEqualsToken,

    // Composed by the parser from adjacent `>` tokens; never scanned.
    GreaterThanEqualsToken,
    GreaterThanGreaterThanToken,
    GreaterThanGreaterThanGreaterThanToken,
    GreaterThanGreaterThanEqualsToken,
    GreaterThanGreaterThanGreaterThanEqualsToken,

    // Reserved words
    AsKeyword,
    BreakKeyword,
    CaseKeyword,
    CatchKeyword,
    ClassKeyword,
    ConstKeyword,
    ContinueKeyword,
    DefaultKeyword,
    DeleteKeyword,
    DoKeyword,
    ElseKeyword,
    ExtendsKeyword,
    FalseKeyword,
    FinallyKeyword,
    ForKeyword,
    FunctionKeyword,
    IfKeyword,
    ImplementsKeyword,
    ImportKeyword,
    InKeyword,
    InstanceofKeyword,
    InterfaceKeyword,
    InternalKeyword,
    IsKeyword,
    NewKeyword,
    NullKeyword,
    PackageKeyword,
    PrivateKeyword,
    ProtectedKeyword,
    PublicKeyword,
    ReturnKeyword,
    SuperKeyword,
    SwitchKeyword,
    ThisKeyword,
    ThrowKeyword,
    TrueKeyword,
    TryKeyword,
    TypeofKeyword,
    UseKeyword,
    VarKeyword,
    VoidKeyword,
    WhileKeyword,
    WithKeyword,
}

impl SyntaxKind {
    pub fn from_keyword(text: &str) -> Option<SyntaxKind> {
        use SyntaxKind::*;
        Some(match text {
            "as" => AsKeyword,
            "break" => BreakKeyword,
            "case" => CaseKeyword,
            "catch" => CatchKeyword,
            "class" => ClassKeyword,
            "const" => ConstKeyword,
            "continue" => ContinueKeyword,
            "default" => DefaultKeyword,
            "delete" => DeleteKeyword,
            "do" => DoKeyword,
            "else" => ElseKeyword,
            "extends" => ExtendsKeyword,
            "false" => FalseKeyword,
            "finally" => FinallyKeyword,
            "for" => ForKeyword,
            "function" => FunctionKeyword,
            "if" => IfKeyword,
            "implements" => ImplementsKeyword,
            "import" => ImportKeyword,
            "in" => InKeyword,
            "instanceof" => InstanceofKeyword,
            "interface" => InterfaceKeyword,
            "internal" => InternalKeyword,
            "is" => IsKeyword,
            "new" => NewKeyword,
            "null" => NullKeyword,
            "package" => PackageKeyword,
            "private" => PrivateKeyword,
            "protected" => ProtectedKeyword,
            "public" => PublicKeyword,
            "return" => ReturnKeyword,
            "super" => SuperKeyword,
            "switch" => SwitchKeyword,
            "this" => ThisKeyword,
            "throw" => ThrowKeyword,
            "true" => TrueKeyword,
            "try" => TryKeyword,
            "typeof" => TypeofKeyword,
            "use" => UseKeyword,
            "var" => VarKeyword,
            "void" => VoidKeyword,
            "while" => WhileKeyword,
            "with" => WithKeyword,
            _ => return None,
        })
    }

    pub fn is_keyword(self) -> bool {
        (self as u16) >= (SyntaxKind::AsKeyword as u16)
    }

    /// Tokens after which a `/` starts a division rather than a regex.
    pub fn ends_operand(self) -> bool {
        matches!(
            self,
            SyntaxKind::Identifier
                | SyntaxKind::StringLiteral
                | SyntaxKind::NumericLiteral
                | SyntaxKind::RegexLiteral
                | SyntaxKind::CloseParenToken
                | SyntaxKind::CloseBracketToken
                | SyntaxKind::ThisKeyword
                | SyntaxKind::SuperKeyword
                | SyntaxKind::TrueKeyword
                | SyntaxKind::FalseKeyword
                | SyntaxKind::NullKeyword
                | SyntaxKind::PlusPlusToken
                | SyntaxKind::MinusMinusToken
        )
    }

    /// Source text of punctuation and keywords, for messages.
    pub fn text(self) -> &'static str {
        use SyntaxKind::*;
        match self {
            Unknown => "<unknown>",
            EndOfFileToken => "end of file",
            Identifier => "identifier",
            StringLiteral => "string",
            NumericLiteral => "number",
            RegexLiteral => "regular expression",
            OpenBraceToken => "{",
            CloseBraceToken => "}",
            OpenParenToken => "(",
            CloseParenToken => ")",
            OpenBracketToken => "[",
            CloseBracketToken => "]",
            DotToken => ".",
            DotDotToken => "..",
            DotDotDotToken => "...",
            DotLessThanToken => ".<",
            SemicolonToken => ";",
            CommaToken => ",",
            LessThanToken => "<",
            GreaterThanToken => ">",
            LessThanEqualsToken => "<=",
            EqualsEqualsToken => "==",
            ExclamationEqualsToken => "!=",
            EqualsEqualsEqualsToken => "===",
            ExclamationEqualsEqualsToken => "!==",
            PlusToken => "+",
            MinusToken => "-",
            AsteriskToken => "*",
            SlashToken => "/",
            PercentToken => "%",
            PlusPlusToken => "++",
            MinusMinusToken => "--",
            LessThanLessThanToken => "<<",
            AmpersandToken => "&",
            BarToken => "|",
            CaretToken => "^",
            ExclamationToken => "!",
            TildeToken => "~",
            AmpersandAmpersandToken => "&&",
            BarBarToken => "||",
            QuestionToken => "?",
            ColonToken => ":",
            ColonColonToken => "::",
            AtToken => "@",
            EqualsToken => "=",
            PlusEqualsToken => "+=",
            MinusEqualsToken => "-=",
            AsteriskEqualsToken => "*=",
            SlashEqualsToken => "/=",
            PercentEqualsToken => "%=",
            LessThanLessThanEqualsToken => "<<=",
            AmpersandEqualsToken => "&=",
            BarEqualsToken => "|=",
            CaretEqualsToken => "^=",
            AmpersandAmpersandEqualsToken => "&&=",
            BarBarEqualsToken => "||=",
            GreaterThanEqualsToken => ">=",
            GreaterThanGreaterThanToken => ">>",
            GreaterThanGreaterThanGreaterThanToken => ">>>",
            GreaterThanGreaterThanEqualsToken => ">>=",
            GreaterThanGreaterThanGreaterThanEqualsToken => ">>>=",
            AsKeyword => "as",
            BreakKeyword => "break",
            CaseKeyword => "case",
            CatchKeyword => "catch",
            ClassKeyword => "class",
            ConstKeyword => "const",
            ContinueKeyword => "continue",
            DefaultKeyword => "default",
            DeleteKeyword => "delete",
            DoKeyword => "do",
            ElseKeyword => "else",
            ExtendsKeyword => "extends",
            FalseKeyword => "false",
            FinallyKeyword => "finally",
            ForKeyword => "for",
            FunctionKeyword => "function",
            IfKeyword => "if",
            ImplementsKeyword => "implements",
            ImportKeyword => "import",
            InKeyword => "in",
            InstanceofKeyword => "instanceof",
            InterfaceKeyword => "interface",
            InternalKeyword => "internal",
            IsKeyword => "is",
            NewKeyword => "new",
            NullKeyword => "null",
            PackageKeyword => "package",
            PrivateKeyword => "private",
            ProtectedKeyword => "protected",
            PublicKeyword => "public",
            ReturnKeyword => "return",
            SuperKeyword => "super",
            SwitchKeyword => "switch",
            ThisKeyword => "this",
            ThrowKeyword => "throw",
            TrueKeyword => "true",
            TryKeyword => "try",
            TypeofKeyword => "typeof",
            UseKeyword => "use",
            VarKeyword => "var",
            VoidKeyword => "void",
            WhileKeyword => "while",
            WithKeyword => "with",
        }
    }
}

/// A scanned token. Offsets are absolute within the compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: SyntaxKind,
    pub start: u32,
    pub end: u32,
    /// Identifier name, unescaped string value, numeric or regex source.
    pub value: Option<Arc<str>>,
    /// A line terminator precedes this token.
    pub newline_before: bool,
}

impl Token {
    pub fn text(&self) -> &str {
        match &self.value {
            Some(v) => v,
            None => self.kind.text(),
        }
    }

    pub fn is_identifier_named(&self, name: &str) -> bool {
        self.kind == SyntaxKind::Identifier && self.value.as_deref() == Some(name)
    }
}

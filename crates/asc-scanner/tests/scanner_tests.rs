use super::*;

fn scan_all(source: &str) -> (Vec<Token>, Vec<CompilerProblem>) {
    let mut scanner = ScannerState::new(Arc::from("test.as"), Arc::from(source));
    let mut tokens: Vec<Token> = Vec::new();
    loop {
        let regex_allowed = tokens.last().is_none_or(|t| !t.kind.ends_operand());
        let token = scanner.scan(regex_allowed);
        let done = token.kind == SyntaxKind::EndOfFileToken;
        tokens.push(token);
        if done {
            break;
        }
    }
    (tokens, scanner.take_problems())
}

fn kinds(source: &str) -> Vec<SyntaxKind> {
    scan_all(source).0.into_iter().map(|t| t.kind).collect()
}

#[test]
fn test_keywords_and_contextual_words() {
    use SyntaxKind::*;
    assert_eq!(
        kinds("package a { public class B extends C {} }"),
        vec![
            PackageKeyword,
            Identifier,
            OpenBraceToken,
            PublicKeyword,
            ClassKeyword,
            Identifier,
            ExtendsKeyword,
            Identifier,
            OpenBraceToken,
            CloseBraceToken,
            CloseBraceToken,
            EndOfFileToken,
        ]
    );
    // `get`, `namespace` and `include` stay identifiers
    let (tokens, _) = scan_all("get namespace include");
    assert!(tokens[0].is_identifier_named("get"));
    assert!(tokens[1].is_identifier_named("namespace"));
    assert!(tokens[2].is_identifier_named("include"));
}

#[test]
fn test_vector_syntax_keeps_greater_than_separate() {
    use SyntaxKind::*;
    assert_eq!(
        kinds("Vector.<Vector.<int>>"),
        vec![
            Identifier,
            DotLessThanToken,
            Identifier,
            DotLessThanToken,
            Identifier,
            GreaterThanToken,
            GreaterThanToken,
            EndOfFileToken,
        ]
    );
}

#[test]
fn test_string_escapes_are_decoded() {
    let (tokens, problems) = scan_all(r#"'a\nb' "q\"A""#);
    assert!(problems.is_empty());
    assert_eq!(tokens[0].value.as_deref(), Some("a\nb"));
    assert_eq!(tokens[1].value.as_deref(), Some("q\"A"));
    assert_eq!((tokens[1].start, tokens[1].end), (7, 13));
}

#[test]
fn test_unterminated_string_reports_problem() {
    let (tokens, problems) = scan_all("'abc\nx");
    assert_eq!(tokens[0].kind, SyntaxKind::StringLiteral);
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].code, problem_codes::UNTERMINATED_STRING);
    assert!(tokens[1].newline_before);
}

#[test]
fn test_regex_versus_division() {
    use SyntaxKind::*;
    assert_eq!(
        kinds("a / b"),
        vec![Identifier, SlashToken, Identifier, EndOfFileToken]
    );
    let (tokens, _) = scan_all("x = /a[/]b/gi;");
    assert_eq!(tokens[2].kind, RegexLiteral);
    assert_eq!(tokens[2].value.as_deref(), Some("/a[/]b/gi"));
    assert_eq!(tokens[3].kind, SemicolonToken);
}

#[test]
fn test_numbers_and_member_dots() {
    let (tokens, _) = scan_all("0xFF 1.5e3 .5 a[0].x 1..2");
    let values: Vec<&str> = tokens.iter().map(|t| t.text()).collect();
    assert_eq!(
        values,
        vec!["0xFF", "1.5e3", ".5", "a", "[", "0", "]", ".", "x", "1", "..", "2", "end of file"]
    );
}

#[test]
fn test_comments_are_trivia_and_track_newlines() {
    let (tokens, problems) = scan_all("a /* x\n y */ b // c\n c");
    assert!(problems.is_empty());
    assert_eq!(tokens.len(), 4);
    assert!(!tokens[0].newline_before);
    assert!(tokens[1].newline_before);
    assert!(tokens[2].newline_before);
}

#[test]
fn test_invalid_character() {
    let (tokens, problems) = scan_all("a # b");
    assert_eq!(tokens[1].kind, SyntaxKind::Unknown);
    assert_eq!(problems[0].code, problem_codes::INVALID_CHARACTER);
    assert_eq!(problems[0].message, "Syntax error: invalid character '#'.");
}

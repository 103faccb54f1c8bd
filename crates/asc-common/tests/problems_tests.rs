use super::*;
use std::sync::Arc;

#[test]
fn test_format_message_replaces_numbered_args() {
    assert_eq!(
        format_message("expecting {0} but found '{1}'", &["';'", "}"]),
        "expecting ';' but found '}'"
    );
    assert_eq!(format_message("no args", &["x"]), "no args");
}

#[test]
fn test_problem_uses_message_table() {
    let problem = CompilerProblem::new(
        problem_codes::AMBIGUOUS_REFERENCE,
        "a.as",
        Span::new(4, 7),
        &["C"],
    );
    assert_eq!(problem.message, "Ambiguous reference to C.");
    assert_eq!(problem.length, 3);
    assert!(problem.is_error());

    let warning =
        CompilerProblem::new(problem_codes::UNDEFINED_PROPERTY, "a.as", Span::at(0), &["q"]);
    assert_eq!(warning.severity, ProblemSeverity::Warning);
}

#[test]
fn test_locate_translates_to_physical_file() {
    let mut lookup = OffsetLookup::default();
    let main: Arc<str> = Arc::from("main.as");
    let inc: Arc<str> = Arc::from("inc.as");
    lookup.add_file(main.clone(), Arc::from("0123456789"));
    lookup.add_file(inc.clone(), Arc::from("ab\ncd"));
    lookup.push_region(main.clone(), 0, 4, 0);
    lookup.push_region(inc, 4, 9, 0);
    lookup.push_region(main, 9, 15, 4);

    let problem =
        CompilerProblem::new(problem_codes::SYNTAX_ERROR, "main.as", Span::new(7, 8), &["x"])
            .locate(&lookup);
    assert_eq!(problem.file, "inc.as");
    assert_eq!(problem.start, 3);
    assert_eq!((problem.line, problem.column), (1, 0));
    assert_eq!(problem.to_string(), "inc.as(2,1): error 1000: Syntax error: x.");
}

use super::reporter::Reporter;
use asc_common::problems::problem_codes;
use asc_common::{CompilerProblem, ProblemSeverity, Span};

fn problem(code: u32, args: &[&str]) -> CompilerProblem {
    let mut problem = CompilerProblem::new(code, "src/Main.as", Span::new(4, 8), args);
    problem.line = 2;
    problem.column = 6;
    problem
}

#[test]
fn renders_plain_lines_with_counts() {
    let problems = vec![
        problem(problem_codes::UNRESOLVED_TYPE, &["Missing"]),
        problem(problem_codes::UNDEFINED_PROPERTY, &["x"]),
    ];
    assert_eq!(problems[1].severity, ProblemSeverity::Warning);

    let out = Reporter::new(false).render(&problems);
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].starts_with("src/Main.as(3,7): error 1201: "), "{}", lines[0]);
    assert!(lines[0].contains("Missing"));
    assert!(lines[1].starts_with("src/Main.as(3,7): warning 1203: "), "{}", lines[1]);
    assert_eq!(lines.last().copied(), Some("1 error, 1 warning"));
}

#[test]
fn renders_nothing_without_problems() {
    assert_eq!(Reporter::new(false).render(&[]), "");
}

#[test]
fn json_output_lists_problems() {
    let problems = vec![problem(problem_codes::UNRESOLVED_IMPORT, &["a.B"])];
    let out = Reporter::new(true).render_json(&problems);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["problems"][0]["code"], 1200);
    assert_eq!(value["problems"][0]["severity"], "error");
    assert_eq!(value["problems"][0]["message"], "Definition a.B could not be found.");
}

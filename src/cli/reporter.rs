use colored::Colorize;
use serde_json::json;

use asc_common::{CompilerProblem, ProblemSeverity};

pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn new(color: bool) -> Self {
        Reporter { color }
    }

    /// One line per problem, followed by an error/warning count.
    pub fn render(&self, problems: &[CompilerProblem]) -> String {
        let mut out = String::new();
        for problem in problems {
            out.push_str(&self.format_problem(problem));
            out.push('\n');
        }
        let errors = problems.iter().filter(|p| p.is_error()).count();
        let warnings = problems.len() - errors;
        if !problems.is_empty() {
            out.push_str(&format!(
                "\n{} {}, {} {}\n",
                errors,
                plural(errors, "error"),
                warnings,
                plural(warnings, "warning")
            ));
        }
        out
    }

    pub fn format_problem(&self, problem: &CompilerProblem) -> String {
        let location = format!("{}({},{})", problem.file, problem.line + 1, problem.column + 1);
        let code = problem.code.to_string();
        let severity = match problem.severity {
            ProblemSeverity::Error => "error",
            ProblemSeverity::Warning => "warning",
        };
        if !self.color {
            return format!("{location}: {severity} {code}: {}", problem.message);
        }
        let severity = match problem.severity {
            ProblemSeverity::Error => severity.red().bold(),
            ProblemSeverity::Warning => severity.yellow().bold(),
        };
        format!(
            "{}: {} {}: {}",
            location.cyan(),
            severity,
            code.dimmed(),
            problem.message
        )
    }

    pub fn render_json(&self, problems: &[CompilerProblem]) -> String {
        json!({ "problems": problems }).to_string()
    }
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

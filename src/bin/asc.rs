#![allow(clippy::print_stderr)]

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;

use asc::cli::args::CliArgs;
use asc::cli::driver;
use asc::cli::reporter::Reporter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_ERRORS: i32 = 1;

fn main() -> Result<()> {
    // Installs a subscriber only when ASC_LOG or RUST_LOG is set.
    asc::tracing_config::init_tracing();

    let args = CliArgs::parse();
    let result = driver::compile(&args)?;

    if let Some(ast) = &result.ast {
        println!("{}", serde_json::to_string_pretty(ast)?);
        std::process::exit(EXIT_SUCCESS);
    }

    let pretty = args.pretty.unwrap_or_else(|| std::io::stdout().is_terminal());
    let reporter = Reporter::new(pretty && !args.json);
    if args.json {
        println!("{}", reporter.render_json(&result.problems));
    } else {
        print!("{}", reporter.render(&result.problems));
    }

    if result.has_errors() {
        std::process::exit(EXIT_ERRORS);
    }
    std::process::exit(EXIT_SUCCESS);
}

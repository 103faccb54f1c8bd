use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use asc_binder::DefinitionOrigin;
use asc_common::CompilerProblem;
use asc_units::{Project, ProjectConfig, Workspace};

use crate::cli::args::CliArgs;

#[derive(Debug, Default)]
pub struct CompilationResult {
    pub problems: Vec<CompilerProblem>,
    /// Script names of the built units, bases first.
    pub scripts: Vec<String>,
    /// Per-file syntax trees when `--dump-ast` was given.
    pub ast: Option<Value>,
}

impl CompilationResult {
    pub fn has_errors(&self) -> bool {
        self.problems.iter().any(CompilerProblem::is_error)
    }
}

/// The configuration file, if any, with command-line flags applied on top.
pub fn resolve_config(args: &CliArgs) -> Result<ProjectConfig> {
    let mut config = match &args.config {
        Some(path) => ProjectConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => ProjectConfig::default(),
    };
    if let Some(flavor) = args.flavor {
        config.flavor = flavor.into();
    }
    if args.no_defer {
        config.defer_function_bodies = false;
    }
    if args.strict {
        config.strict = true;
    }
    if args.sequential {
        config.parallel = false;
    }
    config.source_path.extend(args.source_path.iter().cloned());
    config.source_files.extend(args.files.iter().cloned());
    config.library_files.extend(args.library.iter().cloned());
    Ok(config)
}

pub fn compile(args: &CliArgs) -> Result<CompilationResult> {
    let config = resolve_config(args)?;
    let project = Project::new(config, Arc::new(Workspace::new()));
    let units = project.load_sources().context("failed to collect source files")?;

    if args.dump_ast {
        let mut files = Vec::new();
        for unit in units
            .iter()
            .filter(|u| u.priority().origin != DefinitionOrigin::Library)
        {
            let tree = unit
                .ast()
                .with_context(|| format!("failed to parse {}", unit.path()))?;
            files.push(tree.to_json(true));
        }
        return Ok(CompilationResult {
            ast: Some(json!(files)),
            ..CompilationResult::default()
        });
    }

    let output = project.build_all().context("build did not finish")?;
    info!(
        units = output.order.len(),
        problems = output.problems.len(),
        "compiled"
    );
    Ok(CompilationResult {
        scripts: output.tags.iter().map(|t| t.tag_name.to_string()).collect(),
        problems: output.problems,
        ast: None,
    })
}

//! Project configuration, read from JSON.

use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Compiler flavor. Only `Royale` applies the `[Bindable]` rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    #[default]
    Royale,
    Flash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfig {
    pub flavor: Flavor,
    pub defer_function_bodies: bool,
    /// Source roots; a unit found there is expected to define the qname
    /// spelled by its relative path.
    pub source_path: Vec<PathBuf>,
    pub source_files: Vec<PathBuf>,
    pub library_files: Vec<PathBuf>,
    /// Report unresolved identifiers in function bodies.
    pub strict: bool,
    pub parallel: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        ProjectConfig {
            flavor: Flavor::default(),
            defer_function_bodies: true,
            source_path: Vec::new(),
            source_files: Vec::new(),
            library_files: Vec::new(),
            strict: false,
            parallel: true,
        }
    }
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<ProjectConfig, CompileError> {
        let text = std::fs::read_to_string(path).map_err(|err| CompileError::io(path.display().to_string(), err))?;
        ProjectConfig::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<ProjectConfig, CompileError> {
        serde_json::from_str(text).map_err(|err| CompileError::Config(err.to_string()))
    }
}

#[cfg(test)]
#[path = "../tests/config_tests.rs"]
mod config_tests;

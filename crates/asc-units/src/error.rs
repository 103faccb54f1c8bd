//! Exceptional failures of the compilation pipeline.
//!
//! Syntax and resolution problems are not errors: they are `CompilerProblem`
//! values carried on request results. `CompileError` covers what stops a
//! request from producing a result at all.

use std::io;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// The build was cancelled while the request was running or waited on.
    #[error("request cancelled")]
    Cancelled,

    /// A request handler panicked or failed. Every waiter sees the same error.
    #[error("internal error in {unit}: {message}")]
    Internal { unit: String, message: String },

    /// A syntax-tree result was asked for its tree after both the tree and
    /// its compilation unit were dropped.
    #[error("syntax tree result outlived its compilation unit")]
    OrphanedResult,

    /// A unit outlived the project that owns it.
    #[error("project was dropped")]
    ProjectDropped,

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CompileError {
    pub fn io(path: impl Into<String>, source: io::Error) -> CompileError {
        CompileError::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompileError::Cancelled)
    }
}

pub type CompileResult<T> = Result<Arc<T>, CompileError>;

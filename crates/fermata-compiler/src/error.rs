use std::process::ExitStatus;

use thiserror::Error;

use crate::diagnostics::{render, Diagnostic};

/// Errors from the translate and build stages.
#[derive(Debug, Error)]
pub enum CompilerError {
    /// The external translator exited nonzero. Carries everything it wrote
    /// to its error stream.
    #[error("faust translation failed ({status}):\n{stderr}")]
    ExternalTool { status: ExitStatus, stderr: String },

    /// The translated source did not compile. Carries the full structured
    /// diagnostic list so callers can filter or display selectively.
    #[error("module compilation failed:\n{}", render(.0))]
    Compilation(Vec<Diagnostic>),

    /// The contract rlib the dynamic build links against could not be found.
    #[error("contract reference set unavailable: {0}")]
    MissingReference(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompilerError {
    /// Structured diagnostics, when this is a compilation failure.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompilerError::Compilation(diagnostics) => diagnostics,
            _ => &[],
        }
    }
}

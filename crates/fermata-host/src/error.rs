use fermata_compiler::{CompilerError, Diagnostic};
use fermata_dsp::AbiMismatch;
use thiserror::Error;

/// Errors from the load sequence (translate, build, load, instantiate).
///
/// Every variant is a synchronous return-path error on the control path; a
/// failed load never disturbs whatever module is currently active. Runtime
/// faults inside `compute` are not represented here — they are caught at the
/// real-time boundary and degrade the instance to passthrough.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Translation or compilation failed; see [`CompilerError`] for the
    /// split between external-tool failures and structured diagnostics.
    #[error(transparent)]
    Compiler(#[from] CompilerError),

    /// The compiled module exposes no entry point. Carries the type names
    /// the unit declared plus its compile warnings, which is usually enough
    /// to spot a translator/contract mismatch.
    #[error(
        "module exposes no `{symbol}` entry point; unit declared types: [{}]",
        .exported_types.join(", ")
    )]
    EntryPointNotFound {
        symbol: &'static str,
        exported_types: Vec<String>,
        warnings: Vec<Diagnostic>,
    },

    /// The entry type's constructor panicked.
    #[error("entry type `{type_name}` failed to construct")]
    Instantiation { type_name: String },

    /// The module was built against a different contract revision.
    #[error(transparent)]
    Abi(#[from] AbiMismatch),

    /// The dynamic library itself refused to load.
    #[error("failed to load module library: {0}")]
    Library(#[from] libloading::Error),

    /// A reload was requested before any source had ever been loaded.
    #[error("no DSP source has been loaded yet")]
    NoSourceLoaded,
}

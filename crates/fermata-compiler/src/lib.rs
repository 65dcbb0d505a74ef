//! Source-to-binary pipeline for Fermata.
//!
//! Two stages, kept deliberately separate so each is testable on its own:
//!
//! 1. [`FaustTranslator`] runs the external `faust` tool and captures the
//!    generated Rust source text.
//! 2. [`ModuleBuilder`] wraps that text in the contract architecture and
//!    compiles it with `rustc` into a loadable cdylib.
//!
//! Neither stage loads anything into the process; loading lives in
//! `fermata-host` so compilation stays free of process-wide side effects.

mod builder;
mod diagnostics;
mod error;
mod reference;
mod translate;

pub use builder::{Architecture, CompiledModule, ModuleBuilder, ModuleId};
pub use diagnostics::{Diagnostic, Level, SourceSpan};
pub use error::CompilerError;
pub use reference::ReferenceSet;
pub use translate::{FaustTranslator, Precision, TranslationOutput, TranslatorConfig};

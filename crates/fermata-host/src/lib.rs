//! Fermata plugin host
//! ===================
//!
//! Takes the binaries produced by `fermata-compiler`, loads each into its own
//! unloadable dynamic-library context, and hands the instantiated module to a
//! real-time block processor that can swap modules between blocks without the
//! audio path ever blocking, allocating, or observing a half-constructed
//! module.
//!
//! The host is split the way the engine splits its mixer: a control-path
//! [`HostController`] that may block (it runs the translator and rustc), and
//! an [`RtProcessor`] owning the active module, connected by lock-free
//! channels. [`FaustHost`] bundles the two for single-threaded embedders and
//! splits apart for threaded ones.

mod error;
mod handle;
mod host;
mod loader;
mod rt;

pub use error::LoadError;
pub use handle::ModuleHandle;
pub use host::{FaustHost, HostConfig, HostController, LoadReport};
pub use loader::load_compiled;
pub use rt::RtProcessor;

pub use fermata_compiler::{
    Architecture, CompiledModule, CompilerError, Diagnostic, FaustTranslator, Level, ModuleBuilder,
    ModuleId, Precision, ReferenceSet, SourceSpan, TranslatorConfig,
};
pub use fermata_dsp::{
    BlockBuffers, ControlKind, DspModule, Orientation, ParamSlot, UiBuilder, UiControl, UiElement,
    UiGroup, UiTreeBuilder,
};

//! Fermata DSP contract
//! ====================
//!
//! This crate defines everything a dynamically compiled DSP module and the
//! Fermata host have to agree on: the [`DspModule`] trait, the exported entry
//! point, the block buffer layout, parameter storage, and the UI-definition
//! tree. Generated modules are compiled against this crate's rlib and loaded
//! into the host process as cdylibs, so the crate deliberately has no
//! dependencies of its own.

mod buffers;
mod params;
mod ui;

pub use buffers::BlockBuffers;
pub use params::ParamSlot;
pub use ui::{ControlKind, Orientation, UiBuilder, UiControl, UiElement, UiGroup, UiTreeBuilder};

/// Name of the symbol every generated module exports.
pub const ENTRY_SYMBOL: &str = "fermata_dsp_entrypoint";

/// Version of the host/module contract. Bumped whenever the shape of
/// [`DspExport`] or any trait object crossing the boundary changes.
pub const ABI_VERSION: u32 = 1;

/// Signature of the exported entry point.
pub type DspEntry = unsafe extern "C" fn() -> DspExport;

/// A live DSP processor. Implemented by the well-known entry type of every
/// generated module (conventionally named `mydsp` by the translator).
pub trait DspModule: Send {
    /// Prepare internal state for the given sample rate. Called before the
    /// first block and again whenever the host renegotiates the rate.
    fn init(&mut self, sample_rate: i32);

    fn num_inputs(&self) -> usize;

    fn num_outputs(&self) -> usize;

    /// Process one block of `frames` samples. Inputs are read from and
    /// outputs written to the channel planes of `io`; `frames` never exceeds
    /// the negotiated maximum the planes were sized for.
    fn compute(&mut self, frames: usize, io: &mut BlockBuffers);

    /// Declare the module's control surface to `ui`.
    fn build_user_interface(&self, ui: &mut dyn UiBuilder);

    /// Restore every UI-bound parameter to its declared default.
    fn reset_ui_state(&mut self) {}
}

/// Creates instances of a module's entry type.
pub trait DspFactory: Send {
    fn create(&self) -> Box<dyn DspModule>;

    /// Name of the entry type this factory instantiates, for diagnostics.
    fn type_name(&self) -> &str;
}

impl std::fmt::Debug for dyn DspFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DspFactory")
            .field("type_name", &self.type_name())
            .finish()
    }
}

/// Value returned through the exported entry point.
pub struct DspExport {
    abi_version: u32,
    factory: Box<dyn DspFactory>,
}

impl DspExport {
    pub fn new(factory: Box<dyn DspFactory>) -> Self {
        Self {
            abi_version: ABI_VERSION,
            factory,
        }
    }

    pub fn abi_version(&self) -> u32 {
        self.abi_version
    }
}

/// ABI version disagreement between a loaded module and the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiMismatch {
    pub module: u32,
    pub host: u32,
}

impl std::fmt::Display for AbiMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "module was built against contract ABI v{}, host expects v{}",
            self.module, self.host
        )
    }
}

impl std::error::Error for AbiMismatch {}

/// Unwrap the factory from an export, rejecting modules built against a
/// different contract revision.
pub fn take_factory(export: DspExport) -> Result<Box<dyn DspFactory>, AbiMismatch> {
    if export.abi_version != ABI_VERSION {
        return Err(AbiMismatch {
            module: export.abi_version,
            host: ABI_VERSION,
        });
    }
    Ok(export.factory)
}

/// Declare the entry point of a dynamic Fermata module.
///
/// The type must implement [`DspModule`] and [`Default`] (the host
/// instantiates it through its no-argument constructor).
///
/// ```ignore
/// fermata_dsp::declare_fermata_dsp!(mydsp);
/// ```
#[macro_export]
macro_rules! declare_fermata_dsp {
    ($ty:ty) => {
        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn fermata_dsp_entrypoint() -> $crate::DspExport {
            struct EntryFactory;

            impl $crate::DspFactory for EntryFactory {
                fn create(&self) -> Box<dyn $crate::DspModule> {
                    Box::new(<$ty as Default>::default())
                }

                fn type_name(&self) -> &str {
                    stringify!($ty)
                }
            }

            $crate::DspExport::new(Box::new(EntryFactory))
        }
    };
}

/// Common imports for module authors and for the builder's architecture
/// wrapper around translated sources.
pub mod prelude {
    pub use crate::{BlockBuffers, DspFactory, DspModule, ParamSlot, UiBuilder};
}

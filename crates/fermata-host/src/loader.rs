use std::panic::{self, AssertUnwindSafe};

use fermata_compiler::CompiledModule;
use fermata_dsp::{take_factory, DspEntry, ENTRY_SYMBOL};
use libloading::Library;

use crate::error::LoadError;
use crate::handle::ModuleHandle;

/// Load a compiled module into its own dynamic-library context and
/// instantiate its entry type.
///
/// Every binary gets a fresh `Library`, never a shared or process-wide one;
/// dropping the returned handle is what makes the context reclaimable. The
/// entry point is the single fixed symbol of the contract, so candidate
/// resolution is deterministic by construction.
pub fn load_compiled(
    compiled: CompiledModule,
    max_frames: usize,
) -> Result<ModuleHandle, LoadError> {
    let (artifact, unit, exported_types, warnings, build_dir) = compiled.into_parts();

    let library = unsafe { Library::new(&artifact)? };

    let export = {
        let entry = match unsafe { library.get::<DspEntry>(ENTRY_SYMBOL.as_bytes()) } {
            Ok(entry) => entry,
            Err(_) => {
                return Err(LoadError::EntryPointNotFound {
                    symbol: ENTRY_SYMBOL,
                    exported_types,
                    warnings,
                })
            }
        };
        unsafe { entry() }
    };

    let factory = take_factory(export)?;
    let type_name = factory.type_name().to_owned();

    // A throwing constructor is a distinct failure from a missing entry
    // point; the panic must not escape the load path.
    let dsp = panic::catch_unwind(AssertUnwindSafe(|| factory.create()))
        .map_err(|_| LoadError::Instantiation {
            type_name: type_name.clone(),
        })?;

    log::info!(
        "loaded unit {unit} (entry type `{type_name}`, {} in / {} out)",
        dsp.num_inputs(),
        dsp.num_outputs()
    );

    Ok(ModuleHandle::from_loaded(
        dsp, unit, library, build_dir, max_frames,
    ))
}

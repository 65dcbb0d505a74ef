use fermata_compiler::ModuleId;
use fermata_dsp::{BlockBuffers, DspModule};
use libloading::Library;
use tempfile::TempDir;

/// The live, owning reference to one instantiated module.
///
/// Owns the instance, its channel planes, and the dynamic-library context it
/// was loaded from. Declaration order is load-bearing: the instance must drop
/// before its library unloads, and the library before the build tree holding
/// the artifact is removed.
pub struct ModuleHandle {
    pub(crate) dsp: Box<dyn DspModule>,
    pub(crate) buffers: BlockBuffers,
    unit: Option<ModuleId>,
    pub(crate) faulted: bool,
    library: Option<Library>,
    _build_dir: Option<TempDir>,
}

impl ModuleHandle {
    pub(crate) fn from_loaded(
        dsp: Box<dyn DspModule>,
        unit: ModuleId,
        library: Library,
        build_dir: TempDir,
        max_frames: usize,
    ) -> Self {
        let buffers = BlockBuffers::new(dsp.num_inputs(), dsp.num_outputs(), max_frames);
        Self {
            dsp,
            buffers,
            unit: Some(unit),
            faulted: false,
            library: Some(library),
            _build_dir: Some(build_dir),
        }
    }

    /// Wrap an in-process module (statically linked, no library context).
    pub fn native(dsp: Box<dyn DspModule>, max_frames: usize) -> Self {
        let buffers = BlockBuffers::new(dsp.num_inputs(), dsp.num_outputs(), max_frames);
        Self {
            dsp,
            buffers,
            unit: None,
            faulted: false,
            library: None,
            _build_dir: None,
        }
    }

    /// Build identity, when the module came out of the dynamic pipeline.
    pub fn unit(&self) -> Option<ModuleId> {
        self.unit
    }

    pub fn num_inputs(&self) -> usize {
        self.buffers.num_inputs()
    }

    pub fn num_outputs(&self) -> usize {
        self.buffers.num_outputs()
    }

    /// True once a compute call has misbehaved; the host passes through
    /// instead of calling into a faulted instance.
    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    pub(crate) fn is_dynamic(&self) -> bool {
        self.library.is_some()
    }

    /// Split borrows for the compute call.
    pub(crate) fn dsp_and_buffers(&mut self) -> (&mut dyn DspModule, &mut BlockBuffers) {
        (self.dsp.as_mut(), &mut self.buffers)
    }
}

impl std::fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("unit", &self.unit)
            .field("inputs", &self.num_inputs())
            .field("outputs", &self.num_outputs())
            .field("faulted", &self.faulted)
            .field("dynamic", &self.is_dynamic())
            .finish()
    }
}

use std::path::{Path, PathBuf};

use crossbeam_channel::{Receiver, Sender};
use fermata_compiler::{
    Diagnostic, FaustTranslator, ModuleBuilder, ModuleId, ReferenceSet, TranslatorConfig,
};
use fermata_dsp::{DspModule, UiElement, UiTreeBuilder};
use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::handle::ModuleHandle;
use crate::loader;
use crate::rt::{RtCommand, RtProcessor};

/// Host-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub translator: TranslatorConfig,
    /// Initial maximum block length, in frames, until the embedder
    /// renegotiates.
    pub max_block_size: usize,
    /// Initial sample rate until the embedder announces one.
    pub sample_rate: f64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            translator: TranslatorConfig::default(),
            max_block_size: 512,
            sample_rate: 44_100.0,
        }
    }
}

/// What a successful load handed over to the rest of the application.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Build identity; `None` for natively installed modules.
    pub unit: Option<ModuleId>,
    pub inputs: usize,
    pub outputs: usize,
    /// Root of the module's UI-definition tree, rebuilt on every load.
    pub ui_root: UiElement,
    pub warnings: Vec<Diagnostic>,
}

/// The control-path half of the host.
///
/// Runs the translate→build→load sequence (blocking is fine here, this is
/// never the audio thread), installs new handles through the command channel,
/// and tears down superseded handles the audio path has shipped back.
pub struct HostController {
    translator: FaustTranslator,
    builder: ModuleBuilder,
    sample_rate: f64,
    max_frames: usize,
    source_path: Option<PathBuf>,
    ui_root: Option<UiElement>,
    commands: Sender<RtCommand>,
    retired: Receiver<ModuleHandle>,
}

impl HostController {
    /// Translate, build, load, and install the module at `path`.
    ///
    /// Any failure is returned to the caller and leaves whatever module is
    /// currently active untouched; a failed reload never regresses the last
    /// good state.
    pub fn request_load(&mut self, path: &Path) -> Result<LoadReport, LoadError> {
        self.reap_retired();

        let translated = self.translator.translate(path)?;
        let compiled = self.builder.build(&translated.code)?;
        let warnings = compiled.warnings().to_vec();
        let handle = loader::load_compiled(compiled, self.max_frames)?;

        let report = self.install(handle, warnings);
        self.source_path = Some(path.to_path_buf());
        log::info!("activated {} from {}", report_unit(&report), path.display());
        Ok(report)
    }

    /// Re-run the full load sequence on the last loaded source path.
    pub fn request_reload(&mut self) -> Result<LoadReport, LoadError> {
        let path = self.source_path.clone().ok_or(LoadError::NoSourceLoaded)?;
        self.request_load(&path)
    }

    /// Install an in-process module through the same swap path the dynamic
    /// pipeline uses.
    pub fn install_module(&mut self, dsp: Box<dyn DspModule>) -> LoadReport {
        self.reap_retired();
        let handle = ModuleHandle::native(dsp, self.max_frames);
        let report = self.install(handle, Vec::new());
        self.source_path = None;
        report
    }

    fn install(&mut self, mut handle: ModuleHandle, warnings: Vec<Diagnostic>) -> LoadReport {
        handle.dsp.reset_ui_state();
        handle.dsp.init(self.sample_rate as i32);

        let mut ui = UiTreeBuilder::new();
        handle.dsp.build_user_interface(&mut ui);
        let ui_root = ui.finish();

        let report = LoadReport {
            unit: handle.unit(),
            inputs: handle.num_inputs(),
            outputs: handle.num_outputs(),
            ui_root: ui_root.clone(),
            warnings,
        };
        self.ui_root = Some(ui_root);

        // The handle is complete at this point; the audio path either keeps
        // the old module for a block or picks this one up whole.
        let _ = self.commands.send(RtCommand::Install(handle));
        report
    }

    /// Announce a renegotiated maximum block length.
    pub fn on_block_size_negotiated(&mut self, max_frames: usize) {
        self.max_frames = max_frames;
        let _ = self.commands.send(RtCommand::SetMaxFrames(max_frames));
    }

    /// Announce a sample-rate change; the active module is reinitialized
    /// before its next block.
    pub fn on_sample_rate_changed(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        let _ = self.commands.send(RtCommand::SetSampleRate(sample_rate));
    }

    /// Drop handles the audio path has retired. Returns how many were torn
    /// down.
    pub fn reap_retired(&mut self) -> usize {
        let mut reaped = 0;
        while let Ok(handle) = self.retired.try_recv() {
            log::debug!("tearing down retired module {:?}", handle.unit());
            drop(handle);
            reaped += 1;
        }
        reaped
    }

    /// UI-definition tree of the most recently installed module.
    pub fn ui_root(&self) -> Option<&UiElement> {
        self.ui_root.as_ref()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

fn report_unit(report: &LoadReport) -> String {
    match report.unit {
        Some(unit) => unit.to_string(),
        None => "native module".to_owned(),
    }
}

/// Control and audio halves bundled for single-threaded embedders.
pub struct FaustHost {
    controller: HostController,
    rt: RtProcessor,
}

impl FaustHost {
    /// Build a host, locating the contract reference set from the running
    /// process's build tree.
    pub fn new(config: HostConfig) -> Result<Self, LoadError> {
        let references = ReferenceSet::discover().map_err(LoadError::Compiler)?;
        Ok(Self::with_references(config, references))
    }

    pub fn with_references(config: HostConfig, references: ReferenceSet) -> Self {
        let (commands_tx, commands_rx) = crossbeam_channel::unbounded();
        let (retired_tx, retired_rx) = crossbeam_channel::unbounded();
        let controller = HostController {
            translator: FaustTranslator::new(config.translator),
            builder: ModuleBuilder::new(references),
            sample_rate: config.sample_rate,
            max_frames: config.max_block_size,
            source_path: None,
            ui_root: None,
            commands: commands_tx,
            retired: retired_rx,
        };
        let rt = RtProcessor::new(
            commands_rx,
            retired_tx,
            config.sample_rate,
            config.max_block_size,
        );
        Self { controller, rt }
    }

    /// Separate the halves so the audio path can move to its own thread.
    pub fn split(self) -> (HostController, RtProcessor) {
        (self.controller, self.rt)
    }

    pub fn controller(&mut self) -> &mut HostController {
        &mut self.controller
    }

    pub fn request_load(&mut self, path: &Path) -> Result<LoadReport, LoadError> {
        self.controller.request_load(path)
    }

    pub fn request_reload(&mut self) -> Result<LoadReport, LoadError> {
        self.controller.request_reload()
    }

    pub fn install_module(&mut self, dsp: Box<dyn DspModule>) -> LoadReport {
        self.controller.install_module(dsp)
    }

    pub fn on_block_size_negotiated(&mut self, max_frames: usize) {
        self.controller.on_block_size_negotiated(max_frames);
    }

    pub fn on_sample_rate_changed(&mut self, sample_rate: f64) {
        self.controller.on_sample_rate_changed(sample_rate);
    }

    pub fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]], frames: usize) {
        self.rt.process_block(inputs, outputs, frames);
    }

    pub fn ui_root(&self) -> Option<&UiElement> {
        self.controller.ui_root()
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.controller.source_path()
    }
}

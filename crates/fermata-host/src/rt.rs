use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::{Receiver, Sender};

use crate::handle::ModuleHandle;

/// Commands the control path hands to the audio path. A handle inside
/// `Install` is always fully constructed and initialized before it is sent,
/// so the swap is all-or-nothing from the audio path's point of view.
pub(crate) enum RtCommand {
    Install(ModuleHandle),
    SetSampleRate(f64),
    SetMaxFrames(usize),
}

/// The audio-path half of the host.
///
/// Owns zero or one active [`ModuleHandle`]. Each block: drain pending
/// commands (`try_recv` only, never blocking), then either run the module
/// over the channel planes or pass input straight through. Superseded
/// handles are shipped back to the control path for teardown; nothing is
/// ever dropped on the audio thread.
pub struct RtProcessor {
    active: Option<ModuleHandle>,
    commands: Receiver<RtCommand>,
    retired: Sender<ModuleHandle>,
    sample_rate: f64,
    max_frames: usize,
}

impl RtProcessor {
    pub(crate) fn new(
        commands: Receiver<RtCommand>,
        retired: Sender<ModuleHandle>,
        sample_rate: f64,
        max_frames: usize,
    ) -> Self {
        Self {
            active: None,
            commands,
            retired,
            sample_rate,
            max_frames,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.active.is_some()
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                RtCommand::Install(handle) => {
                    if let Some(old) = self.active.replace(handle) {
                        // Defer teardown to the control path.
                        let _ = self.retired.send(old);
                    }
                }
                RtCommand::SetSampleRate(rate) => {
                    self.sample_rate = rate;
                    if let Some(handle) = &mut self.active {
                        handle.dsp.init(rate as i32);
                    }
                }
                RtCommand::SetMaxFrames(frames) => {
                    self.max_frames = frames;
                    if let Some(handle) = &mut self.active {
                        handle.buffers.set_max_frames(frames);
                    }
                }
            }
        }
    }

    /// Process one block. `frames` must not exceed the negotiated maximum.
    ///
    /// With no module active (or a faulted one), input is copied to output
    /// bit-identically. With a module active, host inputs are multiplexed
    /// into the module planes, the module computes, and module outputs are
    /// copied back with wrap-around duplication when the host has more
    /// output channels than the module.
    pub fn process_block(&mut self, inputs: &[&[f64]], outputs: &mut [&mut [f64]], frames: usize) {
        self.drain_commands();
        debug_assert!(frames <= self.max_frames);

        let Some(handle) = &mut self.active else {
            passthrough(inputs, outputs, frames);
            return;
        };
        if handle.faulted {
            passthrough(inputs, outputs, frames);
            return;
        }

        let module_inputs = handle.num_inputs();
        let module_outputs = handle.num_outputs();

        for channel in 0..module_inputs {
            let plane = &mut handle.buffers.input_mut(channel)[..frames];
            match inputs.get(channel) {
                Some(input) => plane.copy_from_slice(&input[..frames]),
                None => plane.fill(0.0),
            }
        }

        let (dsp, buffers) = handle.dsp_and_buffers();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| dsp.compute(frames, buffers)));
        if outcome.is_err() {
            // Translator or module bug, not a recoverable runtime event.
            // Degrade this instance to passthrough until the next load.
            log::error!(
                "module {:?} panicked in compute; passing through until reloaded",
                handle.unit()
            );
            handle.faulted = true;
            passthrough(inputs, outputs, frames);
            return;
        }

        if module_outputs == 0 {
            for output in outputs.iter_mut() {
                output[..frames].fill(0.0);
            }
            return;
        }
        for (channel, output) in outputs.iter_mut().enumerate() {
            let plane = handle.buffers.output(channel % module_outputs);
            output[..frames].copy_from_slice(&plane[..frames]);
        }
    }
}

fn passthrough(inputs: &[&[f64]], outputs: &mut [&mut [f64]], frames: usize) {
    if inputs.is_empty() {
        for output in outputs.iter_mut() {
            output[..frames].fill(0.0);
        }
        return;
    }
    for (channel, output) in outputs.iter_mut().enumerate() {
        output[..frames].copy_from_slice(&inputs[channel % inputs.len()][..frames]);
    }
}

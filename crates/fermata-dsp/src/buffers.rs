/// Channel-major sample planes shared between the host and a module.
///
/// One plane per input and output channel, each sized to the negotiated
/// maximum block length. The planes are allocated when the host announces a
/// block size and are only ever resized on renegotiation, so steady-state
/// block processing touches no allocator.
#[derive(Clone, Debug)]
pub struct BlockBuffers {
    inputs: Vec<Vec<f64>>,
    outputs: Vec<Vec<f64>>,
    max_frames: usize,
}

impl BlockBuffers {
    pub fn new(inputs: usize, outputs: usize, max_frames: usize) -> Self {
        Self {
            inputs: vec![vec![0.0; max_frames]; inputs],
            outputs: vec![vec![0.0; max_frames]; outputs],
            max_frames,
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    pub fn num_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Resize every plane for a renegotiated maximum block length.
    pub fn set_max_frames(&mut self, max_frames: usize) {
        for plane in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            plane.resize(max_frames, 0.0);
        }
        self.max_frames = max_frames;
    }

    pub fn input(&self, channel: usize) -> &[f64] {
        &self.inputs[channel]
    }

    pub fn input_mut(&mut self, channel: usize) -> &mut [f64] {
        &mut self.inputs[channel]
    }

    pub fn output(&self, channel: usize) -> &[f64] {
        &self.outputs[channel]
    }

    pub fn output_mut(&mut self, channel: usize) -> &mut [f64] {
        &mut self.outputs[channel]
    }

    /// Borrow the input and output planes simultaneously, the shape
    /// `DspModule::compute` implementations want.
    pub fn split(&mut self) -> (&[Vec<f64>], &mut [Vec<f64>]) {
        (&self.inputs, &mut self.outputs)
    }

    pub fn clear(&mut self) {
        for plane in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            plane.fill(0.0);
        }
    }
}

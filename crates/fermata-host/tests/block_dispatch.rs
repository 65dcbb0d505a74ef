//! Block dispatch, channel multiplexing, and swap behavior, exercised with
//! in-process modules so no toolchain is involved.

use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

use fermata_host::{
    BlockBuffers, ControlKind, DspModule, FaustHost, HostConfig, ParamSlot, UiBuilder, UiControl,
    UiElement,
};

fn host() -> FaustHost {
    FaustHost::new(HostConfig::default()).expect("host")
}

/// 1-in/1-out module scaling input by a UI-bound level parameter.
struct Gain {
    level: ParamSlot,
}

impl Gain {
    fn new(level: f64) -> Self {
        Self {
            level: ParamSlot::new(level),
        }
    }
}

impl DspModule for Gain {
    fn init(&mut self, _sample_rate: i32) {}
    fn num_inputs(&self) -> usize {
        1
    }
    fn num_outputs(&self) -> usize {
        1
    }
    fn compute(&mut self, frames: usize, io: &mut BlockBuffers) {
        let level = self.level.get();
        let (inputs, outputs) = io.split();
        for (out, sample) in outputs[0][..frames].iter_mut().zip(&inputs[0][..frames]) {
            *out = sample * level;
        }
    }
    fn build_user_interface(&self, ui: &mut dyn UiBuilder) {
        ui.open_vertical_group("gain");
        ui.declare("unit", "x");
        ui.add_slider("level", &self.level, 1.0, 0.0, 2.0, 0.01);
        ui.close_group();
    }
    fn reset_ui_state(&mut self) {
        self.level.set(1.0);
    }
}

struct PanicOnCompute;

impl DspModule for PanicOnCompute {
    fn init(&mut self, _sample_rate: i32) {}
    fn num_inputs(&self) -> usize {
        1
    }
    fn num_outputs(&self) -> usize {
        1
    }
    fn compute(&mut self, _frames: usize, _io: &mut BlockBuffers) {
        panic!("deliberate compute fault");
    }
    fn build_user_interface(&self, _ui: &mut dyn UiBuilder) {}
}

struct InitProbe {
    calls: Arc<AtomicUsize>,
    last_rate: Arc<AtomicI32>,
}

impl DspModule for InitProbe {
    fn init(&mut self, sample_rate: i32) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_rate.store(sample_rate, Ordering::SeqCst);
    }
    fn num_inputs(&self) -> usize {
        1
    }
    fn num_outputs(&self) -> usize {
        1
    }
    fn compute(&mut self, frames: usize, io: &mut BlockBuffers) {
        let (inputs, outputs) = io.split();
        outputs[0][..frames].copy_from_slice(&inputs[0][..frames]);
    }
    fn build_user_interface(&self, _ui: &mut dyn UiBuilder) {}
}

fn find_control(element: &UiElement, label: &str) -> Option<UiControl> {
    match element {
        UiElement::Control(control) if control.label == label => Some(control.clone()),
        UiElement::Control(_) => None,
        UiElement::Group(group) => group
            .children
            .iter()
            .find_map(|child| find_control(child, label)),
    }
}

#[test]
fn unloaded_host_passes_input_through_bit_exactly() {
    let mut host = host();
    let left: Vec<f64> = (0..64).map(|i| (i as f64) * 0.013 - 0.4).collect();
    let right: Vec<f64> = (0..64).map(|i| -(i as f64) * 1e-17).collect();
    let mut out_left = vec![9.0; 64];
    let mut out_right = vec![9.0; 64];

    host.process_block(
        &[&left[..], &right[..]],
        &mut [&mut out_left[..], &mut out_right[..]],
        64,
    );

    assert_eq!(out_left, left);
    assert_eq!(out_right, right);
}

#[test]
fn mono_module_output_wraps_onto_stereo_host_output() {
    let mut host = host();
    host.install_module(Box::new(Gain::new(0.5)));

    let input: Vec<f64> = (0..32).map(|i| i as f64).collect();
    let spare: Vec<f64> = vec![7.0; 32];
    let mut out_a = vec![0.0; 32];
    let mut out_b = vec![0.0; 32];

    // Second host input exceeds the module's input count and is ignored.
    host.process_block(
        &[&input[..], &spare[..]],
        &mut [&mut out_a[..], &mut out_b[..]],
        32,
    );

    let expected: Vec<f64> = input.iter().map(|s| s * 1.0).collect();
    assert_eq!(out_a, expected, "reset_ui_state restores unity gain");
    assert_eq!(out_a, out_b, "channel 1 duplicates module channel 0");
}

#[test]
fn compute_fault_degrades_to_passthrough_until_next_install() {
    let mut host = host();
    host.install_module(Box::new(PanicOnCompute));

    let input: Vec<f64> = (0..16).map(|i| 0.25 * i as f64).collect();
    let mut output = vec![0.0; 16];

    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    host.process_block(&[&input[..]], &mut [&mut output[..]], 16);
    std::panic::set_hook(prev_hook);
    assert_eq!(output, input, "faulting block falls back to passthrough");

    output.fill(0.0);
    host.process_block(&[&input[..]], &mut [&mut output[..]], 16);
    assert_eq!(output, input, "instance stays degraded");

    // A fresh install clears the degradation.
    let report = host.install_module(Box::new(Gain::new(1.0)));
    let level = find_control(&report.ui_root, "level").expect("level control");
    level.set_value(2.0);
    host.process_block(&[&input[..]], &mut [&mut output[..]], 16);
    let doubled: Vec<f64> = input.iter().map(|s| s * 2.0).collect();
    assert_eq!(output, doubled);
}

#[test]
fn sample_rate_change_reinitializes_active_module() {
    let calls = Arc::new(AtomicUsize::new(0));
    let last_rate = Arc::new(AtomicI32::new(0));
    let mut host = host();
    host.install_module(Box::new(InitProbe {
        calls: calls.clone(),
        last_rate: last_rate.clone(),
    }));
    assert_eq!(calls.load(Ordering::SeqCst), 1, "init on install");
    assert_eq!(last_rate.load(Ordering::SeqCst), 44_100);

    host.on_sample_rate_changed(48_000.0);
    let input = vec![0.0; 8];
    let mut output = vec![0.0; 8];
    host.process_block(&[&input[..]], &mut [&mut output[..]], 8);

    assert_eq!(calls.load(Ordering::SeqCst), 2, "reinit before next block");
    assert_eq!(last_rate.load(Ordering::SeqCst), 48_000);
}

#[test]
fn ui_tree_shares_live_parameter_storage() {
    let mut host = host();
    let report = host.install_module(Box::new(Gain::new(1.0)));
    assert_eq!((report.inputs, report.outputs), (1, 1));

    let level = find_control(&report.ui_root, "level").expect("level control");
    assert_eq!(level.kind, ControlKind::Slider);
    assert_eq!(level.metadata("unit"), Some("x"));

    // Move the control through the normalized accessor; range is [0, 2].
    level.set_normalized(0.25);
    assert!((level.value() - 0.5).abs() < 1e-12);
    assert!((level.normalized() - 0.25).abs() < 1e-12);

    let input = vec![1.0; 8];
    let mut output = vec![0.0; 8];
    host.process_block(&[&input[..]], &mut [&mut output[..]], 8);
    assert!(output.iter().all(|s| (*s - 0.5).abs() < 1e-12));
}

#[test]
fn block_size_renegotiation_resizes_active_planes() {
    let mut host = host();
    host.install_module(Box::new(Gain::new(1.0)));
    host.on_block_size_negotiated(2048);

    let input: Vec<f64> = (0..2048).map(|i| (i % 7) as f64).collect();
    let mut output = vec![0.0; 2048];
    host.process_block(&[&input[..]], &mut [&mut output[..]], 2048);
    assert_eq!(output, input);
}

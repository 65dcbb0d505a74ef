//! End-to-end builds against the real rustc in the test environment.

use fermata_compiler::{CompilerError, Level, ModuleBuilder, ReferenceSet};

const IDENTITY_BODY: &str = r#"
pub struct mydsp;

impl Default for mydsp {
    fn default() -> Self {
        mydsp
    }
}

impl DspModule for mydsp {
    fn init(&mut self, _sample_rate: i32) {}
    fn num_inputs(&self) -> usize { 1 }
    fn num_outputs(&self) -> usize { 1 }
    fn compute(&mut self, frames: usize, io: &mut BlockBuffers) {
        let (inputs, outputs) = io.split();
        outputs[0][..frames].copy_from_slice(&inputs[0][..frames]);
    }
    fn build_user_interface(&self, _ui: &mut dyn UiBuilder) {}
}
"#;

fn builder() -> ModuleBuilder {
    ModuleBuilder::new(ReferenceSet::discover().expect("contract rlib in build tree"))
}

#[test]
fn builds_identity_module_to_loadable_artifact() {
    let mut builder = builder();
    let compiled = builder.build(IDENTITY_BODY).expect("build");
    assert!(compiled.artifact().is_file());
    assert!(compiled
        .exported_types()
        .iter()
        .any(|name| name == "mydsp"));
}

#[test]
fn unit_identities_increase_across_rebuilds_of_same_source() {
    let mut builder = builder();
    let first = builder.build(IDENTITY_BODY).expect("first build");
    let second = builder.build(IDENTITY_BODY).expect("second build");
    let third = builder.build(IDENTITY_BODY).expect("third build");

    assert!(first.unit() < second.unit() && second.unit() < third.unit());
    // Distinct identities also mean distinct artifact names, so nothing in
    // the loader can ever alias two generations of the same DSP source.
    assert_ne!(first.artifact().file_name(), second.artifact().file_name());
    assert_ne!(second.artifact().file_name(), third.artifact().file_name());
}

#[test]
fn invalid_source_returns_structured_diagnostics() {
    let mut builder = builder();
    let err = builder
        .build("pub struct mydsp; impl mydsp { fn broken(&self) -> f64 { \"nope\" } }")
        .unwrap_err();
    match err {
        CompilerError::Compilation(diagnostics) => {
            assert!(!diagnostics.is_empty());
            assert!(diagnostics
                .iter()
                .any(|diagnostic| diagnostic.level == Level::Error));
            assert!(diagnostics
                .iter()
                .any(|diagnostic| !diagnostic.message.is_empty()));
        }
        other => panic!("expected Compilation, got {other:?}"),
    }
}

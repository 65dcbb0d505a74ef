//! Child-process behavior of the translator stage, exercised with stand-in
//! shell tools so the tests do not need a Faust installation.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use fermata_compiler::{CompilerError, FaustTranslator, TranslatorConfig};

fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("fake-faust");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write tool");
    let mut perms = fs::metadata(&path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod");
    path
}

fn translator_for(tool: PathBuf) -> FaustTranslator {
    FaustTranslator::new(TranslatorConfig {
        faust_path: tool,
        ..TranslatorConfig::default()
    })
}

#[test]
fn captures_stdout_as_generated_code() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tool = fake_tool(
        dir.path(),
        "echo '// generated module'\necho 'progress note' 1>&2",
    );
    let source = dir.path().join("gain.dsp");
    fs::write(&source, "process = _;").unwrap();

    let output = translator_for(tool).translate(&source).expect("translate");
    assert!(output.code.contains("// generated module"));
    assert!(output.diagnostics.contains("progress note"));
}

#[test]
fn nonzero_exit_reports_captured_stderr() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tool = fake_tool(dir.path(), "echo 'syntax error on line 3' 1>&2\nexit 2");
    let source = dir.path().join("broken.dsp");
    fs::write(&source, "process = ???;").unwrap();

    let err = translator_for(tool).translate(&source).unwrap_err();
    match err {
        CompilerError::ExternalTool { status, stderr } => {
            assert_eq!(status.code(), Some(2));
            assert!(stderr.contains("syntax error on line 3"));
        }
        other => panic!("expected ExternalTool, got {other:?}"),
    }
}

#[test]
fn large_error_stream_does_not_deadlock() {
    // Well past the pipe buffer on every platform we run on; if only one
    // stream were drained this would hang the child and the test.
    let dir = tempfile::tempdir().expect("tempdir");
    let tool = fake_tool(
        dir.path(),
        "i=0\nwhile [ $i -lt 20000 ]; do echo \"diagnostic line $i\" 1>&2; i=$((i+1)); done\necho 'ok'",
    );
    let source = dir.path().join("noisy.dsp");
    fs::write(&source, "process = _;").unwrap();

    let output = translator_for(tool).translate(&source).expect("translate");
    assert_eq!(output.code.trim(), "ok");
    assert!(output.diagnostics.contains("diagnostic line 19999"));
}

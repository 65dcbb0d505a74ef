use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::error::CompilerError;

/// Sample format the translator is asked to generate arithmetic for. The
/// host-side block buffers are always f64; `Single` only narrows the
/// module-internal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    Single,
    #[default]
    Double,
}

impl Precision {
    fn flag(self) -> &'static str {
        match self {
            Precision::Single => "-single",
            Precision::Double => "-double",
        }
    }
}

/// Where and how to invoke the external translator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub faust_path: PathBuf,
    pub precision: Precision,
    /// Extra arguments appended before the source path.
    pub extra_args: Vec<String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            faust_path: PathBuf::from("faust"),
            precision: Precision::default(),
            extra_args: Vec::new(),
        }
    }
}

/// Captured output of one successful translator run.
#[derive(Debug, Clone)]
pub struct TranslationOutput {
    /// Generated Rust source text (the translator's stdout).
    pub code: String,
    /// Whatever the translator wrote to stderr; informational on success.
    pub diagnostics: String,
}

/// Invokes the external Faust compiler as a child process.
pub struct FaustTranslator {
    config: TranslatorConfig,
}

impl FaustTranslator {
    pub fn new(config: TranslatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// Translate one DSP source file. Blocks until the tool exits; a nonzero
    /// exit status is reported immediately with the captured error stream.
    pub fn translate(&self, source: &Path) -> Result<TranslationOutput, CompilerError> {
        log::debug!(
            "translating {} with {}",
            source.display(),
            self.config.faust_path.display()
        );

        let mut child = Command::new(&self.config.faust_path)
            .arg("-lang")
            .arg("rust")
            .arg(self.config.precision.flag())
            .args(&self.config.extra_args)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Both pipes get their own reader thread. Draining only one would let
        // a large write to the other fill its pipe and stall the child while
        // we sit in wait().
        let mut stdout = child.stdout.take().expect("stdout is piped");
        let mut stderr = child.stderr.take().expect("stderr is piped");
        let stdout_reader = thread::spawn(move || {
            let mut text = String::new();
            stdout.read_to_string(&mut text).map(|_| text)
        });
        let stderr_reader = thread::spawn(move || {
            let mut text = String::new();
            stderr.read_to_string(&mut text).map(|_| text)
        });

        let status = child.wait()?;
        let code = stdout_reader.join().expect("stdout reader thread")?;
        let diagnostics = stderr_reader.join().expect("stderr reader thread")?;

        if !status.success() {
            return Err(CompilerError::ExternalTool {
                status,
                stderr: diagnostics,
            });
        }

        log::debug!("translator produced {} bytes of source", code.len());
        Ok(TranslationOutput { code, diagnostics })
    }
}

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::diagnostics::{parse_rustc_json, Diagnostic, Level};
use crate::error::CompilerError;
use crate::reference::ReferenceSet;

/// Identity of one dynamic build. Strictly increasing per builder and never
/// reused within a process lifetime; the id names the compiled crate, which
/// keeps repeated rebuilds of the same DSP source from colliding on crate
/// name or artifact path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModuleId(pub u64);

impl ModuleId {
    pub fn crate_name(self) -> String {
        format!("fermata_dyn_{}", self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.crate_name())
    }
}

/// How translated source text is prepared for compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Architecture {
    /// Splice the text into the contract wrapper: prelude imports plus the
    /// entry declaration for the well-known `mydsp` type.
    #[default]
    Wrap,
    /// Compile the text as-is; it is expected to carry its own entry
    /// declaration.
    Raw,
}

/// A successfully compiled, not-yet-loaded module binary.
///
/// Owns the temporary build tree, so the artifact stays on disk for as long
/// as this value (or the handle it is folded into) lives.
pub struct CompiledModule {
    artifact: PathBuf,
    unit: ModuleId,
    exported_types: Vec<String>,
    warnings: Vec<Diagnostic>,
    build_dir: TempDir,
}

impl CompiledModule {
    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn unit(&self) -> ModuleId {
        self.unit
    }

    /// Type names declared by the compiled unit, recorded at build time so
    /// load-stage errors can report what the unit actually contained.
    pub fn exported_types(&self) -> &[String] {
        &self.exported_types
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn into_parts(self) -> (PathBuf, ModuleId, Vec<String>, Vec<Diagnostic>, TempDir) {
        (
            self.artifact,
            self.unit,
            self.exported_types,
            self.warnings,
            self.build_dir,
        )
    }
}

impl fmt::Debug for CompiledModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledModule")
            .field("artifact", &self.artifact)
            .field("unit", &self.unit)
            .field("exported_types", &self.exported_types)
            .finish()
    }
}

/// Compiles translated source text into loadable cdylib binaries.
///
/// Compile only: loading is a separate concern so this stage has no
/// process-wide side effects and is independently testable.
pub struct ModuleBuilder {
    references: ReferenceSet,
    architecture: Architecture,
    next_unit: u64,
}

impl ModuleBuilder {
    pub fn new(references: ReferenceSet) -> Self {
        Self {
            references,
            architecture: Architecture::default(),
            next_unit: 1,
        }
    }

    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }

    fn next_unit(&mut self) -> ModuleId {
        let unit = ModuleId(self.next_unit);
        self.next_unit += 1;
        unit
    }

    /// Compile one translated source text into a cdylib.
    pub fn build(&mut self, source: &str) -> Result<CompiledModule, CompilerError> {
        let unit = self.next_unit();
        let build_dir = tempfile::Builder::new()
            .prefix("fermata-build-")
            .tempdir()?;

        let prepared = match self.architecture {
            Architecture::Wrap => wrap_source(source),
            Architecture::Raw => source.to_owned(),
        };
        let source_path = build_dir.path().join(format!("{}.rs", unit.crate_name()));
        fs::write(&source_path, &prepared)?;

        let artifact = build_dir.path().join(format!(
            "{}{}.{}",
            std::env::consts::DLL_PREFIX,
            unit.crate_name(),
            std::env::consts::DLL_EXTENSION
        ));

        log::debug!("compiling unit {unit} -> {}", artifact.display());
        let output = Command::new("rustc")
            .arg("--edition=2021")
            .arg("--crate-type=cdylib")
            .arg("--crate-name")
            .arg(unit.crate_name())
            .arg("-C")
            .arg("opt-level=3")
            .arg("-C")
            .arg("panic=unwind")
            .arg("-C")
            .arg("prefer-dynamic")
            .arg("--error-format=json")
            .arg("--extern")
            .arg(format!(
                "fermata_dsp={}",
                self.references.contract_rlib.display()
            ))
            .arg("-L")
            .arg(format!("dependency={}", self.references.search_dir.display()))
            .arg("-o")
            .arg(&artifact)
            .arg(&source_path)
            .output()?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut diagnostics = parse_rustc_json(&stderr);

        if !output.status.success() {
            if diagnostics.is_empty() {
                // rustc died without structured output; keep the raw text.
                diagnostics.push(Diagnostic {
                    level: Level::Error,
                    message: stderr.into_owned(),
                    span: None,
                });
            }
            return Err(CompilerError::Compilation(diagnostics));
        }

        let warnings: Vec<Diagnostic> = diagnostics
            .into_iter()
            .filter(|diagnostic| diagnostic.level != Level::Error)
            .collect();
        for warning in &warnings {
            log::debug!("unit {unit}: {warning}");
        }

        Ok(CompiledModule {
            artifact,
            unit,
            exported_types: scan_declared_types(&prepared),
            warnings,
            build_dir,
        })
    }
}

/// The contract architecture: prelude imports around the translated body and
/// the entry declaration for the translator's well-known `mydsp` type. The
/// lint allows cover the naming style of machine-generated code.
fn wrap_source(body: &str) -> String {
    format!(
        "#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]\n\
         #![allow(unused_parens, unused_mut, unused_variables, dead_code)]\n\
         use fermata_dsp::prelude::*;\n\
         \n\
         {body}\n\
         \n\
         fermata_dsp::declare_fermata_dsp!(mydsp);\n"
    )
}

/// Collect the names of types declared in the unit, in declaration order.
fn scan_declared_types(source: &str) -> Vec<String> {
    let mut names = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim_start();
        let rest = ["pub struct ", "pub enum ", "struct ", "enum "]
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(prefix));
        if let Some(rest) = rest {
            let name: String = rest
                .chars()
                .take_while(|c| c.is_alphanumeric() || *c == '_')
                .collect();
            if !name.is_empty() && !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

use std::env;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::CompilerError;

const CONTRACT_RLIB_PREFIX: &str = "libfermata_dsp";

/// The set of compiled units a dynamic build links against: the contract
/// crate's rlib plus the directory rustc may search for its dependencies.
/// The contract crate is dependency-free, so the set is closed over that one
/// rlib; the search dir is still passed through for hygiene.
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    pub contract_rlib: PathBuf,
    pub search_dir: PathBuf,
}

impl ReferenceSet {
    /// Use a known rlib path (e.g. one shipped next to the host binary).
    pub fn explicit(contract_rlib: PathBuf) -> Self {
        let search_dir = contract_rlib
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            contract_rlib,
            search_dir,
        }
    }

    /// Locate the contract rlib from the running host's own build tree.
    ///
    /// Honors `FERMATA_CONTRACT_RLIB` when set; otherwise walks up from the
    /// current executable looking for `deps` directories (the cargo target
    /// layout) and picks the newest `libfermata_dsp*.rlib` found.
    pub fn discover() -> Result<Self, CompilerError> {
        if let Some(path) = env::var_os("FERMATA_CONTRACT_RLIB") {
            return Ok(Self::explicit(PathBuf::from(path)));
        }

        let exe = env::current_exe()?;
        for dir in exe.ancestors().skip(1) {
            for candidate in [dir.join("deps"), dir.to_path_buf()] {
                if let Some(rlib) = newest_contract_rlib(&candidate) {
                    return Ok(Self::explicit(rlib));
                }
            }
        }

        Err(CompilerError::MissingReference(format!(
            "no {CONTRACT_RLIB_PREFIX}*.rlib near {} (set FERMATA_CONTRACT_RLIB to override)",
            exe.display()
        )))
    }
}

fn newest_contract_rlib(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(CONTRACT_RLIB_PREFIX) && name.ends_with(".rlib")
        })
        .max_by_key(|entry| {
            entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        })
        .map(|entry| entry.path())
}

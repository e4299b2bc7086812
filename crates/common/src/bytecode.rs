//! Local bytecode artifacts: one `.bin` file per contract, named after the
//! plan step that deploys it.

use std::path::PathBuf;

use thiserror::Error;

use crate::logger;

#[derive(Debug, Error)]
pub enum BytecodeError {
    #[error("failed to read bytecode for {name:?} from {path}: {source}")]
    Read {
        name: String,
        path: String,
        source: std::io::Error,
    },
}

pub trait BytecodeSource: Send + Sync {
    /// Raw compiled bytecode as a 0x-prefixed hex string.
    fn load(&self, name: &str) -> Result<String, BytecodeError>;
}

/// Reads `{dir}/{name}.bin`.
pub struct DirBytecodeSource {
    dir: PathBuf,
}

impl DirBytecodeSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirBytecodeSource { dir: dir.into() }
    }
}

impl BytecodeSource for DirBytecodeSource {
    fn load(&self, name: &str) -> Result<String, BytecodeError> {
        let path = self.dir.join(format!("{name}.bin"));
        let raw = std::fs::read_to_string(&path).map_err(|source| BytecodeError::Read {
            name: name.to_string(),
            path: path.display().to_string(),
            source,
        })?;
        let trimmed = raw.trim();
        let bytecode = if trimmed.starts_with("0x") {
            trimmed.to_string()
        } else {
            format!("0x{trimmed}")
        };
        logger::debug(format!(
            "loaded bytecode for {name} from {} ({} hex chars)",
            path.display(),
            bytecode.len() - 2
        ));
        Ok(bytecode)
    }
}

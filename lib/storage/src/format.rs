use atomicwrites::{AtomicFile, OverwriteBehavior};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use hashmatch_core::{Error, Result};

/// On-disk encoding, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `.json`
    Json,
    /// `.bin`
    Bincode,
}

impl FileFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(FileFormat::Json),
            Some(ext) if ext.eq_ignore_ascii_case("bin") => Ok(FileFormat::Bincode),
            _ => Err(Error::Storage(format!(
                "unsupported file extension for {:?}, expected .json or .bin",
                path
            ))),
        }
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>> {
        match self {
            FileFormat::Json => serde_json::to_vec_pretty(value)
                .map_err(|e| Error::Serialization(e.to_string())),
            FileFormat::Bincode => {
                bincode::serialize(value).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }

    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T> {
        match self {
            FileFormat::Json => {
                serde_json::from_slice(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
            FileFormat::Bincode => {
                bincode::deserialize(bytes).map_err(|e| Error::Serialization(e.to_string()))
            }
        }
    }
}

/// Replace `path` with `bytes` so that readers see either the old or the
/// new content, never a partial write.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|file| file.write_all(bytes))
        .map_err(|e| match e {
            atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => Error::Io(e),
        })
}

/// Encode `value` in the format implied by `path` and write it atomically.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let format = FileFormat::from_path(path)?;
    write_atomic(path, &format.encode(value)?)
}

/// Read and decode a file written by [`save`].
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = FileFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    format.decode(&bytes)
}

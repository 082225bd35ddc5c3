use thiserror::Error;

use crate::ScalarKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid descriptor dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Invalid descriptor buffer: {len} values cannot hold {rows} rows of {cols} columns (stride {stride})")]
    InvalidBuffer {
        len: usize,
        rows: usize,
        cols: usize,
        stride: usize,
    },

    #[error("Invalid regions: {0}")]
    InvalidRegions(String),

    #[error("Unsupported descriptor scalar type: {0}")]
    UnknownScalarType(String),

    #[error("Descriptor scalar type mismatch: expected {expected}, got {actual}")]
    ScalarMismatch {
        expected: ScalarKind,
        actual: ScalarKind,
    },

    #[error("Invalid pair file at line {line}: {reason}")]
    InvalidPairFile { line: usize, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

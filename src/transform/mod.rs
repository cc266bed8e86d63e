// Generic stream transforms, monomorphized per element kind.
//
// Each transform is built from explicit configuration, validated once at
// construction, then driven over a reader/writer pair by `run`. Scratch
// buffers are owned by the run and allocated once.
//
// # Modules
//
// - `reshape`: `BlockReshaper`, window and pad fixed-length blocks
// - `dump`: `IndexedDumper`, indexed text lines with a cyclic index
// - `delay`: `DelayLine`, shift a stream by a signed number of samples

pub mod delay;
pub mod dump;
pub mod reshape;

use thiserror::Error;

use crate::codec::CodecError;
use crate::codec::format::FormatSyntaxError;

pub use delay::{DelayLine, DelayOptions};
pub use dump::{DumpOptions, IndexWindow, IndexedDumper};
pub use reshape::{BlockGeometry, BlockReshaper, ReshapeOptions};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Configuration rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("block length must be at least 1")]
    EmptyBlock,
    #[error("start index {start} is greater than end index {end}")]
    StartAfterEnd { start: usize, end: usize },
    #[error("end index {end} is outside a block of length {length}")]
    EndOutsideBlock { end: usize, length: usize },
    #[error("output block length {length} cannot hold {required} elements")]
    OutputTooShort { length: usize, required: usize },
    #[error("maximum index {maximum} is less than minimum index {minimum}")]
    InvalidIndexWindow { minimum: i64, maximum: i64 },
    #[error("unknown data type '{0}'")]
    UnknownType(String),
    #[error("invalid print format: {0}")]
    InvalidFormat(#[from] FormatSyntaxError),
}

/// Failure of a `try_run` call.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(ConfigError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl RunError {
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig(_))
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters reported by a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Whole blocks read (reshaper only).
    pub blocks: u64,
    /// Values decoded from the input.
    pub values_read: u64,
    /// Values (or dump lines) written to the output.
    pub values_written: u64,
}

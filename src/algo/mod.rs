// Elementary frame algorithms.
//
// Each algorithm is constructed from fixed parameters and reports whether
// they were acceptable through `is_valid`. `run` is pure and allocation
// free; on failure it returns an error and produces no output.
//
// # Modules
//
// - `entropy`: Shannon entropy of a probability frame
// - `mu_law`: mu-law amplitude compression of a scalar

pub mod entropy;
pub mod mu_law;

use thiserror::Error;

pub use entropy::{EntropyCalculator, EntropyUnit};
pub use mu_law::MuLawCompression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AlgorithmError {
    #[error("algorithm parameters are invalid")]
    InvalidParameters,
    #[error("expected {expected} values, got {got}")]
    LengthMismatch { expected: usize, got: usize },
    #[error("probability at index {index} is negative")]
    NegativeProbability { index: usize },
    #[error("value at index {index} is not a number")]
    NotANumber { index: usize },
}

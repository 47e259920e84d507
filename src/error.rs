use thiserror::Error;

use crate::cigar::CigarOperator;

/// Errors reported by cigar parsing and alignment-geometry operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CigarError {
    #[error("Invalid CIGAR '{cigar}': {reason}")]
    Parse { cigar: String, reason: String },

    #[error("Invalid interval: start {start} is after end {end}")]
    InvalidInterval { start: usize, end: usize },

    #[error("Interval end {end} is beyond the alignment span of {length}")]
    IntervalOutOfRange { end: usize, length: usize },

    #[error("Unsupported CIGAR operator '{op}' in {context}")]
    UnsupportedOperator {
        op: CigarOperator,
        context: &'static str,
    },

    #[error("Length mismatch: CIGAR describes {expected} bases but {actual} were given")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Offset {offset} is out of bounds for a sequence of length {length}")]
    OffsetOutOfBounds { offset: usize, length: usize },

    #[error("Cannot left align a CIGAR with {count} indels")]
    MultipleIndels { count: usize },

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

pub type Result<T> = std::result::Result<T, CigarError>;

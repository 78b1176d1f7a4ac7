use thiserror::Error;

use crate::algo::lookup_table::TableError;

/// Errors produced while composing or rendering profiles.
#[derive(Error, Debug)]
pub enum GalSimError {
    /// A required argument is missing, empty, or outside its valid domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An element of the wrong kind was supplied where a specific kind is required.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Kind the operation accepts.
        expected: &'static str,
        /// Kind that was supplied.
        found: &'static str,
    },

    /// A parameter set contained keys (or key types) that are not recognised.
    #[error("unrecognised parameters: {0}")]
    UnknownParameters(String),

    /// Rendering would need a larger FFT than the parameter set allows.
    #[error("FFT of size {required} exceeds maximum_fft_size = {maximum}")]
    FftTooLarge {
        /// Transform size the draw would need.
        required: usize,
        /// Configured `maximum_fft_size`.
        maximum: usize,
    },

    /// Real-space evaluation requested from a profile with only a Fourier representation.
    #[error("{0} cannot be evaluated in real space")]
    NotAnalyticReal(&'static str),

    #[error(transparent)]
    Table(#[from] TableError),
}

pub type Result<T> = std::result::Result<T, GalSimError>;

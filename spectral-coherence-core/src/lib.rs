//! Array primitives backing the `spectral-coherence` estimators.
//!
//! This crate carries no statistical semantics. It provides the numpy-parallel
//! building blocks the estimator crate composes: 1-D linear [`convolve`]
//! with full/same/valid output modes, orthonormal FFT and FFT-frequency
//! helpers in [`fourier`], and the paired real/imaginary complex-array
//! capability in [`split_complex`] used where no native complex arithmetic
//! can be assumed.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
mod convolve;
#[cfg(feature = "std")]
pub mod fourier;
#[cfg(feature = "alloc")]
pub mod split_complex;

#[cfg(feature = "std")]
pub use convolve::{convolve, ConvolveMode};

use core::{error, fmt};

/// Errors raised by the array primitives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The convolution backend rejected the inputs.
    #[cfg(feature = "alloc")]
    Conv {
        /// Backend failure description.
        reason: alloc::string::String,
    },
    /// The convolution backend rejected the inputs.
    #[cfg(not(feature = "alloc"))]
    Conv,
    /// Operands had incompatible shapes.
    #[cfg(feature = "alloc")]
    Shape {
        /// What mismatched.
        reason: alloc::string::String,
    },
    /// Operands had incompatible shapes.
    #[cfg(not(feature = "alloc"))]
    Shape,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "alloc")]
            Error::Conv { reason } => write!(f, "Convolution failed: {reason}"),
            #[cfg(not(feature = "alloc"))]
            Error::Conv => write!(f, "Convolution failed."),
            #[cfg(feature = "alloc")]
            Error::Shape { reason } => write!(f, "Shape mismatch: {reason}"),
            #[cfg(not(feature = "alloc"))]
            Error::Shape => write!(f, "Shape mismatch."),
        }
    }
}

impl error::Error for Error {}

/// Result alias for primitive operations.
pub type Result<T> = core::result::Result<T, Error>;

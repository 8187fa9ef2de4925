//! Trait interfaces for the spectral estimation capabilities.
//!
//! The direct (FFT + circular smoothing) and factored (Fourier projection)
//! paths are two independent algorithms computing the same mathematical
//! quantity. They share these interfaces, not code; their numerical
//! agreement is enforced by property tests instead.

use crate::kernel::{ExecInvariantViolation, ReadFrame, Write1D};
use ndarray::{Array1, Array3};
use num_complex::Complex;

/// Cross-spectral density estimation for a samples-by-channels frame.
///
/// Output is a `J x M x M` stack of Hermitian matrices, one per retained
/// frequency, along with the `J` frequencies in cycles per sample.
pub trait DensityEstimate2D<T> {
    /// Run estimation into caller-provided buffers.
    fn run_into<I, OF>(
        &self,
        x: &I,
        density: &mut Array3<Complex<T>>,
        freqs: &mut OF,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: ReadFrame<Complex<T>> + ?Sized,
        OF: Write1D<f64> + ?Sized;

    /// Run estimation and allocate the outputs.
    fn run_alloc<I>(
        &self,
        x: &I,
    ) -> Result<(Array3<Complex<T>>, Array1<f64>), ExecInvariantViolation>
    where
        I: ReadFrame<Complex<T>> + ?Sized;
}

/// Coherence estimation: cross-spectral density rescaled to unit diagonal.
pub trait CoherenceEstimate2D<T> {
    /// Run estimation into caller-provided buffers.
    fn run_into<I, OF>(
        &self,
        x: &I,
        coherence: &mut Array3<Complex<T>>,
        freqs: &mut OF,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: ReadFrame<Complex<T>> + ?Sized,
        OF: Write1D<f64> + ?Sized;

    /// Run estimation and allocate the outputs.
    fn run_alloc<I>(
        &self,
        x: &I,
    ) -> Result<(Array3<Complex<T>>, Array1<f64>), ExecInvariantViolation>
    where
        I: ReadFrame<Complex<T>> + ?Sized;
}

//! Spectral density and coherence estimators.
//!
//! The kernel types ([`DirectSpectralKernel`], [`FactoredSpectralKernel`],
//! [`LagWindowKernel`]) carry validated configuration and implement the
//! estimation traits; the free functions below wrap them for one-shot use.

pub mod coherence;
pub mod density;
pub mod factored;
pub mod lag_window;
pub mod traits;
pub mod validate;

pub use coherence::normalize;
pub use density::{DirectSpectralConfig, DirectSpectralKernel};
pub use factored::{FactoredSpectralConfig, FactoredSpectralKernel};
pub use lag_window::{LagWindowConfig, LagWindowDensity, LagWindowKernel};
pub use traits::{CoherenceEstimate2D, DensityEstimate2D};
pub use validate::is_sane_time_series;

use crate::error::Error;
use crate::kernel::KernelLifecycle;
use ndarray::{Array1, Array3};
use rustfft::num_complex::Complex;

/// Diagonal power below this is treated as a degenerate (zero-power)
/// channel when normalizing to coherence.
pub const DIAG_EPS: f64 = 1e-12;

/// Numerical tolerance for agreement between the direct and factored
/// paths at shared frequencies.
pub const CROSS_PATH_TOL: f64 = 1e-6;

/// Smoothed cross-spectral density of `x` with window length `b`,
/// optionally capped to `n_max_freqs` reported frequencies.
///
/// Returns the `(j, m, m)` Hermitian density stack and its `j` ascending
/// frequencies in cycles per sample.
pub fn density(
    x: &ndarray::Array2<Complex<f64>>,
    b: usize,
    n_max_freqs: Option<usize>,
) -> Result<(Array3<Complex<f64>>, Array1<f64>), Error> {
    let kernel = DirectSpectralKernel::try_new(DirectSpectralConfig { b, n_max_freqs })?;
    Ok(DensityEstimate2D::run_alloc(&kernel, x)?)
}

/// Coherence of `x`: the smoothed density rescaled to a unit diagonal.
pub fn coherence(
    x: &ndarray::Array2<Complex<f64>>,
    b: usize,
    n_max_freqs: Option<usize>,
) -> Result<(Array3<Complex<f64>>, Array1<f64>), Error> {
    let kernel = DirectSpectralKernel::try_new(DirectSpectralConfig { b, n_max_freqs })?;
    Ok(CoherenceEstimate2D::run_alloc(&kernel, x)?)
}

/// Smoothed cross-spectral density via the factored half-periodogram
/// path, on `freqs` or the default `b`-spaced Fourier grid.
pub fn density_factored(
    x: &ndarray::Array2<Complex<f64>>,
    b: usize,
    freqs: Option<Array1<f64>>,
) -> Result<(Array3<Complex<f64>>, Array1<f64>), Error> {
    let kernel = FactoredSpectralKernel::try_new(FactoredSpectralConfig { b, freqs })?;
    Ok(DensityEstimate2D::run_alloc(&kernel, x)?)
}

/// Coherence via the factored half-periodogram path.
pub fn coherence_factored(
    x: &ndarray::Array2<Complex<f64>>,
    b: usize,
    freqs: Option<Array1<f64>>,
) -> Result<(Array3<Complex<f64>>, Array1<f64>), Error> {
    let kernel = FactoredSpectralKernel::try_new(FactoredSpectralConfig { b, freqs })?;
    Ok(CoherenceEstimate2D::run_alloc(&kernel, x)?)
}

/// Fit a lag-window density estimator to `x` with lags up to `max_lag`.
pub fn lag_window(
    x: &ndarray::Array2<Complex<f64>>,
    max_lag: usize,
) -> Result<LagWindowDensity, Error> {
    let kernel = LagWindowKernel::try_new(LagWindowConfig { max_lag })?;
    Ok(kernel.run(x)?)
}

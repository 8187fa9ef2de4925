//! Factored-path estimation: an explicit Fourier projection tensor folds
//! the smoothing window into a per-frequency low-rank factor.
//!
//! On array hardware built for dense contraction rather than
//! transcendental-heavy FFTs, the direct path's transform-then-convolve
//! pipeline is replaced by one projection and one gram product. The
//! projection tensor stores the conjugated Fourier basis, so contracting
//! it against the signal yields the orthonormal Fourier coefficients of
//! the `B` bins around each target frequency. Complex values travel as
//! paired real arrays throughout ([`SplitComplex`]).
//!
//! Unlike the direct path, the functions here do not scan the signal for
//! non-finite entries; inputs are assumed pre-validated.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, ReadFrame, Write1D};
use crate::spectral::traits::{CoherenceEstimate2D, DensityEstimate2D};
use crate::spectral::DIAG_EPS;
use ndarray::{Array1, Array3, ArrayView1, Axis, Ix3};
use rustfft::num_complex::Complex;
use spectral_coherence_core::fourier::{ascending_order, fftfreq};
use spectral_coherence_core::split_complex::SplitComplex;

/// Default analysis grid for an `n_samples`-point series with smoothing
/// width `b`: every `b`-th Fourier frequency in ascending order, so the
/// grid spacing matches the bandwidth already averaged by the window.
pub fn default_frequency_grid(n_samples: usize, b: usize) -> Array1<f64> {
    let raw = fftfreq(n_samples);
    let order = ascending_order(raw.view());
    let sorted = raw.select(Axis(0), &order);
    Array1::from_iter((0..n_samples).step_by(b).map(|i| sorted[i]))
}

/// Fourier projection tensor for `freqs` over `n_samples` time points and
/// a symmetric window of `b` bins.
///
/// Entry `[j, t, k]` is `exp(-2 pi i (f_j + (k - (b-1)/2) / n) t) / sqrt(n)`,
/// the conjugate of the orthonormal Fourier basis at the `k`-th offset bin
/// around `f_j`. Contracting the tensor against a signal along `t` is
/// therefore the forward transform at those bins.
pub fn fourier_matrix(
    freqs: ArrayView1<f64>,
    n_samples: usize,
    b: usize,
) -> SplitComplex<f64, Ix3> {
    let j = freqs.len();
    let half = (b as isize - 1) / 2;
    let scale = 1.0 / (n_samples as f64).sqrt();
    let mut re = Array3::zeros((j, n_samples, b));
    let mut im = Array3::zeros((j, n_samples, b));
    for (row, &freq) in freqs.iter().enumerate() {
        for t in 0..n_samples {
            for k in 0..b {
                let offset = (k as isize - half) as f64 / n_samples as f64;
                let angle = -2.0 * core::f64::consts::PI * (freq + offset) * t as f64;
                re[[row, t, k]] = angle.cos() * scale;
                im[[row, t, k]] = angle.sin() * scale;
            }
        }
    }
    // Shapes match by construction.
    SplitComplex { re, im }
}

/// Half-periodogram factor of `x` at each grid frequency: the `b`
/// windowed Fourier coefficient vectors, divided by `sqrt(b)` so that the
/// gram of a factor is already the window-averaged density.
pub fn half_periodogram(
    x: &SplitComplex<f64, ndarray::Ix2>,
    freqs: ArrayView1<f64>,
    b: usize,
) -> Result<SplitComplex<f64, Ix3>, ExecInvariantViolation> {
    let (n, m) = x.re.dim();
    if b == 0 || b % 2 == 0 || b >= n {
        return Err(ConfigError::InvalidArgument {
            arg: "B",
            reason: "B must be a positive odd integer smaller than the number of samples",
        }
        .into());
    }
    if freqs.is_empty() {
        return Err(ConfigError::EmptyInput { arg: "freqs" }.into());
    }

    let projection = fourier_matrix(freqs, n, b);
    let scale = 1.0 / (b as f64).sqrt();
    let j = freqs.len();
    let mut re = Array3::zeros((j, b, m));
    let mut im = Array3::zeros((j, b, m));
    for row in 0..j {
        // (b x n) . (n x m) per frequency; the projection already holds
        // the conjugated basis, so no further conjugation here.
        let factor = projection.index_frame(row).t().matmul(x).scale(scale);
        re.index_axis_mut(Axis(0), row).assign(&factor.re);
        im.index_axis_mut(Axis(0), row).assign(&factor.im);
    }
    Ok(SplitComplex { re, im })
}

/// Gram product of a half factor with its own conjugate over the window
/// axis, producing the per-frequency cross-spectral (or coherence) stack.
pub fn cross_gram(half: &SplitComplex<f64, Ix3>) -> Array3<Complex<f64>> {
    let (j, _, m) = half.re.dim();
    let mut out = Array3::zeros((j, m, m));
    for row in 0..j {
        let factor = half.index_frame(row);
        let gram = factor.t().matmul(&factor.conj());
        for l in 0..m {
            for k in 0..m {
                out[[row, l, k]] = Complex::new(gram.re[[l, k]], gram.im[[l, k]]);
            }
        }
    }
    out
}

/// Rescale the half factor per frequency and channel by the inverse square
/// root of its squared-magnitude sum over the window axis.
///
/// The gram of the rescaled factor is the coherence stack with an exactly
/// unit diagonal, so coherence never needs the dense density matrix at
/// all. A channel whose windowed power falls below [`DIAG_EPS`] makes the
/// rescaling undefined and is reported with its frequency row.
pub fn half_coherence(
    half: &SplitComplex<f64, Ix3>,
) -> Result<SplitComplex<f64, Ix3>, ExecInvariantViolation> {
    let (j, b, m) = half.re.dim();
    let magnitudes = half.squared_modulus();
    let mut re = half.re.clone();
    let mut im = half.im.clone();
    for row in 0..j {
        for chan in 0..m {
            let power: f64 = (0..b).map(|k| magnitudes[[row, k, chan]]).sum();
            if !(power > DIAG_EPS) {
                return Err(ExecInvariantViolation::Degenerate {
                    arg: "half_periodogram",
                    index: row,
                });
            }
            let inv = 1.0 / power.sqrt();
            for k in 0..b {
                re[[row, k, chan]] *= inv;
                im[[row, k, chan]] *= inv;
            }
        }
    }
    Ok(SplitComplex { re, im })
}

/// Constructor config for [`FactoredSpectralKernel`].
#[derive(Debug, Clone, PartialEq)]
pub struct FactoredSpectralConfig {
    /// Smoothing window length folded into the Fourier projection.
    pub b: usize,
    /// Analysis frequencies in cycles per sample; `None` selects the
    /// default `b`-spaced Fourier grid for the input's length.
    pub freqs: Option<Array1<f64>>,
}

/// Projection-based estimator producing density and coherence from the
/// half-periodogram factor.
#[derive(Debug, Clone, PartialEq)]
pub struct FactoredSpectralKernel {
    b: usize,
    freqs: Option<Array1<f64>>,
}

impl FactoredSpectralKernel {
    fn grid_for(&self, n_samples: usize) -> Array1<f64> {
        match &self.freqs {
            Some(freqs) => freqs.clone(),
            None => default_frequency_grid(n_samples, self.b),
        }
    }

    fn expected_rows(&self, n_samples: usize) -> usize {
        match &self.freqs {
            Some(freqs) => freqs.len(),
            None => n_samples.div_ceil(self.b),
        }
    }

    fn half<I>(
        &self,
        x: &I,
    ) -> Result<(SplitComplex<f64, Ix3>, Array1<f64>), ExecInvariantViolation>
    where
        I: ReadFrame<Complex<f64>> + ?Sized,
    {
        let frame = x.read_frame()?;
        let split = SplitComplex::from_complex(&frame);
        let grid = self.grid_for(frame.nrows());
        let half = half_periodogram(&split, grid.view(), self.b)?;
        Ok((half, grid))
    }
}

impl KernelLifecycle for FactoredSpectralKernel {
    type Config = FactoredSpectralConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.b == 0 || config.b % 2 == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "b",
                reason: "B must be a positive odd integer",
            });
        }
        if let Some(freqs) = &config.freqs {
            if freqs.is_empty() {
                return Err(ConfigError::EmptyInput { arg: "freqs" });
            }
            if freqs.iter().any(|f| !f.is_finite()) {
                return Err(ConfigError::InvalidArgument {
                    arg: "freqs",
                    reason: "analysis frequencies must be finite",
                });
            }
        }
        Ok(Self {
            b: config.b,
            freqs: config.freqs,
        })
    }
}

impl DensityEstimate2D<f64> for FactoredSpectralKernel {
    fn run_into<I, OF>(
        &self,
        x: &I,
        density: &mut Array3<Complex<f64>>,
        freqs: &mut OF,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: ReadFrame<Complex<f64>> + ?Sized,
        OF: Write1D<f64> + ?Sized,
    {
        let frame = x.read_frame()?;
        let (n, m) = frame.dim();
        let rows = self.expected_rows(n);
        if density.dim() != (rows, m, m) {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "density",
                expected: rows * m * m,
                got: density.len(),
            });
        }
        let freqs_out = freqs
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        if freqs_out.len() != rows {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "freqs",
                expected: rows,
                got: freqs_out.len(),
            });
        }

        let (half, grid) = self.half(&frame)?;
        density.assign(&cross_gram(&half));
        for (dst, src) in freqs_out.iter_mut().zip(grid.iter()) {
            *dst = *src;
        }
        Ok(())
    }

    fn run_alloc<I>(
        &self,
        x: &I,
    ) -> Result<(Array3<Complex<f64>>, Array1<f64>), ExecInvariantViolation>
    where
        I: ReadFrame<Complex<f64>> + ?Sized,
    {
        let (half, grid) = self.half(x)?;
        Ok((cross_gram(&half), grid))
    }
}

impl CoherenceEstimate2D<f64> for FactoredSpectralKernel {
    fn run_into<I, OF>(
        &self,
        x: &I,
        coherence: &mut Array3<Complex<f64>>,
        freqs: &mut OF,
    ) -> Result<(), ExecInvariantViolation>
    where
        I: ReadFrame<Complex<f64>> + ?Sized,
        OF: Write1D<f64> + ?Sized,
    {
        let frame = x.read_frame()?;
        let (n, m) = frame.dim();
        let rows = self.expected_rows(n);
        if coherence.dim() != (rows, m, m) {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "coherence",
                expected: rows * m * m,
                got: coherence.len(),
            });
        }
        let freqs_out = freqs
            .write_slice_mut()
            .map_err(ExecInvariantViolation::from)?;
        if freqs_out.len() != rows {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "freqs",
                expected: rows,
                got: freqs_out.len(),
            });
        }

        let (half, grid) = self.half(&frame)?;
        coherence.assign(&cross_gram(&half_coherence(&half)?));
        for (dst, src) in freqs_out.iter_mut().zip(grid.iter()) {
            *dst = *src;
        }
        Ok(())
    }

    fn run_alloc<I>(
        &self,
        x: &I,
    ) -> Result<(Array3<Complex<f64>>, Array1<f64>), ExecInvariantViolation>
    where
        I: ReadFrame<Complex<f64>> + ?Sized,
    {
        let (half, grid) = self.half(x)?;
        Ok((cross_gram(&half_coherence(&half)?), grid))
    }
}

//! Lag-window density estimation: a finite Fourier series over empirical
//! autocovariances, evaluable at arbitrary real frequencies.
//!
//! Unlike the grid-bound FFT paths, the fitted estimator is a continuous
//! function of frequency, which makes it the natural cross-check for the
//! other estimators at specific off-grid frequencies.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, ReadFrame};
use crate::spectral::validate::ensure_sane_time_series;
use ndarray::{Array1, Array2, ArrayView2};
use rustfft::num_complex::Complex;

/// Signed-lag empirical autocovariance table of `x`, shaped
/// `(2 * max_lag + 1, m)` with lag `l` stored at row `max_lag + l`.
///
/// Lag zero is the mean squared magnitude per channel. A positive lag `l`
/// averages `x[t + l] * conj(x[t])` over the `n - l` available pairs, and
/// the negative lags are the conjugates of their positive counterparts.
pub fn autocovariances(
    x: &ArrayView2<Complex<f64>>,
    max_lag: usize,
) -> Result<Array2<Complex<f64>>, ExecInvariantViolation> {
    ensure_sane_time_series(x)?;
    let (n, m) = x.dim();
    if max_lag == 0 || max_lag >= n {
        return Err(ConfigError::InvalidArgument {
            arg: "max_lag",
            reason: "max_lag must be at least 1 and smaller than the number of samples",
        }
        .into());
    }

    let mut table = Array2::zeros((2 * max_lag + 1, m));
    for chan in 0..m {
        let zero: f64 = (0..n).map(|t| x[[t, chan]].norm_sqr()).sum::<f64>() / n as f64;
        table[[max_lag, chan]] = Complex::new(zero, 0.0);
        for lag in 1..=max_lag {
            let sum: Complex<f64> = (0..n - lag)
                .map(|t| x[[t + lag, chan]] * x[[t, chan]].conj())
                .sum();
            let r = sum / (n - lag) as f64;
            table[[max_lag + lag, chan]] = r;
            table[[max_lag - lag, chan]] = r.conj();
        }
    }
    Ok(table)
}

/// A fitted lag-window spectral density, evaluable at any frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct LagWindowDensity {
    table: Array2<Complex<f64>>,
    max_lag: usize,
}

impl LagWindowDensity {
    /// Fit the estimator to `x` with lags up to `max_lag`.
    pub fn fit<I>(x: &I, max_lag: usize) -> Result<Self, ExecInvariantViolation>
    where
        I: ReadFrame<Complex<f64>> + ?Sized,
    {
        let frame = x.read_frame()?;
        let table = autocovariances(&frame, max_lag)?;
        Ok(Self { table, max_lag })
    }

    /// Per-channel density `sum_l r_l * exp(-2 pi i l nu)` at frequency
    /// `nu` in cycles per sample.
    pub fn density(&self, nu: f64) -> Array1<Complex<f64>> {
        let m = self.table.ncols();
        let mut out = Array1::zeros(m);
        for (row, r) in self.table.outer_iter().enumerate() {
            let lag = row as isize - self.max_lag as isize;
            let angle = -2.0 * core::f64::consts::PI * lag as f64 * nu;
            let phase = Complex::new(angle.cos(), angle.sin());
            for chan in 0..m {
                out[chan] += r[chan] * phase;
            }
        }
        out
    }

    /// The signed-lag autocovariance table backing the estimator.
    pub fn table(&self) -> &Array2<Complex<f64>> {
        &self.table
    }

    /// The largest lag in the table.
    pub fn max_lag(&self) -> usize {
        self.max_lag
    }
}

/// Constructor config for [`LagWindowKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagWindowConfig {
    /// Largest autocovariance lag entering the Fourier series.
    pub max_lag: usize,
}

/// Kernel fitting a [`LagWindowDensity`] per input series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagWindowKernel {
    max_lag: usize,
}

impl LagWindowKernel {
    /// Fit the estimator to `x`.
    pub fn run<I>(&self, x: &I) -> Result<LagWindowDensity, ExecInvariantViolation>
    where
        I: ReadFrame<Complex<f64>> + ?Sized,
    {
        LagWindowDensity::fit(x, self.max_lag)
    }
}

impl KernelLifecycle for LagWindowKernel {
    type Config = LagWindowConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.max_lag == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "max_lag",
                reason: "max_lag must be at least 1",
            });
        }
        Ok(Self {
            max_lag: config.max_lag,
        })
    }
}

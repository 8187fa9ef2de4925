//! Direct-path spectral density estimation: orthonormal FFT, per-bin
//! rank-1 periodogram, and circular Dirichlet-window smoothing.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, ReadFrame, Write1D};
use crate::spectral::coherence::normalize;
use crate::spectral::traits::{CoherenceEstimate2D, DensityEstimate2D};
use crate::spectral::validate::ensure_sane_time_series;
use alloc::string::ToString;
use alloc::vec::Vec;
use itertools::Itertools;
use ndarray::{concatenate, s, Array1, Array3, Axis};
use rustfft::num_complex::Complex;
use spectral_coherence_core::fourier::{ascending_order, fft_ortho, fftfreq};
use spectral_coherence_core::{convolve, ConvolveMode};

/// Whether `b` is a usable smoothing parameter for an `n_samples`-point
/// series: strictly positive, odd, and smaller than the series length.
///
/// Oddness makes the symmetric window of `(b - 1) / 2` neighbors on each
/// side well defined.
pub fn is_b_valid(b: usize, n_samples: usize) -> bool {
    b > 0 && b < n_samples && b % 2 == 1
}

/// Round half-way cases to the nearest even integer, as numpy does.
///
/// Plain `f64::round` rounds half away from zero and would shift the
/// selected frequency grid by one bin at exact midpoints.
fn round_half_even(v: f64) -> f64 {
    let floor = v.floor();
    let rem = v - floor;
    if rem < 0.5 {
        floor
    } else if rem > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}

/// Select `min(n, target_count)` indices from `0..n`, spaced as uniformly
/// as rounding allows; first and last index are always included once
/// `n > target_count`.
pub fn select_indices(n: usize, target_count: usize) -> Vec<usize> {
    if n <= target_count {
        return (0..n).collect();
    }
    if target_count == 1 {
        return alloc::vec![0];
    }
    let step = (n - 1) as f64 / (target_count - 1) as f64;
    (0..target_count)
        .map(|i| round_half_even(i as f64 * step) as usize)
        .collect()
}

/// Boolean mask selecting every `b`-th raw frequency index starting at 0.
///
/// These are the raw Fourier bins aligned with an analysis grid whose
/// resolution is `b / n_samples` of the sample rate; the factored path's
/// default frequency grid is exactly these rows of the ascending grid.
pub fn b_spaced_mask(n_samples: usize, b: usize) -> Array1<bool> {
    let mut mask = Array1::from_elem(n_samples, false);
    for i in (0..n_samples).step_by(b) {
        mask[i] = true;
    }
    mask
}

fn conv_failure(err: spectral_coherence_core::Error) -> ExecInvariantViolation {
    ExecInvariantViolation::InvalidInput {
        report: err.to_string(),
    }
}

/// Raw cross-periodogram of `x` at each Fourier frequency.
///
/// The orthonormalized transform and its frequencies are reordered into
/// ascending frequency order before anything else; the circular-neighbor
/// logic downstream depends on that ordering. When `n_max_freqs` is given
/// (with matching `b`), the frequency grid is subsampled, keeping the
/// `(b - 1) / 2` circular neighbors around each selected bin as smoothing
/// context. The returned mask marks exactly the originally-selected
/// frequencies; neighbor bins are context only and are never reported as
/// validly estimated.
///
/// Returns `(stack, freqs, mask)` where `stack[f]` is the rank-1 Hermitian
/// outer product of the frequency-`f` Fourier coefficient vector.
pub fn periodogram<I>(
    x: &I,
    n_max_freqs: Option<usize>,
    b: Option<usize>,
) -> Result<(Array3<Complex<f64>>, Array1<f64>, Array1<bool>), ExecInvariantViolation>
where
    I: ReadFrame<Complex<f64>> + ?Sized,
{
    let selection = match (n_max_freqs, b) {
        (Some(target), Some(b)) => Some((target, b)),
        (None, None) => None,
        _ => {
            return Err(ConfigError::ConflictingArguments {
                reason: "n_max_freqs and B must be either both absent or both present",
            }
            .into())
        }
    };
    if let Some((target, b)) = selection {
        if target == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "n_max_freqs",
                reason: "n_max_freqs must be positive",
            }
            .into());
        }
        if b == 0 || b % 2 == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "B",
                reason: "B must be a positive odd integer",
            }
            .into());
        }
    }

    let x = x.read_frame()?;
    let (n, m) = x.dim();
    if n == 0 {
        return Err(ConfigError::EmptyInput { arg: "x" }.into());
    }

    let coeffs = fft_ortho(x);
    let freqs = fftfreq(n);
    let order = ascending_order(freqs.view());
    let freqs = freqs.select(Axis(0), &order);
    let coeffs = coeffs.select(Axis(0), &order);

    let (coeffs, freqs, mask) = if let Some((target, b)) = selection {
        let selected = select_indices(n, target);
        let half = (b - 1) as isize / 2;
        let retained: Vec<usize> = selected
            .iter()
            .flat_map(|&i| {
                (-half..=half).map(move |off| (i as isize + off).rem_euclid(n as isize) as usize)
            })
            .unique()
            .sorted()
            .collect();
        let mask = Array1::from_iter(
            retained
                .iter()
                .map(|idx| selected.binary_search(idx).is_ok()),
        );
        (
            coeffs.select(Axis(0), &retained),
            freqs.select(Axis(0), &retained),
            mask,
        )
    } else {
        (coeffs, freqs, Array1::from_elem(n, true))
    };

    let rows = freqs.len();
    let mut stack = Array3::zeros((rows, m, m));
    for f in 0..rows {
        for l in 0..m {
            for k in 0..m {
                stack[[f, l, k]] = coeffs[[f, l]] * coeffs[[f, k]].conj();
            }
        }
    }
    Ok((stack, freqs, mask))
}

/// Circular moving average of a matrix stack along the frequency axis,
/// using the length-`b` Dirichlet (rectangular) window.
///
/// Averaging `b` adjacent bins cuts the estimator variance by roughly a
/// factor of `b` at the cost of frequency resolution; this bias/variance
/// tradeoff is the statistical point of the smoother. The axis is treated
/// as circular: `(b - 1) / 2` rows copied from the opposite end pad the
/// stack before a valid-mode linear convolution, so output length equals
/// input length. With `b = 1` the transform is the identity.
pub fn smooth(
    stack: &Array3<Complex<f64>>,
    b: usize,
) -> Result<Array3<Complex<f64>>, ExecInvariantViolation> {
    if b == 0 || b % 2 == 0 {
        return Err(ExecInvariantViolation::InvalidState {
            reason: "smoothing window length must be a positive odd integer",
        });
    }
    let (rows, m, _) = stack.dim();
    if b > rows {
        return Err(ExecInvariantViolation::InvalidState {
            reason: "smoothing window length exceeds the number of frequency rows",
        });
    }

    let half = (b - 1) / 2;
    let padded = if half == 0 {
        stack.to_owned()
    } else {
        concatenate(
            Axis(0),
            &[
                stack.slice(s![rows - half.., .., ..]),
                stack.view(),
                stack.slice(s![..half, .., ..]),
            ],
        )
        .map_err(|_| ExecInvariantViolation::InvalidState {
            reason: "failed to pad the frequency axis for circular smoothing",
        })?
    };

    // The stack is complex but the window is real, so each matrix entry's
    // lane is smoothed as two real convolutions.
    let window = Array1::from_elem(b, 1.0 / b as f64);
    let mut out = Array3::zeros((rows, m, m));
    for l in 0..m {
        for k in 0..m {
            let lane = padded.slice(s![.., l, k]);
            let re: Array1<f64> = lane.mapv(|c| c.re);
            let im: Array1<f64> = lane.mapv(|c| c.im);
            let re = convolve(re.view(), window.view(), ConvolveMode::Valid)
                .map_err(conv_failure)?;
            let im = convolve(im.view(), window.view(), ConvolveMode::Valid)
                .map_err(conv_failure)?;
            for f in 0..rows {
                out[[f, l, k]] = Complex::new(re[f], im[f]);
            }
        }
    }
    Ok(out)
}

/// Smoothed-periodogram estimate of the cross-spectral density.
///
/// This is the direct path's entry point and the one place input sanity is
/// checked (the factored path assumes pre-validated arrays). Frequencies
/// whose smoothing window would mix bins that were not retained are
/// filtered out by the estimation mask, so every reported frequency is
/// averaged over its true circular neighbors.
pub fn smoothed_periodogram<I>(
    x: &I,
    b: usize,
    n_max_freqs: Option<usize>,
) -> Result<(Array3<Complex<f64>>, Array1<f64>), ExecInvariantViolation>
where
    I: ReadFrame<Complex<f64>> + ?Sized,
{
    let frame = x.read_frame()?;
    ensure_sane_time_series(&frame)?;
    let n = frame.nrows();
    if !is_b_valid(b, n) {
        return Err(ConfigError::InvalidArgument {
            arg: "B",
            reason: "B must be a positive odd integer smaller than the number of samples",
        }
        .into());
    }

    let (stack, freqs, mask) = periodogram(&frame, n_max_freqs, n_max_freqs.map(|_| b))?;
    let smoothed = smooth(&stack, b)?;

    let kept: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter_map(|(i, &keep)| keep.then_some(i))
        .collect();
    Ok((
        smoothed.select(Axis(0), &kept),
        freqs.select(Axis(0), &kept),
    ))
}

/// Constructor config for [`DirectSpectralKernel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectSpectralConfig {
    /// Smoothing window length; positive odd integer below the sample count.
    pub b: usize,
    /// Optional cap on the number of reported frequencies.
    pub n_max_freqs: Option<usize>,
}

/// Trait-first direct-path estimator: FFT periodogram plus circular
/// Dirichlet smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectSpectralKernel {
    b: usize,
    n_max_freqs: Option<usize>,
}

impl DirectSpectralKernel {
    fn expected_rows(&self, n_samples: usize) -> usize {
        match self.n_max_freqs {
            Some(target) => target.min(n_samples),
            None => n_samples,
        }
    }
}

impl KernelLifecycle for DirectSpectralKernel {
    type Config = DirectSpectralConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        if config.b == 0 || config.b % 2 == 0 {
            return Err(ConfigError::InvalidArgument {
                arg: "b",
                reason: "B must be a positive odd integer",
            });
        }
        if config.n_max_freqs == Some(0) {
            return Err(ConfigError::InvalidArgument {
                arg: "n_max_freqs",
                reason: "n_max_freqs must be positive",
            });
        }
        Ok(Self {
            b: config.b,
            n_max_freqs: config.n_max_freqs,
        })
    }
}

impl DensityEstimate2D<f64> for DirectSpectralKernel {
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

        let (s, f) = smoothed_periodogram(&frame, self.b, self.n_max_freqs)?;
        density.assign(&s);
        for (dst, src) in freqs_out.iter_mut().zip(f.iter()) {
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
        smoothed_periodogram(x, self.b, self.n_max_freqs)
    }
}

impl CoherenceEstimate2D<f64> for DirectSpectralKernel {
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

        let (c, f) = CoherenceEstimate2D::run_alloc(self, &frame)?;
        coherence.assign(&c);
        for (dst, src) in freqs_out.iter_mut().zip(f.iter()) {
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
        let (s, f) = smoothed_periodogram(x, self.b, self.n_max_freqs)?;
        Ok((normalize(&s)?, f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    fn ramp() -> Array2<Complex<f64>> {
        array![
            [Complex::new(1.0, 0.0)],
            [Complex::new(2.0, 0.0)],
            [Complex::new(3.0, 0.0)],
            [Complex::new(4.0, 0.0)],
            [Complex::new(5.0, 0.0)],
        ]
    }

    fn two_tone(n: usize) -> Array2<Complex<f64>> {
        Array2::from_shape_fn((n, 2), |(t, c)| {
            let t = t as f64;
            let base = (2.0 * core::f64::consts::PI * t / n as f64).sin();
            let fast = (4.0 * core::f64::consts::PI * t / n as f64).cos();
            Complex::new(base + 0.25 * fast + 0.1 * c as f64 * fast, 0.0)
        })
    }

    #[test]
    fn b_validity_truth_table() {
        assert!(!is_b_valid(0, 5));
        assert!(!is_b_valid(2, 5));
        assert!(!is_b_valid(4, 5));
        assert!(!is_b_valid(5, 5));
        assert!(!is_b_valid(7, 5));
        assert!(is_b_valid(1, 5));
        assert!(is_b_valid(3, 5));
    }

    #[test]
    fn select_indices_matches_numpy_rounding() {
        assert_eq!(select_indices(10, 3), vec![0, 4, 9]);
        assert_eq!(select_indices(5, 10), vec![0, 1, 2, 3, 4]);
        assert_eq!(select_indices(5, 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(select_indices(7, 1), vec![0]);
    }

    #[test]
    fn b_spaced_mask_marks_every_bth_bin() {
        let mask = b_spaced_mask(7, 3);
        assert_eq!(
            mask,
            array![true, false, false, true, false, false, true]
        );
    }

    #[test]
    fn periodogram_of_ramp_matches_known_ordinates() {
        let x = ramp();
        let (stack, freqs, mask) = periodogram(&x, None, None).unwrap();

        for (freq, expected) in freqs.iter().zip([-0.4, -0.2, 0.0, 0.2, 0.4]) {
            assert_abs_diff_eq!(*freq, expected, epsilon = 1e-12);
        }
        assert!(mask.iter().all(|&m| m));

        // DC carries the squared magnitude of the orthonormal mean; the two
        // nonzero-frequency pairs are symmetric across zero.
        let expected = [1.381_966_011_250_105, 3.618_033_988_749_895, 45.0];
        assert_abs_diff_eq!(stack[[2, 0, 0]].re, expected[2], epsilon = 1e-9);
        for (row, value) in [(0, expected[0]), (1, expected[1]), (3, expected[1]), (4, expected[0])] {
            assert_abs_diff_eq!(stack[[row, 0, 0]].re, value, epsilon = 1e-9);
            assert_abs_diff_eq!(stack[[row, 0, 0]].im, 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn periodogram_rejects_half_specified_selection() {
        let x = ramp();
        let err = periodogram(&x, Some(3), None).expect_err("pairing rule");
        assert!(matches!(
            err,
            ExecInvariantViolation::Config(ConfigError::ConflictingArguments { .. })
        ));

        let err = periodogram(&x, Some(0), Some(3)).expect_err("positivity");
        assert!(matches!(
            err,
            ExecInvariantViolation::Config(ConfigError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn circular_smoothing_wraps_at_the_ends() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let stack = Array3::from_shape_fn((5, 1, 1), |(f, _, _)| Complex::new(values[f], 0.0));
        let smoothed = smooth(&stack, 3).unwrap();

        let expected = [8.0 / 3.0, 2.0, 3.0, 4.0, 10.0 / 3.0];
        for f in 0..5 {
            assert_abs_diff_eq!(smoothed[[f, 0, 0]].re, expected[f], epsilon = 1e-12);
            assert_abs_diff_eq!(smoothed[[f, 0, 0]].im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn unit_window_smoothing_is_identity() {
        let x = two_tone(8);
        let (stack, _, _) = periodogram(&x, None, None).unwrap();
        let smoothed = smooth(&stack, 1).unwrap();
        for (a, b) in stack.iter().zip(smoothed.iter()) {
            assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-12);
            assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn smoothed_density_is_hermitian_with_nonnegative_diagonal() {
        let x = two_tone(16);
        let (s, freqs) = smoothed_periodogram(&x, 5, None).unwrap();
        assert_eq!(s.dim(), (16, 2, 2));
        assert_eq!(freqs.len(), 16);
        for f in 0..16 {
            for l in 0..2 {
                for k in 0..2 {
                    let a = s[[f, l, k]];
                    let b = s[[f, k, l]].conj();
                    assert_abs_diff_eq!(a.re, b.re, epsilon = 1e-10);
                    assert_abs_diff_eq!(a.im, b.im, epsilon = 1e-10);
                }
                assert!(s[[f, l, l]].re >= 0.0);
                assert_abs_diff_eq!(s[[f, l, l]].im, 0.0, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn frequency_selection_reports_only_selected_bins() {
        let x = two_tone(16);
        let (s, freqs) = smoothed_periodogram(&x, 3, Some(4)).unwrap();
        assert_eq!(s.dim(), (4, 2, 2));
        assert_eq!(freqs.len(), 4);

        // Reported frequencies are exactly the uniformly-selected rows of
        // the full ascending grid.
        let full = {
            let raw = spectral_coherence_core::fourier::fftfreq(16);
            let order =
                spectral_coherence_core::fourier::ascending_order(raw.view());
            raw.select(Axis(0), &order)
        };
        for (freq, &idx) in freqs.iter().zip(select_indices(16, 4).iter()) {
            assert_abs_diff_eq!(*freq, full[idx], epsilon = 1e-12);
        }
    }

    #[test]
    fn selection_agrees_with_full_grid_smoothing() {
        let x = two_tone(16);
        let (full, full_freqs) = smoothed_periodogram(&x, 3, None).unwrap();
        let (subset, subset_freqs) = smoothed_periodogram(&x, 3, Some(4)).unwrap();

        for (row, freq) in subset_freqs.iter().enumerate() {
            let full_row = full_freqs
                .iter()
                .position(|f| (f - freq).abs() < 1e-12)
                .expect("subset frequency present in full grid");
            for l in 0..2 {
                for k in 0..2 {
                    assert_abs_diff_eq!(
                        subset[[row, l, k]].re,
                        full[[full_row, l, k]].re,
                        epsilon = 1e-10
                    );
                    assert_abs_diff_eq!(
                        subset[[row, l, k]].im,
                        full[[full_row, l, k]].im,
                        epsilon = 1e-10
                    );
                }
            }
        }
    }

    #[test]
    fn insane_input_reports_every_violation() {
        let x = array![[Complex::new(f64::NAN, 0.0)]];
        let err = smoothed_periodogram(&x, 1, None).expect_err("insane input");
        match err {
            ExecInvariantViolation::InvalidInput { report } => {
                assert_eq!(report.lines().count(), 2);
            }
            other => panic!("expected aggregated input report, got {other:?}"),
        }
    }

    #[test]
    fn oversized_b_is_rejected_at_run_time() {
        let x = ramp();
        let err = smoothed_periodogram(&x, 7, None).expect_err("B >= n");
        assert!(matches!(
            err,
            ExecInvariantViolation::Config(ConfigError::InvalidArgument { arg: "B", .. })
        ));
    }

    #[test]
    fn kernel_contracts_validate_config_and_output_shape() {
        assert!(DirectSpectralKernel::try_new(DirectSpectralConfig {
            b: 2,
            n_max_freqs: None,
        })
        .is_err());
        assert!(DirectSpectralKernel::try_new(DirectSpectralConfig {
            b: 3,
            n_max_freqs: Some(0),
        })
        .is_err());

        let kernel = DirectSpectralKernel::try_new(DirectSpectralConfig {
            b: 3,
            n_max_freqs: None,
        })
        .expect("valid config");
        let x = two_tone(8);
        let mut density = Array3::zeros((7, 2, 2));
        let mut freqs = vec![0.0; 8];
        let err = DensityEstimate2D::run_into(&kernel, &x, &mut density, &mut freqs)
            .expect_err("mismatched output shape should error");
        assert!(matches!(err, ExecInvariantViolation::LengthMismatch { .. }));
    }

    #[test]
    fn kernel_run_alloc_matches_free_function() {
        let kernel = DirectSpectralKernel::try_new(DirectSpectralConfig {
            b: 3,
            n_max_freqs: None,
        })
        .expect("valid config");
        let x = two_tone(8);
        let (s_kernel, f_kernel) = DensityEstimate2D::run_alloc(&kernel, &x).unwrap();
        let (s_free, f_free) = smoothed_periodogram(&x, 3, None).unwrap();
        assert_eq!(f_kernel, f_free);
        assert_eq!(s_kernel, s_free);
    }
}

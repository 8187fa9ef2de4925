//! Coherence: the spectral density rescaled so every channel has unit
//! power at every frequency.

use crate::kernel::ExecInvariantViolation;
use crate::spectral::DIAG_EPS;
use ndarray::Array3;
use rustfft::num_complex::Complex;

/// Rescale each frequency's density matrix by the diagonal congruence
/// `D S D` with `D = diag(S)^(-1/2)`.
///
/// The result has a unit diagonal, and each off-diagonal entry is the
/// complex coherence of the channel pair with squared modulus in
/// `[0, 1]`. A diagonal entry below [`DIAG_EPS`] means a channel carries
/// essentially no power at that frequency and the rescaling is undefined
/// there, so the whole estimate is rejected rather than returned with a
/// silently unstable row.
pub fn normalize(
    density: &Array3<Complex<f64>>,
) -> Result<Array3<Complex<f64>>, ExecInvariantViolation> {
    let (rows, m, _) = density.dim();
    let mut out = Array3::zeros((rows, m, m));
    for f in 0..rows {
        let mut inv_scale = alloc::vec![0.0; m];
        for (l, slot) in inv_scale.iter_mut().enumerate() {
            let power = density[[f, l, l]].re;
            if !(power > DIAG_EPS) {
                return Err(ExecInvariantViolation::Degenerate {
                    arg: "density",
                    index: f,
                });
            }
            *slot = 1.0 / power.sqrt();
        }
        for l in 0..m {
            for k in 0..m {
                out[[f, l, k]] = density[[f, l, k]] * (inv_scale[l] * inv_scale[k]);
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectral::density::smoothed_periodogram;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};

    #[test]
    fn normalization_rescales_by_the_diagonal() {
        let density = Array3::from_shape_fn((1, 2, 2), |(_, l, k)| {
            Complex::new([[1.0, 2.0], [3.0, 4.0]][l][k], 0.0)
        });
        let c = normalize(&density).unwrap();
        assert_abs_diff_eq!(c[[0, 0, 0]].re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c[[0, 0, 1]].re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(c[[0, 1, 0]].re, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(c[[0, 1, 1]].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_diagonal_is_rejected_with_its_row() {
        let mut density = Array3::from_shape_fn((3, 2, 2), |(_, l, k)| {
            Complex::new(if l == k { 2.0 } else { 0.5 }, 0.0)
        });
        density[[1, 1, 1]] = Complex::new(0.0, 0.0);
        let err = normalize(&density).expect_err("zero-power channel");
        assert_eq!(
            err,
            ExecInvariantViolation::Degenerate {
                arg: "density",
                index: 1,
            }
        );
    }

    #[test]
    fn unsmoothed_coherence_has_unit_modulus_off_the_diagonal() {
        // With B = 1 each density matrix is rank one, so every channel pair
        // is perfectly coherent and only the phase is informative.
        let x: Array2<Complex<f64>> = array![
            [Complex::new(1.0, 0.0), Complex::new(2.0, 0.0)],
            [Complex::new(2.0, 0.0), Complex::new(-3.0, 0.0)],
            [Complex::new(3.0, 0.0), Complex::new(4.0, 0.0)],
        ];
        let (s, freqs) = smoothed_periodogram(&x, 1, None).unwrap();
        let c = normalize(&s).unwrap();

        for (freq, expected) in freqs.iter().zip([-1.0 / 3.0, 0.0, 1.0 / 3.0]) {
            assert_abs_diff_eq!(*freq, expected, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(c[[0, 0, 1]].re, 0.277_350_098_112_614_56, epsilon = 1e-9);
        assert_abs_diff_eq!(c[[0, 0, 1]].im, -0.960_768_922_830_522_5, epsilon = 1e-9);
        assert_abs_diff_eq!(c[[1, 0, 1]].re, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(c[[1, 0, 1]].im, 0.0, epsilon = 1e-9);
        for f in 0..3 {
            assert_abs_diff_eq!(c[[f, 0, 1]].norm(), 1.0, epsilon = 1e-9);
            for l in 0..2 {
                assert_abs_diff_eq!(c[[f, l, l]].re, 1.0, epsilon = 1e-9);
                assert_abs_diff_eq!(c[[f, l, l]].im, 0.0, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn smoothed_coherence_magnitude_is_bounded_by_one() {
        // Off-grid tones leak into every Fourier bin, keeping the diagonal
        // away from the degeneracy guard at all frequencies.
        let x = Array2::from_shape_fn((16, 2), |(t, chan)| {
            let t = t as f64;
            let tone = (1.3 * t).sin() + 0.4 * (0.7 * t).cos();
            let lagged = (1.3 * (t - 1.0)).sin() + 0.4 * (0.7 * (t - 1.0)).cos();
            Complex::new(if chan == 0 { tone } else { lagged }, 0.0)
        });
        let (s, _) = smoothed_periodogram(&x, 5, None).unwrap();
        let c = normalize(&s).unwrap();
        for f in 0..16 {
            assert!(c[[f, 0, 1]].norm_sqr() <= 1.0 + 1e-10);
            assert_abs_diff_eq!(c[[f, 0, 0]].re, 1.0, epsilon = 1e-10);
            assert_abs_diff_eq!(c[[f, 1, 1]].re, 1.0, epsilon = 1e-10);
        }
    }
}

//! Orthonormal FFT and Fourier-frequency helpers for column-major signals.

use alloc::vec;
use alloc::vec::Vec;
use core::cmp::Ordering;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rustfft::{num_complex::Complex, FftPlanner};

/// Orthonormalized discrete Fourier transform along the sample axis.
///
/// Each of the `m` columns of the `n x m` input is transformed independently
/// and scaled by `1 / sqrt(n)`, so Parseval holds with unit constant and the
/// squared magnitude of a coefficient is directly a periodogram ordinate.
pub fn fft_ortho(x: ArrayView2<Complex<f64>>) -> Array2<Complex<f64>> {
    let (n, m) = x.dim();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n);
    let scale = 1.0 / (n as f64).sqrt();

    let mut out = Array2::zeros((n, m));
    let mut buf = vec![Complex::new(0.0, 0.0); n];
    for col in 0..m {
        for (dst, src) in buf.iter_mut().zip(x.column(col).iter()) {
            *dst = *src;
        }
        fft.process(&mut buf);
        for (row, value) in buf.iter().enumerate() {
            out[[row, col]] = *value * scale;
        }
    }
    out
}

/// Fourier frequencies of an `n`-point transform in cycles per sample,
/// in FFT output order: non-negative frequencies first, then negative ones.
///
/// Matches `numpy.fft.fftfreq(n)`.
pub fn fftfreq(n: usize) -> Array1<f64> {
    let nf = n as f64;
    let positive = (n - 1) / 2 + 1;
    Array1::from_iter((0..n).map(|k| {
        if k < positive {
            k as f64 / nf
        } else {
            // One exact division; `k / n - 1` rounds twice and drifts off
            // the reference values.
            (k as f64 - nf) / nf
        }
    }))
}

/// Indices that put `values` into ascending order.
///
/// Ordering is resolved through explicit index arrays rather than slicing so
/// callers can apply the same permutation to parallel arrays.
pub fn ascending_order(values: ArrayView1<f64>) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn fftfreq_matches_numpy_even_and_odd() {
        let even = fftfreq(4);
        assert_eq!(even, array![0.0, 0.25, -0.5, -0.25]);

        let odd = fftfreq(5);
        assert_eq!(odd, array![0.0, 0.2, 0.4, -0.4, -0.2]);

        // Exact equality matters: the shallowest negative frequency is the
        // one a `k/n - 1` formulation rounds away from.
        assert_eq!(fftfreq(10)[9], -0.1);
    }

    #[test]
    fn ascending_order_sorts_fft_frequencies() {
        let freqs = fftfreq(5);
        let order = ascending_order(freqs.view());
        assert_eq!(order, vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn fft_ortho_dc_coefficient_is_scaled_sum() {
        let x = array![
            [Complex::new(1.0, 0.0)],
            [Complex::new(2.0, 0.0)],
            [Complex::new(3.0, 0.0)],
            [Complex::new(4.0, 0.0)],
            [Complex::new(5.0, 0.0)],
        ];
        let coeffs = fft_ortho(x.view());
        assert_abs_diff_eq!(coeffs[[0, 0]].re, 15.0 / 5f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(coeffs[[0, 0]].im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn fft_ortho_preserves_energy() {
        let x = array![
            [Complex::new(1.0, -1.0), Complex::new(0.5, 0.0)],
            [Complex::new(-2.0, 0.25), Complex::new(1.5, 2.0)],
            [Complex::new(0.75, 3.0), Complex::new(-1.0, 0.0)],
        ];
        let coeffs = fft_ortho(x.view());
        let time_energy: f64 = x.iter().map(|c| c.norm_sqr()).sum();
        let freq_energy: f64 = coeffs.iter().map(|c| c.norm_sqr()).sum();
        assert_abs_diff_eq!(time_energy, freq_energy, epsilon = 1e-10);
    }
}

use crate::{Error, Result};
use alloc::string::ToString;
use ndarray::{Array1, ArrayView1};
use ndarray_conv::{ConvExt, ConvMode, PaddingMode};

/// Convolution mode determines behavior near edges and output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvolveMode {
    /// Full convolution, output size is `a.len() + v.len() - 1`.
    Full,
    /// Valid convolution, output size is `a.len() - v.len() + 1`; the result
    /// is only given where the sequences overlap completely.
    Valid,
    /// Same convolution, output size is `a.len()`.
    Same,
}

/// Discrete linear convolution of two one-dimensional sequences, with
/// numpy-style output modes.
///
/// `v` is taken as the convolution kernel and is expected to be no longer
/// than `a`. The estimator crate drives this with [`ConvolveMode::Valid`]
/// after padding its input, so the windowed average has exactly the input
/// length.
///
/// # Examples
/// ```
/// use ndarray::array;
/// use spectral_coherence_core::{convolve, ConvolveMode};
///
/// let a = array![1., 2., 3., 4.];
/// let v = array![0.5, 0.5];
///
/// let valid = convolve((&a).into(), (&v).into(), ConvolveMode::Valid).unwrap();
/// assert_eq!(valid, array![1.5, 2.5, 3.5]);
///
/// let full = convolve((&a).into(), (&v).into(), ConvolveMode::Full).unwrap();
/// assert_eq!(full, array![0.5, 1.5, 2.5, 3.5, 2.0]);
/// ```
pub fn convolve<T>(a: ArrayView1<T>, v: ArrayView1<T>, mode: ConvolveMode) -> Result<Array1<T>>
where
    T: num_traits::NumAssign + core::marker::Copy,
{
    let conv_mode = match mode {
        ConvolveMode::Full => ConvMode::Full,
        ConvolveMode::Valid => ConvMode::Valid,
        ConvolveMode::Same => ConvMode::Same,
    };
    // The backend correlates; convolution requires the flipped kernel.
    let flipped = Array1::from_iter(v.iter().rev().copied());
    a.conv(&flipped, conv_mode, PaddingMode::Zeros)
        .map_err(|e| Error::Conv {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod linear_convolve {
    use super::*;
    use ndarray::array;

    #[test]
    fn full() {
        let a = array![1., 2., 3.];
        let v = array![0., 1., 0.5];

        let expected = array![0., 1., 2.5, 4., 1.5];
        let result = convolve((&a).into(), (&v).into(), ConvolveMode::Full).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn same() {
        let a = array![1., 2., 3.];
        let v = array![0., 1., 0.5];

        let expected = array![1., 2.5, 4.];
        let result = convolve((&a).into(), (&v).into(), ConvolveMode::Same).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn valid() {
        let a = array![1., 2., 3.];
        let v = array![0., 1., 0.5];

        let expected = array![2.5];
        let result = convolve((&a).into(), (&v).into(), ConvolveMode::Valid).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn delayed_impulse_kernel_shifts_rather_than_advances() {
        // Correlation would advance the sequence; convolution delays it.
        let a = array![1., 2., 3.];
        let v = array![0., 0., 1.];

        let expected = array![0., 0., 1., 2., 3.];
        let result = convolve((&a).into(), (&v).into(), ConvolveMode::Full).unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn valid_with_unit_kernel_is_identity() {
        let a = array![4., -1., 7.];
        let v = array![1.];

        let result = convolve((&a).into(), (&v).into(), ConvolveMode::Valid).unwrap();
        assert_eq!(result, a);
    }
}

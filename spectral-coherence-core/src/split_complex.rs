//! Complex arrays as paired real/imaginary storage.
//!
//! The factored estimation path targets array hardware that exposes only
//! real-valued storage and contraction primitives. [`SplitComplex`] keeps a
//! complex array as two real arrays and synthesizes conjugation, products,
//! and matrix multiplication from paired real operations:
//! `(ar*br - ai*bi) + i(ar*bi + ai*br)`. Call sites stay dtype-agnostic and
//! never rely on a native complex matmul existing.

use crate::{Error, Result};
use alloc::format;
use ndarray::{Array, ArrayBase, Axis, Data, Dimension, Ix2, Ix3, LinalgScalar, Zip};
use num_complex::Complex;
use num_traits::Float;

/// A complex array held as separate real and imaginary planes.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitComplex<T, D: Dimension> {
    /// Real plane.
    pub re: Array<T, D>,
    /// Imaginary plane.
    pub im: Array<T, D>,
}

impl<T, D> SplitComplex<T, D>
where
    T: Float,
    D: Dimension,
{
    /// Pair two real planes of identical shape.
    pub fn from_parts(re: Array<T, D>, im: Array<T, D>) -> Result<Self> {
        if re.raw_dim() != im.raw_dim() {
            return Err(Error::Shape {
                reason: format!(
                    "real plane {:?} and imaginary plane {:?} differ",
                    re.shape(),
                    im.shape()
                ),
            });
        }
        Ok(Self { re, im })
    }

    /// Split a complex array into its planes.
    pub fn from_complex<S>(a: &ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = Complex<T>>,
    {
        Self {
            re: a.mapv(|c| c.re),
            im: a.mapv(|c| c.im),
        }
    }

    /// Recombine the planes into a complex array.
    pub fn into_complex(&self) -> Array<Complex<T>, D> {
        Zip::from(&self.re)
            .and(&self.im)
            .map_collect(|&r, &i| Complex::new(r, i))
    }

    /// Complex conjugate: the imaginary plane is negated.
    pub fn conj(&self) -> Self {
        Self {
            re: self.re.clone(),
            im: self.im.mapv(|v| -v),
        }
    }

    /// Multiply both planes by a real scalar.
    pub fn scale(&self, s: T) -> Self {
        Self {
            re: self.re.mapv(|v| v * s),
            im: self.im.mapv(|v| v * s),
        }
    }

    /// Elementwise squared modulus, `re^2 + im^2`, as a real array.
    pub fn squared_modulus(&self) -> Array<T, D> {
        Zip::from(&self.re)
            .and(&self.im)
            .map_collect(|&r, &i| r * r + i * i)
    }
}

impl<T> SplitComplex<T, Ix2>
where
    T: Float + LinalgScalar,
{
    /// Complex matrix product from four real matrix products.
    ///
    /// Shapes follow `ndarray::Dot`; callers are responsible for
    /// compatibility, as with a native matmul.
    pub fn matmul(&self, rhs: &SplitComplex<T, Ix2>) -> SplitComplex<T, Ix2> {
        let re = self.re.dot(&rhs.re) - self.im.dot(&rhs.im);
        let im = self.re.dot(&rhs.im) + self.im.dot(&rhs.re);
        SplitComplex { re, im }
    }

    /// Owned transpose of both planes.
    pub fn t(&self) -> SplitComplex<T, Ix2> {
        SplitComplex {
            re: self.re.t().to_owned(),
            im: self.im.t().to_owned(),
        }
    }
}

impl<T> SplitComplex<T, Ix3>
where
    T: Float,
{
    /// Owned copy of the 2-D frame at `index` along the leading axis.
    pub fn index_frame(&self, index: usize) -> SplitComplex<T, Ix2> {
        SplitComplex {
            re: self.re.index_axis(Axis(0), index).to_owned(),
            im: self.im.index_axis(Axis(0), index).to_owned(),
        }
    }
}

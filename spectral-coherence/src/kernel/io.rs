use super::ConfigError;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use ndarray::{Array2, ArrayView2};

/// Adapter trait for reading contiguous 1D input.
pub trait Read1D<T> {
    /// Borrow the underlying input as a contiguous slice.
    fn read_slice(&self) -> Result<&[T], ConfigError>;
}

/// Adapter trait for writing contiguous 1D output.
pub trait Write1D<T> {
    /// Borrow the underlying output as a mutable contiguous slice.
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError>;
}

/// Adapter trait for reading a samples-by-channels input frame.
///
/// Estimator kernels consume their multichannel input through this adapter
/// so that owned arrays and borrowed views are treated alike.
pub trait ReadFrame<T> {
    /// Borrow the underlying input as a 2-D view, samples along axis 0.
    fn read_frame(&self) -> Result<ArrayView2<'_, T>, ConfigError>;
}

impl<T> Read1D<T> for [T] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T> Write1D<T> for [T] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Read1D<T> for [T; N] {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self)
    }
}

impl<T, const N: usize> Write1D<T> for [T; N] {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self)
    }
}

#[cfg(feature = "alloc")]
impl<T> Read1D<T> for Vec<T> {
    fn read_slice(&self) -> Result<&[T], ConfigError> {
        Ok(self.as_slice())
    }
}

#[cfg(feature = "alloc")]
impl<T> Write1D<T> for Vec<T> {
    fn write_slice_mut(&mut self) -> Result<&mut [T], ConfigError> {
        Ok(self.as_mut_slice())
    }
}

impl<T> ReadFrame<T> for Array2<T> {
    fn read_frame(&self) -> Result<ArrayView2<'_, T>, ConfigError> {
        Ok(self.view())
    }
}

impl<T> ReadFrame<T> for ArrayView2<'_, T> {
    fn read_frame(&self) -> Result<ArrayView2<'_, T>, ConfigError> {
        Ok(self.view())
    }
}

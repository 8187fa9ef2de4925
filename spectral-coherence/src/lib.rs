//! Frequency-domain spectral density and coherence estimation for
//! multivariate time series.
//!
//! Given `n` time-ordered samples of `m` channels, the estimators produce,
//! for a set of Fourier frequencies, an `m x m` complex Hermitian matrix per
//! frequency: the smoothed cross-spectral density, and the coherence
//! (density normalized to unit diagonal). Two independent computation paths
//! implement the same contract:
//!
//! - the **direct path** ([`spectral::density`], [`spectral::coherence`]):
//!   orthonormal FFT, per-bin rank-1 periodogram, circular Dirichlet-window
//!   smoothing across frequency;
//! - the **factored path** ([`spectral::factored`]): an explicit Fourier
//!   projection tensor folds the smoothing window into a per-frequency
//!   low-rank "half-periodogram" factor, suited to array hardware built for
//!   dense contraction rather than transcendental-heavy FFTs. Its complex
//!   arithmetic is synthesized from paired real operations.
//!
//! A time-domain [`spectral::lag_window`] estimator evaluable at arbitrary
//! frequencies rounds out the surface for cross-validation.
//!
//! Estimators follow the trait-first kernel convention: a `Config` struct
//! validated by [`kernel::KernelLifecycle::try_new`], capability traits with
//! `run_into`/`run_alloc` entry points, and checked error enums instead of
//! panics.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod error;
pub mod kernel;
#[cfg(feature = "std")]
pub mod spectral;

//! Shared trait-first kernel substrate.
//!
//! This module defines reusable interfaces for constructor validation and
//! the buffer adapters used by the trait-first spectral kernels.

mod errors;
mod io;
mod lifecycle;

pub use errors::*;
pub use io::*;
pub use lifecycle::*;

//! Public error surface for the free-function estimator API.

use crate::kernel::{ConfigError, ExecInvariantViolation};
use core::{error, fmt};

#[cfg(feature = "alloc")]
use alloc::format;
#[cfg(feature = "alloc")]
use alloc::string::{String, ToString};

/// Errors raised whilst estimating spectral density or coherence.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// Argument passed into a function was invalid.
    #[cfg(feature = "alloc")]
    InvalidArg {
        /// The invalid arg.
        arg: String,
        /// Explaining why arg is invalid.
        reason: String,
    },
    /// Argument passed into a function was invalid.
    #[cfg(not(feature = "alloc"))]
    InvalidArg,
    /// Two or more optional arguments passed into a function conflict.
    #[cfg(feature = "alloc")]
    ConflictArg {
        /// Explaining what arg is invalid.
        reason: String,
    },
    /// Two or more optional arguments passed into a function conflict.
    #[cfg(not(feature = "alloc"))]
    ConflictArg,
    /// Execution was attempted with a violated estimator invariant.
    #[cfg(feature = "alloc")]
    ExecInvariantViolation {
        /// Why execution could not proceed.
        reason: String,
    },
    /// Execution was attempted with a violated estimator invariant.
    #[cfg(not(feature = "alloc"))]
    ExecInvariantViolation,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "alloc")]
            Error::InvalidArg { arg, reason } => {
                write!(f, "Invalid argument `{arg}`: {reason}")
            }
            #[cfg(not(feature = "alloc"))]
            Error::InvalidArg => write!(f, "Invalid argument."),
            #[cfg(feature = "alloc")]
            Error::ConflictArg { reason } => write!(f, "Conflicting arguments: {reason}"),
            #[cfg(not(feature = "alloc"))]
            Error::ConflictArg => write!(f, "Conflicting arguments."),
            #[cfg(feature = "alloc")]
            Error::ExecInvariantViolation { reason } => {
                write!(f, "Execution invariant violation: {reason}")
            }
            #[cfg(not(feature = "alloc"))]
            Error::ExecInvariantViolation => write!(f, "Execution invariant violation."),
        }
    }
}

impl error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        #[cfg(feature = "alloc")]
        {
            match value {
                ConfigError::EmptyInput { arg } => Error::InvalidArg {
                    arg: arg.to_string(),
                    reason: "input was empty".to_string(),
                },
                ConfigError::InvalidArgument { arg, reason } => Error::InvalidArg {
                    arg: arg.to_string(),
                    reason: reason.to_string(),
                },
                ConfigError::ConflictingArguments { reason } => Error::ConflictArg {
                    reason: reason.to_string(),
                },
                ConfigError::NonContiguous { arg } => Error::InvalidArg {
                    arg: arg.to_string(),
                    reason: "argument is not contiguous in memory".to_string(),
                },
                ConfigError::LengthMismatch { arg, expected, got } => Error::InvalidArg {
                    arg: arg.to_string(),
                    reason: format!("length mismatch, expected {expected}, got {got}"),
                },
            }
        }
        #[cfg(not(feature = "alloc"))]
        {
            match value {
                ConfigError::ConflictingArguments { .. } => Error::ConflictArg,
                _ => Error::InvalidArg,
            }
        }
    }
}

impl From<ExecInvariantViolation> for Error {
    fn from(value: ExecInvariantViolation) -> Self {
        match value {
            ExecInvariantViolation::Config(err) => err.into(),
            #[cfg(feature = "alloc")]
            other => Error::ExecInvariantViolation {
                reason: other.to_string(),
            },
            #[cfg(not(feature = "alloc"))]
            _ => Error::ExecInvariantViolation,
        }
    }
}

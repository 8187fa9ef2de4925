//! Time-series sanity checks for the host-side estimators.
//!
//! The reference contract also rejects non-2-D containers and non-numeric
//! dtypes; here both conditions are discharged statically by the
//! `ArrayView2<Complex<f64>>` input type, so the runtime checks cover what
//! the type system cannot: degenerate axis lengths and non-finite entries.
//! The factored path deliberately skips these checks — accelerator-resident
//! arrays are assumed pre-validated before being handed over.

use crate::kernel::ExecInvariantViolation;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use ndarray::ArrayView2;
use num_complex::Complex;

/// Every violated sanity condition for `x`, one message per condition.
///
/// An empty report means the series is usable: at least 2 samples, at least
/// 1 channel, and every entry finite in both real and imaginary parts.
pub fn time_series_report(x: &ArrayView2<Complex<f64>>) -> Vec<String> {
    let mut report = Vec::new();
    let (n, m) = x.dim();
    if n < 2 {
        report.push(format!("time series must have at least 2 samples, got {n}"));
    }
    if m < 1 {
        report.push(String::from("time series must have at least 1 channel"));
    }
    if x.iter().any(|c| !c.re.is_finite() || !c.im.is_finite()) {
        report.push(String::from(
            "time series entries must be finite, found NaN or infinite values",
        ));
    }
    report
}

/// Validity flag plus a newline-joined report of every violated condition,
/// so a caller can surface all problems at once.
pub fn is_sane_time_series(x: &ArrayView2<Complex<f64>>) -> (bool, String) {
    let report = time_series_report(x);
    (report.is_empty(), report.join("\n"))
}

pub(crate) fn ensure_sane_time_series(
    x: &ArrayView2<Complex<f64>>,
) -> Result<(), ExecInvariantViolation> {
    let (valid, report) = is_sane_time_series(x);
    if valid {
        Ok(())
    } else {
        Err(ExecInvariantViolation::InvalidInput { report })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn clean_series_passes() {
        let x = array![
            [Complex::new(1.0, 0.0)],
            [Complex::new(-2.0, 0.5)],
            [Complex::new(3.0, 0.0)],
        ];
        let (valid, message) = is_sane_time_series(&x.view());
        assert!(valid);
        assert!(message.is_empty());
    }

    #[test]
    fn every_violation_is_reported_together() {
        let x = array![[Complex::new(f64::NAN, 0.0)]];
        let report = time_series_report(&x.view());
        assert_eq!(report.len(), 2);
        assert!(report[0].contains("at least 2 samples"));
        assert!(report[1].contains("finite"));

        let (valid, message) = is_sane_time_series(&x.view());
        assert!(!valid);
        assert_eq!(message.lines().count(), 2);
    }

    #[test]
    fn infinite_entries_are_rejected() {
        let mut x = Array2::from_elem((4, 2), Complex::new(0.0, 0.0));
        x[[2, 1]] = Complex::new(0.0, f64::INFINITY);
        let (valid, message) = is_sane_time_series(&x.view());
        assert!(!valid);
        assert!(message.contains("finite"));
    }
}

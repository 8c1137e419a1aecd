//! Ordinary least squares solver.
//!
//! The Hannan–Rissanen start for the ARIMA fit solves two small regressions:
//!
//! ```text
//! minimize Σ (y_t - x_t^T β)^2
//! ```
//!
//! first a long autoregression to approximate the shocks, then a regression on
//! lagged values and lagged shock estimates.
//!
//! Implementation choices:
//! - We solve via SVD so tall design matrices (many more rows than columns)
//!   are handled robustly. (Nalgebra's `QR::solve` is intended for square
//!   systems and will panic for non-square matrices.)
//! - A flat series yields an all-zero design; SVD treats the zero singular
//!   values as rank deficiency and returns the minimum-norm (zero) solution.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() == 0 || x.ncols() == 0 || x.nrows() != y.len() {
        return None;
    }

    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Build the lagged design for an autoregression of order `lags` on `series`.
///
/// Row `i` regresses `series[lags + i]` on `series[lags + i - 1]`, …,
/// `series[i]`. Returns `None` when there are not enough observations.
pub fn lagged_design(series: &[f64], lags: usize) -> Option<(DMatrix<f64>, DVector<f64>)> {
    if lags == 0 || series.len() <= lags {
        return None;
    }
    let rows = series.len() - lags;
    let x = DMatrix::from_fn(rows, lags, |i, j| series[lags + i - j - 1]);
    let y = DVector::from_fn(rows, |i, _| series[lags + i]);
    Some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn zero_design_gives_zero_solution() {
        let x = DMatrix::<f64>::zeros(5, 2);
        let y = DVector::<f64>::zeros(5);
        let beta = solve_least_squares(&x, &y).unwrap();
        assert!(beta.iter().all(|b| b.abs() < 1e-12));
    }

    #[test]
    fn lagged_design_recovers_ar1_coefficient() {
        // x_t = 0.5 x_{t-1}, exactly.
        let mut series = vec![1.0];
        for _ in 0..20 {
            let last = *series.last().unwrap();
            series.push(0.5 * last);
        }
        let (x, y) = lagged_design(&series, 1).unwrap();
        assert_eq!(x.nrows(), 20);
        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 0.5).abs() < 1e-9);
    }
}

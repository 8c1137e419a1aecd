//! ARIMA(p, d, q) evaluation on an already-differenced series.
//!
//! For the `d`-times differenced, mean-removed series `w_t`:
//!
//! ```text
//! w_t = φ1 w_{t-1} + … + φp w_{t-p} + e_t + θ1 e_{t-1} + … + θq e_{t-q}
//! ```
//!
//! The fitter relies on two primitive operations:
//! - conditional residuals `e_t` for given coefficients (for CSS)
//! - recursive multi-step forecasts with future shocks set to zero
//!
//! Differencing and its inverse live in `crate::math::transform`.

use serde::{Deserialize, Serialize};

use crate::domain::ArimaOrder;
use crate::error::ForecastError;

pub const MAX_AR_ORDER: usize = 5;
pub const MAX_DIFF_ORDER: usize = 2;
pub const MAX_MA_ORDER: usize = 5;

/// Distance kept from the unit boundary of the admissible region.
pub const ADMISSIBLE_MARGIN: f64 = 1e-6;

/// Extra observations required beyond `p + d + q`.
pub const MIN_EXTRA_OBS: usize = 10;

/// ARIMA coefficients for a fixed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArimaModel {
    pub order: ArimaOrder,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    /// Mean of the differenced series (zero when `d > 0`).
    pub mean: f64,
}

impl ArimaModel {
    /// Split a packed `[φ…, θ…]` vector into a model.
    pub fn from_packed(order: ArimaOrder, packed: &[f64], mean: f64) -> Self {
        Self {
            order,
            ar: packed[..order.p].to_vec(),
            ma: packed[order.p..order.p + order.q].to_vec(),
            mean,
        }
    }

    /// Conditional residuals on the mean-removed differenced series.
    pub fn residuals(&self, centered: &[f64]) -> Vec<f64> {
        conditional_residuals(&self.ar, &self.ma, centered)
    }

    /// Forecast `steps` values of the differenced series (mean added back).
    pub fn forecast_differenced(&self, centered: &[f64], residuals: &[f64], steps: usize) -> Vec<f64> {
        let mut history = centered.to_vec();
        let mut shocks = residuals.to_vec();
        let mut out = Vec::with_capacity(steps);

        for _ in 0..steps {
            let t = history.len();
            let mut next = 0.0;
            for (i, phi) in self.ar.iter().enumerate() {
                if let Some(v) = t.checked_sub(i + 1).map(|idx| history[idx]) {
                    next += phi * v;
                }
            }
            for (j, theta) in self.ma.iter().enumerate() {
                if let Some(e) = t.checked_sub(j + 1).and_then(|idx| shocks.get(idx)) {
                    next += theta * e;
                }
            }
            history.push(next);
            shocks.push(0.0);
            out.push(next + self.mean);
        }

        out
    }
}

/// Check an order against the supported ranges.
pub fn validate_order(order: ArimaOrder) -> Result<(), ForecastError> {
    let reject = |reason: &str| ForecastError::InvalidOrder {
        p: order.p,
        d: order.d,
        q: order.q,
        reason: reason.to_string(),
    };
    if order.p > MAX_AR_ORDER {
        return Err(reject("AR order must be <= 5"));
    }
    if order.d > MAX_DIFF_ORDER {
        return Err(reject("differencing order must be <= 2"));
    }
    if order.q > MAX_MA_ORDER {
        return Err(reject("MA order must be <= 5"));
    }
    Ok(())
}

/// Minimum series length for `order`.
pub fn min_observations(order: ArimaOrder) -> usize {
    order.p + order.d + order.q + MIN_EXTRA_OBS
}

/// Whether the coefficients lie inside the admissible region.
///
/// `Σ|φ| < 1` keeps the AR part stationary and `Σ|θ| < 1` keeps the MA part
/// invertible. Both are sufficient conditions; for first-order terms they are
/// exact. Each sum must also stay `ADMISSIBLE_MARGIN` below 1, so a fit that
/// presses against the boundary still reports a clearly invertible model.
pub fn is_admissible(ar: &[f64], ma: &[f64]) -> bool {
    let limit = 1.0 - ADMISSIBLE_MARGIN;
    let ar_sum: f64 = ar.iter().map(|v| v.abs()).sum();
    let ma_sum: f64 = ma.iter().map(|v| v.abs()).sum();
    ar.iter().chain(ma).all(|v| v.is_finite()) && ar_sum <= limit && ma_sum <= limit
}

/// Residual recursion conditioned on the first `p` observations.
///
/// `e_t = 0` for `t < p`; pre-sample shocks are zero.
pub fn conditional_residuals(ar: &[f64], ma: &[f64], w: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut e = vec![0.0; w.len()];
    for t in p..w.len() {
        let mut pred = 0.0;
        for (i, phi) in ar.iter().enumerate() {
            pred += phi * w[t - i - 1];
        }
        for (j, theta) in ma.iter().enumerate() {
            if t > j {
                pred += theta * e[t - j - 1];
            }
        }
        e[t] = w[t] - pred;
    }
    e
}

/// Conditional sum of squares for packed coefficients `[φ…, θ…]`.
///
/// Returns `+∞` outside the admissible region so optimizers step back inside.
pub fn css(order: ArimaOrder, packed: &[f64], w: &[f64]) -> f64 {
    let (ar, ma) = packed.split_at(order.p);
    if !is_admissible(ar, ma) {
        return f64::INFINITY;
    }
    let e = conditional_residuals(ar, ma, w);
    let sum: f64 = e[order.p.min(e.len())..].iter().map(|v| v * v).sum();
    if sum.is_finite() { sum } else { f64::INFINITY }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_limits() {
        assert!(validate_order(ArimaOrder::new(1, 1, 1)).is_ok());
        assert!(validate_order(ArimaOrder::new(6, 1, 1)).is_err());
        assert!(validate_order(ArimaOrder::new(1, 3, 1)).is_err());
        assert!(validate_order(ArimaOrder::new(1, 1, 6)).is_err());
        assert_eq!(min_observations(ArimaOrder::new(1, 1, 1)), 13);
    }

    #[test]
    fn residuals_vanish_for_exact_ar1() {
        let mut w = vec![1.0];
        for _ in 0..30 {
            let last = *w.last().unwrap();
            w.push(0.6 * last);
        }
        let e = conditional_residuals(&[0.6], &[], &w);
        assert!(e.iter().all(|v| v.abs() < 1e-12));
        assert!(css(ArimaOrder::new(1, 0, 0), &[0.6], &w) < 1e-20);
    }

    #[test]
    fn css_is_infinite_outside_region() {
        let w = vec![0.1, -0.2, 0.3, 0.0];
        let order = ArimaOrder::new(1, 1, 1);
        assert!(css(order, &[1.2, 0.0], &w).is_infinite());
        assert!(css(order, &[0.0, -1.0], &w).is_infinite());
        assert!(css(order, &[0.3, 0.3], &w).is_finite());
    }

    #[test]
    fn region_keeps_a_margin_from_the_unit_boundary() {
        assert!(is_admissible(&[0.999_998], &[-0.999_998]));
        assert!(!is_admissible(&[], &[-0.999_999_9]));
        assert!(!is_admissible(&[0.6, 0.399_999_9], &[]));
        assert!(css(ArimaOrder::new(0, 1, 1), &[-(1.0 - 1e-9)], &[0.1, -0.2, 0.3]).is_infinite());
    }

    #[test]
    fn forecast_uses_last_shock_once_then_decays() {
        let model = ArimaModel {
            order: ArimaOrder::new(1, 1, 1),
            ar: vec![0.5],
            ma: vec![0.4],
            mean: 0.0,
        };
        let centered = [0.0, 2.0];
        let residuals = [0.0, 1.0];
        let f = model.forecast_differenced(&centered, &residuals, 3);
        // step 1: 0.5*2 + 0.4*1 = 1.4; then pure AR decay.
        assert!((f[0] - 1.4).abs() < 1e-12);
        assert!((f[1] - 0.7).abs() < 1e-12);
        assert!((f[2] - 0.35).abs() < 1e-12);
    }
}

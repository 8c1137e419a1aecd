//! Conditional-sum-of-squares ARIMA fitting.
//!
//! Given a series `y` and a fixed order `(p, d, q)` we:
//! - difference `y` `d` times (and remove the mean when `d = 0`)
//! - build start points: Hannan–Rissanen, zero, and a coarse coefficient grid
//! - evaluate the CSS of every start (parallel) and keep the best few
//! - refine each kept start with Nelder–Mead (parallel)
//! - return the lowest-CSS converged refinement
//!
//! Selection is deterministic: ties are broken by start index.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::debug;

use crate::domain::ArimaOrder;
use crate::error::ForecastError;
use crate::fit::optimizer::{Minimum, NelderMeadOptions, nelder_mead};
use crate::fit::start_grid::coefficient_grid;
use crate::math::{difference, integrate, lagged_design, last_levels, solve_least_squares};
use crate::models::{ArimaModel, css, is_admissible, min_observations, validate_order};

/// Largest absolute coefficient sum allowed for a projected start point.
const START_SHRINK: f64 = 0.95;

/// Options that affect how the estimator searches.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Grid points per coefficient axis.
    pub grid_steps: usize,
    /// Grid extent: each axis spans `[-grid_bound, grid_bound]`.
    pub grid_bound: f64,
    /// Number of best starts refined with Nelder–Mead.
    pub refine_starts: usize,
    pub nelder_mead: NelderMeadOptions,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            grid_steps: 5,
            grid_bound: 0.8,
            refine_starts: 3,
            nelder_mead: NelderMeadOptions::default(),
        }
    }
}

/// A fitted model together with the state needed to forecast from it.
#[derive(Debug, Clone)]
pub struct FittedArima {
    pub model: ArimaModel,
    /// Differenced series with the mean removed.
    pub centered: Vec<f64>,
    pub residuals: Vec<f64>,
    /// Last value at each differencing level (see `math::last_levels`).
    pub levels: Vec<f64>,
    pub css: f64,
    pub sigma2: f64,
    /// Residuals contributing to the CSS.
    pub n_obs: usize,
    pub iterations: usize,
}

impl FittedArima {
    /// Forecast `steps` values on the scale of the input series.
    pub fn forecast(&self, steps: usize) -> Result<Vec<f64>, ForecastError> {
        let diffs = self
            .model
            .forecast_differenced(&self.centered, &self.residuals, steps);
        let values = integrate(&diffs, &self.levels);
        if let Some(step) = values.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::NonFiniteForecast { step: step + 1 });
        }
        Ok(values)
    }
}

#[derive(Debug, Clone)]
struct Start {
    idx: usize,
    coeffs: Vec<f64>,
    css: f64,
}

#[derive(Debug, Clone)]
struct Refined {
    idx: usize,
    minimum: Minimum,
}

/// Fit with default search options.
pub fn fit_arima(series: &[f64], order: ArimaOrder) -> Result<FittedArima, ForecastError> {
    fit_arima_with(series, order, &FitOptions::default())
}

/// Fit an ARIMA model of the given order by minimizing the CSS.
pub fn fit_arima_with(
    series: &[f64],
    order: ArimaOrder,
    opts: &FitOptions,
) -> Result<FittedArima, ForecastError> {
    validate_order(order)?;

    let required = min_observations(order);
    if series.len() < required {
        return Err(ForecastError::InsufficientData {
            required,
            actual: series.len(),
        });
    }
    if let Some(index) = series.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::NonFiniteInput { index });
    }

    let levels = last_levels(series, order.d).ok_or(ForecastError::InsufficientData {
        required,
        actual: series.len(),
    })?;
    let differenced = difference(series, order.d);
    let mean = if order.d == 0 {
        differenced.iter().sum::<f64>() / differenced.len() as f64
    } else {
        0.0
    };
    let centered: Vec<f64> = differenced.iter().map(|v| v - mean).collect();

    let objective = |coeffs: &[f64]| css(order, coeffs, &centered);

    let dim = order.coeff_count();
    let mut starts: Vec<Vec<f64>> = Vec::new();
    if let Some(hr) = hannan_rissanen(&centered, order.p, order.q) {
        starts.push(hr);
    }
    starts.push(vec![0.0; dim]);
    starts.extend(coefficient_grid(dim, opts.grid_bound, opts.grid_steps));

    // Score every start (parallel), keep the finite ones.
    let mut scored: Vec<Start> = starts
        .into_par_iter()
        .enumerate()
        .filter_map(|(idx, coeffs)| {
            let value = objective(&coeffs);
            value.is_finite().then_some(Start {
                idx,
                coeffs,
                css: value,
            })
        })
        .collect();
    scored.sort_by(|a, b| a.css.total_cmp(&b.css).then(a.idx.cmp(&b.idx)));
    scored.truncate(opts.refine_starts.max(1));

    if scored.is_empty() {
        return Err(ForecastError::NotConverged { iterations: 0 });
    }

    let refined: Vec<Refined> = scored
        .par_iter()
        .map(|start| Refined {
            idx: start.idx,
            minimum: nelder_mead(objective, &start.coeffs, &opts.nelder_mead),
        })
        .collect();

    let max_iterations = refined
        .iter()
        .map(|r| r.minimum.iterations)
        .max()
        .unwrap_or(0);

    let best = refined
        .into_iter()
        .filter(|r| r.minimum.converged && r.minimum.fx.is_finite())
        .min_by(|a, b| {
            a.minimum
                .fx
                .total_cmp(&b.minimum.fx)
                .then(a.idx.cmp(&b.idx))
        })
        .ok_or(ForecastError::NotConverged {
            iterations: max_iterations,
        })?;

    let model = ArimaModel::from_packed(order, &best.minimum.x, mean);
    let residuals = model.residuals(&centered);
    let n_obs = centered.len().saturating_sub(order.p).max(1);
    let css_value = best.minimum.fx;

    debug!(
        order = %order,
        ar = ?model.ar,
        ma = ?model.ma,
        css = css_value,
        iterations = best.minimum.iterations,
        "fitted ARIMA"
    );

    Ok(FittedArima {
        model,
        centered,
        residuals,
        levels,
        css: css_value,
        sigma2: css_value / n_obs as f64,
        n_obs,
        iterations: best.minimum.iterations,
    })
}

/// Two-stage least squares start estimate.
///
/// 1. Fit a long autoregression to approximate the unobserved shocks.
/// 2. Regress `w_t` on `w_{t-1..p}` and the estimated `e_{t-1..q}`.
///
/// The result is shrunk into the admissible region. Returns `None` when the
/// series is too short or the regression cannot be solved.
pub fn hannan_rissanen(w: &[f64], p: usize, q: usize) -> Option<Vec<f64>> {
    let k = p + q;
    if k == 0 {
        return None;
    }
    let n = w.len();

    let (shocks, long_order) = if q > 0 {
        let m = (k + 5).max(10).min(n / 4);
        if m == 0 {
            return None;
        }
        let (x, y) = lagged_design(w, m)?;
        let phi = solve_least_squares(&x, &y)?;
        let mut e = vec![0.0; n];
        for t in m..n {
            let pred: f64 = (0..m).map(|i| phi[i] * w[t - i - 1]).sum();
            e[t] = w[t] - pred;
        }
        (e, m)
    } else {
        (vec![0.0; n], 0)
    };

    let first = p.max(long_order + q);
    if n <= first + k {
        return None;
    }
    let rows = n - first;
    let x = DMatrix::from_fn(rows, k, |i, j| {
        let t = first + i;
        if j < p {
            w[t - j - 1]
        } else {
            shocks[t - (j - p) - 1]
        }
    });
    let y = DVector::from_fn(rows, |i, _| w[first + i]);
    let beta = solve_least_squares(&x, &y)?;

    let mut coeffs: Vec<f64> = beta.iter().copied().collect();
    let (ar, ma) = coeffs.split_at_mut(p);
    shrink_into_region(ar);
    shrink_into_region(ma);
    is_admissible(&coeffs[..p], &coeffs[p..]).then_some(coeffs)
}

fn shrink_into_region(coeffs: &mut [f64]) {
    let total: f64 = coeffs.iter().map(|v| v.abs()).sum();
    if total >= START_SHRINK {
        let scale = START_SHRINK / total;
        coeffs.iter_mut().for_each(|v| *v *= scale);
    }
}

//! Series transforms used around the ARIMA fit.
//!
//! - log with a zero floor (zeros become one before `ln`)
//! - differencing and its inverse (integration from the last observed levels)

/// Value substituted for zero before taking the log.
///
/// Lossy: a true zero comes back as 1 after `exp`.
pub const ZERO_FLOOR: f64 = 1.0;

/// Natural log of each value with zeros replaced by `ZERO_FLOOR`.
///
/// Returns the transformed series and how many zeros were replaced. Callers
/// must pass finite, non-negative values.
pub fn log_with_zero_floor(values: &[f64]) -> (Vec<f64>, usize) {
    let mut substitutions = 0;
    let logged = values
        .iter()
        .map(|&v| {
            if v == 0.0 {
                substitutions += 1;
                ZERO_FLOOR.ln()
            } else {
                v.ln()
            }
        })
        .collect();
    (logged, substitutions)
}

/// Inverse of the log transform.
pub fn exp_all(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.exp()).collect()
}

/// Apply `order` rounds of first differencing.
pub fn difference(values: &[f64], order: usize) -> Vec<f64> {
    let mut out = values.to_vec();
    for _ in 0..order {
        out = out.windows(2).map(|w| w[1] - w[0]).collect();
    }
    out
}

/// The last value at each differencing level `0..order`.
///
/// `levels[k]` is the last element of the `k`-times differenced series; these
/// are the anchors `integrate` needs. Returns `None` if the series is too
/// short to difference `order` times.
pub fn last_levels(values: &[f64], order: usize) -> Option<Vec<f64>> {
    let mut levels = Vec::with_capacity(order);
    let mut current = values.to_vec();
    for _ in 0..order {
        levels.push(*current.last()?);
        current = difference(&current, 1);
    }
    Some(levels)
}

/// Undo differencing on a block of forecasts.
///
/// `diffs` are forecasts of the `levels.len()`-times differenced series;
/// the result is on the original scale.
pub fn integrate(diffs: &[f64], levels: &[f64]) -> Vec<f64> {
    let mut out = diffs.to_vec();
    for &anchor in levels.iter().rev() {
        let mut running = anchor;
        for v in &mut out {
            running += *v;
            *v = running;
        }
    }
    out
}

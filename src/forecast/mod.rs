//! Daily forecasts on the log scale.
//!
//! For one measure of the daily series:
//!
//! 1. zeros become one (so the log is defined)
//! 2. natural log
//! 3. ARIMA fit of the configured order
//! 4. `horizon` steps forecast in log space
//! 5. `exp` back to original units
//! 6. count measures are truncated to whole numbers
//! 7. dates continue the day after the last observation
//!
//! Step 1 is lossy: a day with no sales contributes `ln 1 = 0`, not `-∞`.
//! Revenue and transactions are forecast independently.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::{ArimaOrder, DailySeries, FitSummary, ForecastPoint, ForecastResult, SeriesKind};
use crate::error::ForecastError;
use crate::fit::{FitOptions, fit_arima_with};
use crate::math::{exp_all, log_with_zero_floor};

/// Forecast one measure of the daily series.
pub fn forecast_series(
    series: &DailySeries,
    kind: SeriesKind,
    order: ArimaOrder,
    horizon: usize,
) -> Result<ForecastResult, ForecastError> {
    let last_observed = series
        .last_date()
        .ok_or(ForecastError::InsufficientData {
            required: crate::models::min_observations(order),
            actual: 0,
        })?;

    let values = series.values(kind);
    let outcome = forecast_values(&values, kind, order, horizon, &FitOptions::default());
    match &outcome {
        Ok((_, fit)) => info!(
            series = kind.display_name(),
            order = %order,
            ar = ?fit.ar,
            ma = ?fit.ma,
            sigma2 = fit.sigma2,
            zeros = fit.zero_substitutions,
            "forecast ready"
        ),
        Err(err) => warn!(series = kind.display_name(), error = %err, "forecast failed"),
    }
    let (predictions, fit) = outcome?;

    let points = continuation_dates(last_observed, horizon)
        .into_iter()
        .zip(predictions)
        .map(|(date, value)| ForecastPoint { date, value })
        .collect();

    Ok(ForecastResult {
        kind,
        last_observed,
        points,
        fit,
    })
}

/// Forecast raw values (no dates).
///
/// Values must be finite and non-negative.
pub fn forecast_values(
    values: &[f64],
    kind: SeriesKind,
    order: ArimaOrder,
    horizon: usize,
    opts: &FitOptions,
) -> Result<(Vec<f64>, FitSummary), ForecastError> {
    if let Some(index) = values.iter().position(|v| !v.is_finite() || *v < 0.0) {
        return Err(ForecastError::NonFiniteInput { index });
    }

    let (logged, zero_substitutions) = log_with_zero_floor(values);
    let fitted = fit_arima_with(&logged, order, opts)?;
    let log_forecast = fitted.forecast(horizon)?;

    let mut predictions = exp_all(&log_forecast);
    if kind.is_count() {
        predictions.iter_mut().for_each(|v| *v = v.trunc());
    }
    if let Some(step) = predictions.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::NonFiniteForecast { step: step + 1 });
    }

    let summary = FitSummary {
        order,
        ar: fitted.model.ar.clone(),
        ma: fitted.model.ma.clone(),
        mean: fitted.model.mean,
        css: fitted.css,
        sigma2: fitted.sigma2,
        n_obs: fitted.n_obs,
        iterations: fitted.iterations,
        zero_substitutions,
    };

    Ok((predictions, summary))
}

/// The `horizon` consecutive days after `last`.
pub fn continuation_dates(last: NaiveDate, horizon: usize) -> Vec<NaiveDate> {
    last.iter_days().skip(1).take(horizon).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DailyPoint;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series_from(values: &[f64], start: NaiveDate) -> DailySeries {
        let points = start
            .iter_days()
            .zip(values)
            .map(|(date, &v)| DailyPoint {
                date,
                total_revenue: v,
                total_transactions: v.round() as u64,
                order_count: 1,
            })
            .collect();
        DailySeries::from_contiguous(points).unwrap()
    }

    #[test]
    fn flat_series_gives_flat_forecast() {
        let series = series_from(&[100.0; 365], day(2019, 1, 1));
        let result = forecast_series(&series, SeriesKind::Revenue, ArimaOrder::default(), 30).unwrap();
        assert_eq!(result.points.len(), 30);
        for p in &result.points {
            assert!((p.value - 100.0).abs() < 1e-6, "{}", p.value);
        }
    }

    #[test]
    fn dates_start_the_day_after_the_last_observation() {
        let series = series_from(&[100.0; 365], day(2019, 1, 1));
        let result = forecast_series(&series, SeriesKind::Revenue, ArimaOrder::default(), 30).unwrap();
        assert_eq!(result.last_observed, day(2019, 12, 31));
        assert_eq!(result.points[0].date, day(2020, 1, 1));
        assert_eq!(result.points[29].date, day(2020, 1, 30));
        for w in result.points.windows(2) {
            assert_eq!(w[0].date.succ_opt(), Some(w[1].date));
        }
    }

    #[test]
    fn transaction_forecasts_are_non_negative_integers() {
        let values: Vec<f64> = (0..365)
            .map(|i| {
                let wave = (i as f64 * 2.0 * std::f64::consts::PI / 7.0).sin();
                if i % 29 == 0 { 0.0 } else { (40.0 + 8.0 * wave).round() }
            })
            .collect();
        let series = series_from(&values, day(2019, 1, 1));
        let result =
            forecast_series(&series, SeriesKind::Transactions, ArimaOrder::default(), 30).unwrap();
        assert!(result.fit.zero_substitutions > 0);
        for p in &result.points {
            assert!(p.value >= 0.0);
            assert_eq!(p.value.fract(), 0.0);
        }
        assert_eq!(result.counts().len(), 30);
    }

    #[test]
    fn all_zero_series_forecasts_one() {
        let (pred, fit) = forecast_values(
            &[0.0; 60],
            SeriesKind::Revenue,
            ArimaOrder::default(),
            5,
            &FitOptions::default(),
        )
        .unwrap();
        assert_eq!(fit.zero_substitutions, 60);
        for v in pred {
            assert!((v - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn negative_values_are_rejected() {
        let mut values = vec![5.0; 40];
        values[3] = -1.0;
        let err = forecast_values(
            &values,
            SeriesKind::Revenue,
            ArimaOrder::default(),
            30,
            &FitOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err, ForecastError::NonFiniteInput { index: 3 });
    }

    #[test]
    fn empty_series_is_insufficient() {
        let err = forecast_series(&DailySeries::default(), SeriesKind::Revenue, ArimaOrder::default(), 30)
            .unwrap_err();
        assert!(matches!(err, ForecastError::InsufficientData { actual: 0, .. }));
    }

    #[test]
    fn continuation_spans_leap_day() {
        let dates = continuation_dates(day(2020, 2, 27), 3);
        assert_eq!(dates, vec![day(2020, 2, 28), day(2020, 2, 29), day(2020, 3, 1)]);
    }
}

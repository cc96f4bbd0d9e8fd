//! Stochastic oscillator.
//!
//! %K = 100 × (C - LLV(low, k)) / (HHV(high, k) - LLV(low, k))
//! %D = SMA(%K, d)
//!
//! A zero high-low range leaves %K undefined for that bar, and any %D window
//! touching it stays undefined too.
//! Warmup: %K from bar k-1, %D from bar k+d-2.

use crate::domain::error::AutoquantError;
use crate::domain::indicator::rolling::{lift, rolling_max, rolling_mean, rolling_min};
use crate::domain::indicator::{
    build_series, require_window, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_stochastic(
    bars: &[OhlcvBar],
    k_period: usize,
    d_period: usize,
) -> Result<IndicatorSeries, AutoquantError> {
    require_window("k_period", k_period)?;
    require_window("d_period", d_period)?;

    let lows = lift(&bars.iter().map(|b| b.low).collect::<Vec<_>>());
    let highs = lift(&bars.iter().map(|b| b.high).collect::<Vec<_>>());
    let lowest = rolling_min(&lows, k_period);
    let highest = rolling_max(&highs, k_period);

    let percent_k: Vec<Option<f64>> = bars
        .iter()
        .zip(lowest.iter().zip(&highest))
        .map(|(bar, (lo, hi))| match (lo, hi) {
            (Some(lo), Some(hi)) => {
                let range = hi - lo;
                if range > 0.0 {
                    Some(100.0 * (bar.close - lo) / range)
                } else {
                    None
                }
            }
            _ => None,
        })
        .collect();
    let percent_d = rolling_mean(&percent_k, d_period);

    let values = percent_k
        .into_iter()
        .zip(percent_d)
        .map(|(k, d)| k.map(|k| IndicatorValue::Stochastic { k, d }));

    Ok(build_series(
        IndicatorType::Stochastic { k_period, d_period },
        bars.iter().map(|b| b.date),
        values,
    ))
}

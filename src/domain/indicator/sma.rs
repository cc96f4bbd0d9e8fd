//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) bars are undefined.

use crate::domain::error::AutoquantError;
use crate::domain::indicator::rolling::{lift, rolling_mean};
use crate::domain::indicator::{
    build_series, require_window, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], window: usize) -> Result<IndicatorSeries, AutoquantError> {
    require_window("window", window)?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let means = rolling_mean(&lift(&closes), window);

    Ok(build_series(
        IndicatorType::Sma(window),
        bars.iter().map(|b| b.date),
        means.into_iter().map(|v| v.map(IndicatorValue::Simple)),
    ))
}

//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! All EMAs are seeded with their first input, so every point is defined.

use crate::domain::error::AutoquantError;
use crate::domain::indicator::rolling::ema;
use crate::domain::indicator::{
    build_series, require_window, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

pub fn calculate_macd(
    bars: &[OhlcvBar],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> Result<IndicatorSeries, AutoquantError> {
    require_window("fast", fast)?;
    require_window("slow", slow)?;
    require_window("signal", signal_period)?;

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema(&closes, fast);
    let ema_slow = ema(&closes, slow);

    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema(&macd_line, signal_period);

    let values = macd_line
        .iter()
        .zip(&signal_line)
        .map(|(&line, &signal)| {
            Some(IndicatorValue::Macd {
                line,
                signal,
                histogram: line - signal,
            })
        });

    Ok(build_series(
        IndicatorType::Macd {
            fast,
            slow,
            signal: signal_period,
        },
        bars.iter().map(|b| b.date),
        values,
    ))
}

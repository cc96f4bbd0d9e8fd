//! RSI (Relative Strength Index) indicator implementation.
//!
//! Changes: D[i] = C[i] - C[i-1]. Gains are max(D, 0), losses max(-D, 0).
//! Average gain/loss are simple rolling means over the last n changes.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are undefined (need n price changes).

use crate::domain::error::AutoquantError;
use crate::domain::indicator::rolling::rolling_mean;
use crate::domain::indicator::{
    build_series, require_window, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, AutoquantError> {
    require_window("period", period)?;

    let mut gains: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut losses: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    for i in 0..bars.len() {
        if i == 0 {
            gains.push(None);
            losses.push(None);
            continue;
        }
        let change = bars[i].close - bars[i - 1].close;
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    let values = avg_gain.into_iter().zip(avg_loss).map(|(g, l)| match (g, l) {
        (Some(gain), Some(loss)) => Some(IndicatorValue::Simple(rsi_from_averages(gain, loss))),
        _ => None,
    });

    Ok(build_series(
        IndicatorType::Rsi(period),
        bars.iter().map(|b| b.date),
        values,
    ))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use crate::domain::indicator::Component;
    use approx::assert_relative_eq;

    #[test]
    fn rsi_empty_bars() {
        let series = calculate_rsi(&[], 14).unwrap();
        assert_eq!(series.len(), 0);
    }

    #[test]
    fn rsi_single_bar() {
        let series = calculate_rsi(&make_bars(&[100.0]), 14).unwrap();
        assert_eq!(series.len(), 1);
        assert!(!series.values[0].is_valid());
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&make_bars(&prices), 14).unwrap();

        for i in 0..14 {
            assert!(!series.values[i].is_valid(), "Bar {} should be undefined", i);
        }
        assert!(series.values[14].is_valid());
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let col = calculate_rsi(&make_bars(&prices), 14).unwrap().column(Component::Value);
        assert_eq!(col[14], Some(100.0));
    }

    #[test]
    fn rsi_flat_prices_guarded() {
        let col = calculate_rsi(&make_bars(&[50.0; 6]), 3).unwrap().column(Component::Value);
        assert_eq!(col[5], Some(100.0));
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let col = calculate_rsi(&make_bars(&prices), 14).unwrap().column(Component::Value);
        assert_relative_eq!(col[14].unwrap(), 0.0);
    }

    #[test]
    fn rsi_known_calculation() {
        // changes: +2, -1, +4 → avg gain 2, avg loss 1/3, RS 6
        let col = calculate_rsi(&make_bars(&[100.0, 102.0, 101.0, 105.0]), 3)
            .unwrap()
            .column(Component::Value);
        assert_relative_eq!(col[3].unwrap(), 100.0 - 100.0 / 7.0, epsilon = 1e-10);
    }

    #[test]
    fn rsi_in_range() {
        let prices: Vec<f64> = (1..=20)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        let col = calculate_rsi(&make_bars(&prices), 14).unwrap().column(Component::Value);
        for rsi in col.into_iter().flatten() {
            assert!((0.0..=100.0).contains(&rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_zero_period() {
        assert!(calculate_rsi(&make_bars(&[100.0, 101.0]), 0).is_err());
    }
}

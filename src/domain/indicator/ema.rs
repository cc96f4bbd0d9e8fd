//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Defined from the first bar; there is no warmup.

use crate::domain::error::AutoquantError;
use crate::domain::indicator::rolling::ema;
use crate::domain::indicator::{
    build_series, require_window, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_ema(bars: &[OhlcvBar], span: usize) -> Result<IndicatorSeries, AutoquantError> {
    require_window("span", span)?;
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();

    Ok(build_series(
        IndicatorType::Ema(span),
        bars.iter().map(|b| b.date),
        ema(&closes, span)
            .into_iter()
            .map(|v| Some(IndicatorValue::Simple(v))),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;
    use crate::domain::indicator::Component;
    use approx::assert_relative_eq;

    #[test]
    fn ema_defined_from_first_bar() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 5).unwrap();
        assert!(series.values.iter().all(|p| p.is_valid()));
        assert_eq!(series.column(Component::Value)[0], Some(10.0));
    }

    #[test]
    fn ema_recursive_calculation() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let col = calculate_ema(&bars, 3).unwrap().column(Component::Value);

        let k = 2.0 / 4.0;
        let mut expected = 10.0;
        for (i, close) in [10.0, 20.0, 30.0, 40.0, 50.0].iter().enumerate() {
            if i > 0 {
                expected = close * k + expected * (1.0 - k);
            }
            assert_relative_eq!(col[i].unwrap(), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn ema_equal_prices() {
        let bars = make_bars(&[100.0; 5]);
        let col = calculate_ema(&bars, 3).unwrap().column(Component::Value);
        for v in col {
            assert!((v.unwrap() - 100.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn ema_indicator_type() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_ema(&bars, 5).unwrap();
        assert_eq!(series.indicator_type, IndicatorType::Ema(5));
    }

    #[test]
    fn ema_empty_bars() {
        let series = calculate_ema(&[], 3).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn ema_zero_span_rejected() {
        let bars = make_bars(&[10.0, 20.0]);
        assert!(calculate_ema(&bars, 0).is_err());
    }
}

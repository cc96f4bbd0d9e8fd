//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is the sample standard deviation (divides by N-1), so the
//! window must be at least 2.
//!
//! Warmup: first (period-1) bars are undefined.

use crate::domain::error::AutoquantError;
use crate::domain::indicator::rolling::{lift, rolling_mean, rolling_sample_std};
use crate::domain::indicator::{build_series, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    num_std: f64,
) -> Result<IndicatorSeries, AutoquantError> {
    if period < 2 {
        return Err(AutoquantError::invalid_parameter(
            "window",
            "Bollinger window must be at least 2",
        ));
    }
    if !num_std.is_finite() || num_std <= 0.0 {
        return Err(AutoquantError::invalid_parameter(
            "num_std",
            "multiplier must be positive",
        ));
    }

    let closes = lift(&bars.iter().map(|b| b.close).collect::<Vec<_>>());
    let middle = rolling_mean(&closes, period);
    let stddev = rolling_sample_std(&closes, period);

    let values = middle.into_iter().zip(stddev).map(|(m, s)| match (m, s) {
        (Some(middle), Some(stddev)) => Some(IndicatorValue::Bollinger {
            upper: middle + num_std * stddev,
            middle,
            lower: middle - num_std * stddev,
            stddev,
        }),
        _ => None,
    });

    Ok(build_series(
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100: (num_std * 100.0).round() as u32,
        },
        bars.iter().map(|b| b.date),
        values,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    fn bands(series: &IndicatorSeries, i: usize) -> (f64, f64, f64) {
        match series.values[i].value {
            Some(IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
                ..
            }) => (upper, middle, lower),
            _ => panic!("Expected Bollinger value at {}", i),
        }
    }

    #[test]
    fn bollinger_warmup() {
        let bars = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let series = calculate_bollinger(&bars, 3, 2.0).unwrap();

        assert!(!series.values[0].is_valid());
        assert!(!series.values[1].is_valid());
        assert!(series.values[2].is_valid());
        assert!(series.values[4].is_valid());
    }

    #[test]
    fn bollinger_constant_values() {
        let bars = make_bars(&[100.0; 5]);
        let series = calculate_bollinger(&bars, 3, 2.0).unwrap();

        let (upper, middle, lower) = bands(&series, 2);
        assert!((middle - 100.0).abs() < f64::EPSILON);
        assert!((upper - 100.0).abs() < f64::EPSILON);
        assert!((lower - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bollinger_basic_calculation() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_bollinger(&bars, 3, 2.0).unwrap();

        let (upper, middle, lower) = bands(&series, 2);
        // sample variance of 10,20,30 is 100
        assert!((middle - 20.0).abs() < 1e-10);
        assert!((upper - 40.0).abs() < 1e-10);
        assert!((lower - 0.0).abs() < 1e-10);
    }

    #[test]
    fn bollinger_symmetry() {
        let bars = make_bars(&[10.0, 13.0, 17.0, 11.0]);
        let series = calculate_bollinger(&bars, 3, 1.5).unwrap();

        for i in 2..4 {
            let (upper, middle, lower) = bands(&series, i);
            assert!(((upper - middle) - (middle - lower)).abs() < 1e-10);
        }
    }

    #[test]
    fn bollinger_indicator_type() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        let series = calculate_bollinger(&bars, 20, 2.0).unwrap();

        assert_eq!(
            series.indicator_type,
            IndicatorType::Bollinger {
                period: 20,
                stddev_mult_x100: 200
            }
        );
    }

    #[test]
    fn bollinger_rejects_bad_parameters() {
        let bars = make_bars(&[10.0, 20.0, 30.0]);
        assert!(calculate_bollinger(&bars, 1, 2.0).is_err());
        assert!(calculate_bollinger(&bars, 3, 0.0).is_err());
        assert!(calculate_bollinger(&bars, 3, f64::NAN).is_err());
    }
}

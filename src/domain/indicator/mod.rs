//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values, aligned 1:1 with the bars
//!
//! Every rolling computation is strict: a point stays undefined (`None`) until
//! the full window of observations exists. Undefined inputs make dependent
//! outputs undefined, never zero.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod stochastic;

pub use bollinger::calculate_bollinger;
pub use ema::calculate_ema;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;
pub use stochastic::calculate_stochastic;

use chrono::NaiveDate;
use std::fmt;

use crate::domain::error::AutoquantError;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: Option<IndicatorValue>,
}

impl IndicatorPoint {
    pub fn is_valid(&self) -> bool {
        self.value.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Stochastic {
        k: f64,
        d: Option<f64>,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
        stddev: f64,
    },
}

/// A single named output of an indicator, used to pull one column out of a
/// multi-valued series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Value,
    MacdLine,
    MacdSignal,
    MacdHistogram,
    PercentK,
    PercentD,
    Upper,
    Middle,
    Lower,
    Stddev,
}

impl Component {
    pub fn label(self) -> &'static str {
        match self {
            Component::Value => "value",
            Component::MacdLine => "line",
            Component::MacdSignal => "signal",
            Component::MacdHistogram => "histogram",
            Component::PercentK => "k",
            Component::PercentD => "d",
            Component::Upper => "upper",
            Component::Middle => "middle",
            Component::Lower => "lower",
            Component::Stddev => "stddev",
        }
    }
}

impl IndicatorValue {
    pub fn component(&self, component: Component) -> Option<f64> {
        match (self, component) {
            (IndicatorValue::Simple(v), Component::Value) => Some(*v),
            (IndicatorValue::Macd { line, .. }, Component::MacdLine) => Some(*line),
            (IndicatorValue::Macd { signal, .. }, Component::MacdSignal) => Some(*signal),
            (IndicatorValue::Macd { histogram, .. }, Component::MacdHistogram) => {
                Some(*histogram)
            }
            (IndicatorValue::Stochastic { k, .. }, Component::PercentK) => Some(*k),
            (IndicatorValue::Stochastic { d, .. }, Component::PercentD) => *d,
            (IndicatorValue::Bollinger { upper, .. }, Component::Upper) => Some(*upper),
            (IndicatorValue::Bollinger { middle, .. }, Component::Middle) => Some(*middle),
            (IndicatorValue::Bollinger { lower, .. }, Component::Lower) => Some(*lower),
            (IndicatorValue::Bollinger { stddev, .. }, Component::Stddev) => Some(*stddev),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl IndicatorType {
    /// The components this indicator produces, in output-column order.
    pub fn components(&self) -> &'static [Component] {
        match self {
            IndicatorType::Sma(_) | IndicatorType::Ema(_) | IndicatorType::Rsi(_) => {
                &[Component::Value]
            }
            IndicatorType::Macd { .. } => &[
                Component::MacdLine,
                Component::MacdSignal,
                Component::MacdHistogram,
            ],
            IndicatorType::Stochastic { .. } => &[Component::PercentK, Component::PercentD],
            IndicatorType::Bollinger { .. } => &[
                Component::Upper,
                Component::Middle,
                Component::Lower,
                Component::Stddev,
            ],
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Stochastic { k_period, d_period } => {
                write!(f, "STOCHASTIC({},{})", k_period, d_period)
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Extract one component as a column aligned with the bars.
    pub fn column(&self, component: Component) -> Vec<Option<f64>> {
        self.values
            .iter()
            .map(|p| p.value.as_ref().and_then(|v| v.component(component)))
            .collect()
    }

    /// Header for a component column, e.g. `SMA(20)` or `MACD(12,26,9).signal`.
    pub fn column_name(&self, component: Component) -> String {
        if component == Component::Value {
            self.indicator_type.to_string()
        } else {
            format!("{}.{}", self.indicator_type, component.label())
        }
    }
}

pub(crate) fn require_window(name: &str, window: usize) -> Result<(), AutoquantError> {
    if window == 0 {
        return Err(AutoquantError::invalid_parameter(
            name,
            "window must be at least 1",
        ));
    }
    Ok(())
}

/// Pair each computed value with its bar date.
pub(crate) fn build_series(
    indicator_type: IndicatorType,
    dates: impl Iterator<Item = NaiveDate>,
    values: impl Iterator<Item = Option<IndicatorValue>>,
) -> IndicatorSeries {
    IndicatorSeries {
        indicator_type,
        values: dates
            .zip(values)
            .map(|(date, value)| IndicatorPoint { date, value })
            .collect(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_display_bollinger() {
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: 250,
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2.5)");
    }

    #[test]
    fn indicator_type_hash_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(IndicatorType::Sma(20), "sma20");
        map.insert(
            IndicatorType::Stochastic {
                k_period: 14,
                d_period: 3,
            },
            "stoch",
        );

        assert_eq!(map.get(&IndicatorType::Sma(20)), Some(&"sma20"));
        assert_eq!(map.get(&IndicatorType::Sma(50)), None);
        assert_eq!(
            map.get(&IndicatorType::Stochastic {
                k_period: 14,
                d_period: 3
            }),
            Some(&"stoch")
        );
    }

    #[test]
    fn component_lookup_matches_shape() {
        let v = IndicatorValue::Stochastic { k: 40.0, d: None };
        assert_eq!(v.component(Component::PercentK), Some(40.0));
        assert_eq!(v.component(Component::PercentD), None);
        assert_eq!(v.component(Component::Upper), None);
    }

    #[test]
    fn column_names() {
        let series = IndicatorSeries {
            indicator_type: IndicatorType::Macd {
                fast: 3,
                slow: 5,
                signal: 2,
            },
            values: vec![],
        };
        assert_eq!(series.column_name(Component::MacdSignal), "MACD(3,5,2).signal");

        let series = IndicatorSeries {
            indicator_type: IndicatorType::Rsi(14),
            values: vec![],
        };
        assert_eq!(series.column_name(Component::Value), "RSI(14)");
    }
}

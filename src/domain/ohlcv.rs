//! OHLCV bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::AutoquantError;

/// One trading session for a single instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Check that a bar sequence is usable by the pipeline: non-empty, dates
/// strictly increasing, prices positive and finite, open and close inside
/// the bar's low-high range.
pub fn validate_bars(symbol: &str, bars: &[OhlcvBar]) -> Result<(), AutoquantError> {
    if bars.is_empty() {
        return Err(AutoquantError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: "price history is empty".into(),
        });
    }

    for (i, bar) in bars.iter().enumerate() {
        let prices = [bar.open, bar.high, bar.low, bar.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err(AutoquantError::invalid_parameter(
                "bars",
                format!("bar {} ({}) has a non-positive or non-finite price", i, bar.date),
            ));
        }
        let in_range = |p: f64| bar.low <= p && p <= bar.high;
        if bar.low > bar.high || !in_range(bar.open) || !in_range(bar.close) {
            return Err(AutoquantError::invalid_parameter(
                "bars",
                format!(
                    "bar {} ({}) is inconsistent: open {} close {} outside low {} high {}",
                    i, bar.date, bar.open, bar.close, bar.low, bar.high
                ),
            ));
        }
        if i > 0 && bar.date <= bars[i - 1].date {
            return Err(AutoquantError::invalid_parameter(
                "bars",
                format!(
                    "dates must be strictly increasing: {} follows {}",
                    bar.date,
                    bars[i - 1].date
                ),
            ));
        }
    }

    Ok(())
}

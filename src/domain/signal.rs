//! Signal generation: turns a bar series and a strategy into a 0/1 target
//! position per bar plus its first difference.
//!
//! Crossover and trend rules are pointwise. Threshold rules (RSI, Bollinger,
//! Stochastic) are hysteresis scans that hold the previous signal while the
//! oscillator sits between its thresholds.

use tracing::debug;

use crate::domain::error::AutoquantError;
use crate::domain::indicator::{
    calculate_bollinger, calculate_ema, calculate_macd, calculate_rsi, calculate_sma,
    calculate_stochastic, Component, IndicatorSeries,
};
use crate::domain::ohlcv::{validate_bars, OhlcvBar};
use crate::domain::strategy::{Strategy, StrategyParams};

/// Bars augmented with the strategy's indicators and signals.
///
/// `fast_line` / `slow_line` are the two series a chart of this strategy
/// would overlay; `signal[i]` is the target exposure decided at bar `i`
/// and `position[i] = signal[i] - signal[i-1]` (undefined at bar 0).
#[derive(Debug, Clone, PartialEq)]
pub struct SignalTable {
    pub strategy: Strategy,
    pub bars: Vec<OhlcvBar>,
    pub indicators: Vec<IndicatorSeries>,
    pub fast_line: Vec<Option<f64>>,
    pub slow_line: Vec<Option<f64>>,
    pub signal: Vec<f64>,
    pub position: Vec<Option<f64>>,
}

impl SignalTable {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

pub fn calculate_signals(
    bars: &[OhlcvBar],
    strategy: &Strategy,
) -> Result<SignalTable, AutoquantError> {
    strategy.validate()?;
    validate_bars("input", bars)?;

    let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
    let n = bars.len();

    let (indicators, fast_line, slow_line, signal) = match *strategy {
        Strategy::SmaCrossover {
            short_window,
            long_window,
        } => {
            let short = calculate_sma(bars, short_window)?;
            let long = calculate_sma(bars, long_window)?;
            let fast = short.column(Component::Value);
            let slow = long.column(Component::Value);
            let signal = crossover_signal(&fast, &slow);
            (vec![short, long], fast, slow, signal)
        }
        Strategy::EmaCrossover {
            short_window,
            long_window,
        } => {
            let short = calculate_ema(bars, short_window)?;
            let long = calculate_ema(bars, long_window)?;
            let fast = short.column(Component::Value);
            let slow = long.column(Component::Value);
            let signal = crossover_signal(&fast, &slow);
            (vec![short, long], fast, slow, signal)
        }
        Strategy::SmaLongOnly { window } => {
            let ma = calculate_sma(bars, window)?;
            let slow = ma.column(Component::Value);
            let signal = crossover_signal(&closes, &slow);
            (vec![ma], closes.clone(), slow, signal)
        }
        Strategy::Rsi {
            period,
            overbought,
            oversold,
        } => {
            let rsi = calculate_rsi(bars, period)?;
            let signal = hysteresis_signal(
                &rsi.column(Component::Value),
                &vec![Some(oversold); n],
                &vec![Some(overbought); n],
            );
            (vec![rsi], closes.clone(), closes.clone(), signal)
        }
        Strategy::Bollinger { window, num_std } => {
            let bands = calculate_bollinger(bars, window, num_std)?;
            let upper = bands.column(Component::Upper);
            let lower = bands.column(Component::Lower);
            let signal = hysteresis_signal(&closes, &lower, &upper);
            (vec![bands], upper, lower, signal)
        }
        Strategy::Macd { fast, slow, signal } => {
            let macd = calculate_macd(bars, fast, slow, signal)?;
            let line = macd.column(Component::MacdLine);
            let signal_line = macd.column(Component::MacdSignal);
            let signal = crossover_signal(&line, &signal_line);
            (vec![macd], line, signal_line, signal)
        }
        Strategy::Stochastic {
            k_period,
            d_period,
            overbought,
            oversold,
        } => {
            let stoch = calculate_stochastic(bars, k_period, d_period)?;
            let k = stoch.column(Component::PercentK);
            let d = stoch.column(Component::PercentD);
            let signal = hysteresis_signal(
                &k,
                &vec![Some(oversold); n],
                &vec![Some(overbought); n],
            );
            (vec![stoch], k, d, signal)
        }
    };

    let position = position_delta(&signal);
    debug!(
        strategy = %strategy,
        bars = n,
        long_bars = signal.iter().filter(|s| **s > 0.0).count(),
        "signals calculated"
    );

    Ok(SignalTable {
        strategy: strategy.clone(),
        bars: bars.to_vec(),
        indicators,
        fast_line,
        slow_line,
        signal,
        position,
    })
}

/// Build the strategy from a loose name + parameter map, then compute signals.
pub fn calculate_signals_by_name(
    bars: &[OhlcvBar],
    name: &str,
    params: &StrategyParams,
) -> Result<SignalTable, AutoquantError> {
    let strategy = Strategy::from_params(name, params)?;
    calculate_signals(bars, &strategy)
}

/// 1 where `fast > slow`, 0 otherwise (including where either is undefined).
pub fn crossover_signal(fast: &[Option<f64>], slow: &[Option<f64>]) -> Vec<f64> {
    fast.iter()
        .zip(slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) if f > s => 1.0,
            _ => 0.0,
        })
        .collect()
}

/// Stateful threshold rule: enter (1) when `value < lower`, exit (0) when
/// `value > upper`, otherwise keep the previous signal. Bar 0 is always 0 and
/// an undefined operand holds.
pub fn hysteresis_signal(
    value: &[Option<f64>],
    lower: &[Option<f64>],
    upper: &[Option<f64>],
) -> Vec<f64> {
    let mut signal = Vec::with_capacity(value.len());
    let mut last = 0.0;
    for i in 0..value.len() {
        if i > 0 {
            last = match (value[i], lower[i], upper[i]) {
                (Some(x), Some(lo), _) if x < lo => 1.0,
                (Some(x), _, Some(hi)) if x > hi => 0.0,
                _ => last,
            };
        }
        signal.push(last);
    }
    signal
}

/// First difference of the signal; +1 is an entry, -1 an exit.
pub fn position_delta(signal: &[f64]) -> Vec<Option<f64>> {
    let mut delta = Vec::with_capacity(signal.len());
    for i in 0..signal.len() {
        delta.push(if i == 0 {
            None
        } else {
            Some(signal[i] - signal[i - 1])
        });
    }
    delta
}

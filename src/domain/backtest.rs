//! Vectorized backtest over a signal table.
//!
//! Positions are entered at the close of the bar that produced the signal, so
//! bar `i` earns `market_return[i] * signal[i-1]`. No costs, no leverage.

use chrono::NaiveDate;
use std::fmt;
use tracing::info;

use crate::domain::error::AutoquantError;
use crate::domain::signal::SignalTable;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestTable {
    pub signals: SignalTable,
    pub initial_capital: f64,
    pub market_return: Vec<Option<f64>>,
    pub strategy_return: Vec<Option<f64>>,
    pub equity_curve: Vec<f64>,
    pub peak_equity: Vec<f64>,
    pub drawdown: Vec<f64>,
}

/// One bar of a backtest, borrowed from the table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestRow {
    pub date: NaiveDate,
    pub close: f64,
    pub signal: f64,
    pub position: Option<f64>,
    pub market_return: Option<f64>,
    pub strategy_return: Option<f64>,
    pub equity: f64,
    pub peak_equity: f64,
    pub drawdown: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => f.pad("BUY"),
            TradeAction::Sell => f.pad("SELL"),
        }
    }
}

/// A change in target exposure, executed at that bar's close.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub delta: f64,
}

pub fn run_backtest(
    signals: SignalTable,
    initial_capital: f64,
) -> Result<BacktestTable, AutoquantError> {
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(AutoquantError::invalid_parameter(
            "initial_capital",
            format!("must be positive, got {}", initial_capital),
        ));
    }

    let n = signals.len();
    let mut market_return = Vec::with_capacity(n);
    let mut strategy_return = Vec::with_capacity(n);
    let mut equity_curve = Vec::with_capacity(n);
    let mut peak_equity = Vec::with_capacity(n);
    let mut drawdown = Vec::with_capacity(n);

    let mut equity = initial_capital;
    let mut peak = initial_capital;
    for i in 0..n {
        let (mret, sret) = if i == 0 {
            (None, None)
        } else {
            let m = signals.bars[i].close / signals.bars[i - 1].close - 1.0;
            (Some(m), Some(m * signals.signal[i - 1]))
        };

        equity *= 1.0 + sret.unwrap_or(0.0);
        peak = peak.max(equity);

        market_return.push(mret);
        strategy_return.push(sret);
        equity_curve.push(equity);
        peak_equity.push(peak);
        drawdown.push((equity - peak) / peak);
    }

    info!(
        strategy = %signals.strategy,
        bars = n,
        final_equity = equity,
        "backtest complete"
    );

    Ok(BacktestTable {
        signals,
        initial_capital,
        market_return,
        strategy_return,
        equity_curve,
        peak_equity,
        drawdown,
    })
}

impl BacktestTable {
    pub fn len(&self) -> usize {
        self.equity_curve.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equity_curve.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = BacktestRow> + '_ {
        (0..self.len()).map(move |i| BacktestRow {
            date: self.signals.bars[i].date,
            close: self.signals.bars[i].close,
            signal: self.signals.signal[i],
            position: self.signals.position[i],
            market_return: self.market_return[i],
            strategy_return: self.strategy_return[i],
            equity: self.equity_curve[i],
            peak_equity: self.peak_equity[i],
            drawdown: self.drawdown[i],
        })
    }

    pub fn final_equity(&self) -> f64 {
        self.equity_curve
            .last()
            .copied()
            .unwrap_or(self.initial_capital)
    }

    /// Equity of holding the instrument over the whole range.
    pub fn buy_and_hold_equity(&self) -> Vec<f64> {
        let mut equity = self.initial_capital;
        self.market_return
            .iter()
            .map(|r| {
                equity *= 1.0 + r.unwrap_or(0.0);
                equity
            })
            .collect()
    }

    pub fn trades(&self) -> Vec<TradeEvent> {
        self.signals
            .position
            .iter()
            .zip(&self.signals.bars)
            .filter_map(|(delta, bar)| match delta {
                Some(d) if *d != 0.0 => Some(TradeEvent {
                    date: bar.date,
                    action: if *d > 0.0 {
                        TradeAction::Buy
                    } else {
                        TradeAction::Sell
                    },
                    price: bar.close,
                    delta: *d,
                }),
                _ => None,
            })
            .collect()
    }
}

//! Performance metrics over a completed backtest.

use tracing::debug;

use super::backtest::BacktestTable;
use super::error::AutoquantError;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub market_return: f64,
    pub final_equity: f64,
    pub net_profit: f64,
    pub buy_and_hold_final_value: f64,
    pub buy_and_hold_net_profit: f64,
    pub outperformance: f64,
    pub trade_count: usize,
}

impl Metrics {
    pub fn compute(table: &BacktestTable, risk_free_rate: f64) -> Result<Self, AutoquantError> {
        if !risk_free_rate.is_finite() {
            return Err(AutoquantError::invalid_parameter(
                "risk_free_rate",
                "must be a finite number",
            ));
        }
        let n = table.len();
        if n < 2 {
            return Err(AutoquantError::degenerate(format!(
                "need at least 2 bars, got {}",
                n
            )));
        }
        let returns: Vec<f64> = table.strategy_return.iter().flatten().copied().collect();
        if returns.len() < 2 {
            return Err(AutoquantError::degenerate(format!(
                "need at least 2 strategy returns, got {}",
                returns.len()
            )));
        }

        let first_equity = table.equity_curve[0];
        let final_equity = table.final_equity();
        let total_return = final_equity / first_equity - 1.0;
        let annualized_return = (1.0 + total_return).powf(TRADING_DAYS_PER_YEAR / n as f64) - 1.0;

        let annualized_volatility = sample_stdev(&returns) * TRADING_DAYS_PER_YEAR.sqrt();
        let sharpe_ratio = if annualized_volatility == 0.0 {
            0.0
        } else {
            (annualized_return - risk_free_rate) / annualized_volatility
        };

        let max_drawdown = table.drawdown.iter().copied().fold(0.0_f64, f64::min);

        let bars = &table.signals.bars;
        let market_return = bars[n - 1].close / bars[0].close - 1.0;

        let capital = table.initial_capital;
        let net_profit = final_equity - capital;
        let buy_and_hold_final_value = capital * (1.0 + market_return);
        let buy_and_hold_net_profit = buy_and_hold_final_value - capital;

        let metrics = Metrics {
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown,
            market_return,
            final_equity,
            net_profit,
            buy_and_hold_final_value,
            buy_and_hold_net_profit,
            outperformance: net_profit - buy_and_hold_net_profit,
            trade_count: table.trades().len(),
        };
        debug!(?metrics, "metrics computed");
        Ok(metrics)
    }

    /// Headline figures as `(label, formatted value)` pairs.
    pub fn summary_lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Total Return", percent(self.total_return)),
            ("Market Return", percent(self.market_return)),
            ("Annualized Return", percent(self.annualized_return)),
            ("Annualized Volatility", percent(self.annualized_volatility)),
            ("Sharpe Ratio", format!("{:.2}", self.sharpe_ratio)),
            ("Max Drawdown", percent(self.max_drawdown)),
        ]
    }

    /// Strategy vs buy-and-hold in currency terms.
    pub fn comparison_lines(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Final Equity", format!("{:.2}", self.final_equity)),
            ("Net Profit", format!("{:.2}", self.net_profit)),
            (
                "Buy & Hold Final Value",
                format!("{:.2}", self.buy_and_hold_final_value),
            ),
            (
                "Buy & Hold Net Profit",
                format!("{:.2}", self.buy_and_hold_net_profit),
            ),
            ("Outperformance", format!("{:.2}", self.outperformance)),
            ("Trades", self.trade_count.to_string()),
        ]
    }
}

fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Sample standard deviation; exactly zero when every observation is equal.
fn sample_stdev(values: &[f64]) -> f64 {
    let first = values[0];
    if values.iter().all(|v| *v == first) {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::run_backtest;
    use crate::domain::error::ErrorKind;
    use crate::domain::indicator::test_support::make_bars;
    use crate::domain::signal::calculate_signals;
    use crate::domain::strategy::Strategy;
    use approx::assert_relative_eq;

    fn backtest(prices: &[f64], short: usize, long: usize) -> BacktestTable {
        let signals = calculate_signals(
            &make_bars(prices),
            &Strategy::SmaCrossover {
                short_window: short,
                long_window: long,
            },
        )
        .unwrap();
        run_backtest(signals, 100_000.0).unwrap()
    }

    #[test]
    fn worked_example_metrics() {
        let table = backtest(&[100.0, 102.0, 101.0, 105.0, 110.0], 2, 3);
        let m = Metrics::compute(&table, 0.0).unwrap();

        assert_relative_eq!(m.total_return, 110.0 / 101.0 - 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.market_return, 0.10, epsilon = 1e-12);
        assert_relative_eq!(
            m.annualized_return,
            (110.0f64 / 101.0).powf(252.0 / 5.0) - 1.0,
            epsilon = 1e-9
        );
        assert_relative_eq!(m.max_drawdown, 0.0);
        assert_relative_eq!(m.buy_and_hold_final_value, 110_000.0, epsilon = 1e-6);
        assert_relative_eq!(
            m.outperformance,
            m.net_profit - 10_000.0,
            epsilon = 1e-6
        );
        assert_eq!(m.trade_count, 1);
        assert!(m.sharpe_ratio > 0.0);
    }

    #[test]
    fn volatility_matches_sample_stdev() {
        let table = backtest(&[100.0, 101.0, 103.0, 102.0, 106.0, 107.0], 1, 2);
        let m = Metrics::compute(&table, 0.0).unwrap();

        let r: Vec<f64> = table.strategy_return.iter().flatten().copied().collect();
        let mean = r.iter().sum::<f64>() / r.len() as f64;
        let var = r.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (r.len() as f64 - 1.0);
        assert_relative_eq!(m.annualized_volatility, var.sqrt() * 252f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn constant_close_has_zero_sharpe() {
        let table = backtest(&[75.0; 12], 2, 3);
        let m = Metrics::compute(&table, 0.02).unwrap();
        assert_eq!(m.annualized_volatility, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.max_drawdown, 0.0);
        assert_relative_eq!(m.total_return, 0.0);
        assert_eq!(m.trade_count, 0);
    }

    #[test]
    fn never_invested_has_zero_sharpe() {
        // window longer than the series keeps every return at exactly 0
        let table = backtest(&[100.0, 110.0, 90.0, 120.0], 2, 50);
        let m = Metrics::compute(&table, 0.0).unwrap();
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_relative_eq!(m.market_return, 0.2, epsilon = 1e-12);
        assert_relative_eq!(m.outperformance, -20_000.0, epsilon = 1e-6);
    }

    #[test]
    fn sharpe_subtracts_risk_free_rate() {
        let table = backtest(&[100.0, 101.0, 103.0, 102.0, 106.0, 107.0], 1, 2);
        let base = Metrics::compute(&table, 0.0).unwrap();
        let with_rf = Metrics::compute(&table, 0.05).unwrap();
        assert_relative_eq!(
            base.sharpe_ratio - with_rf.sharpe_ratio,
            0.05 / base.annualized_volatility,
            epsilon = 1e-9
        );
    }

    #[test]
    fn degenerate_inputs_rejected() {
        let one = backtest(&[100.0], 1, 2);
        assert_eq!(
            Metrics::compute(&one, 0.0).unwrap_err().kind(),
            ErrorKind::DegenerateSequence
        );

        let two = backtest(&[100.0, 101.0], 1, 2);
        assert_eq!(
            Metrics::compute(&two, 0.0).unwrap_err().kind(),
            ErrorKind::DegenerateSequence
        );
    }

    #[test]
    fn non_finite_risk_free_rate_rejected() {
        let table = backtest(&[100.0, 101.0, 102.0], 1, 2);
        let err = Metrics::compute(&table, f64::NAN).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameter);
    }

    #[test]
    fn summary_lines_order_and_format() {
        let table = backtest(&[100.0, 102.0, 101.0, 105.0, 110.0], 2, 3);
        let m = Metrics::compute(&table, 0.0).unwrap();
        let lines = m.summary_lines();
        let labels: Vec<&str> = lines.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec![
                "Total Return",
                "Market Return",
                "Annualized Return",
                "Annualized Volatility",
                "Sharpe Ratio",
                "Max Drawdown"
            ]
        );
        assert_eq!(lines[1].1, "10.00%");
        assert_eq!(lines[0].1, "8.91%");
        assert_eq!(lines[5].1, "0.00%");
    }
}

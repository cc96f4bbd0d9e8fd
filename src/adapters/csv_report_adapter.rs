//! CSV report adapter: one row per bar with every computed column.

use crate::domain::backtest::BacktestTable;
use crate::domain::error::AutoquantError;
use crate::domain::metrics::Metrics;
use crate::ports::report_port::ReportPort;
use std::io;
use tracing::info;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }

    /// Write the report to any sink; `write` targets a file path.
    pub fn write_to<W: io::Write>(
        &self,
        table: &BacktestTable,
        sink: W,
    ) -> Result<(), AutoquantError> {
        let mut wtr = csv::Writer::from_writer(sink);
        let signals = &table.signals;

        let mut header: Vec<String> = [
            "date", "open", "high", "low", "close", "volume", "fast_line", "slow_line",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let mut indicator_columns = Vec::new();
        for series in &signals.indicators {
            for component in series.indicator_type.components() {
                header.push(series.column_name(*component));
                indicator_columns.push(series.column(*component));
            }
        }
        header.extend(
            [
                "signal",
                "position",
                "market_return",
                "strategy_return",
                "equity_curve",
                "peak_equity",
                "drawdown",
                "buy_and_hold",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        wtr.write_record(&header).map_err(report_error)?;

        let buy_and_hold = table.buy_and_hold_equity();
        for (i, bar) in signals.bars.iter().enumerate() {
            let mut record = vec![
                bar.date.format("%Y-%m-%d").to_string(),
                bar.open.to_string(),
                bar.high.to_string(),
                bar.low.to_string(),
                bar.close.to_string(),
                bar.volume.to_string(),
                cell(signals.fast_line[i]),
                cell(signals.slow_line[i]),
            ];
            record.extend(indicator_columns.iter().map(|col| cell(col[i])));
            record.extend([
                signals.signal[i].to_string(),
                cell(signals.position[i]),
                cell(table.market_return[i]),
                cell(table.strategy_return[i]),
                table.equity_curve[i].to_string(),
                table.peak_equity[i].to_string(),
                table.drawdown[i].to_string(),
                buy_and_hold[i].to_string(),
            ]);
            wtr.write_record(&record).map_err(report_error)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        table: &BacktestTable,
        metrics: &Metrics,
        output_path: &str,
    ) -> Result<(), AutoquantError> {
        let file = std::fs::File::create(output_path).map_err(|e| AutoquantError::Report {
            reason: format!("failed to create {}: {}", output_path, e),
        })?;
        self.write_to(table, file)?;
        info!(
            path = output_path,
            rows = table.len(),
            total_return = metrics.total_return,
            "report written"
        );
        Ok(())
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn report_error(e: csv::Error) -> AutoquantError {
    AutoquantError::Report {
        reason: e.to_string(),
    }
}

//! Report generation port trait.

use crate::domain::backtest::BacktestTable;
use crate::domain::error::AutoquantError;
use crate::domain::metrics::Metrics;

/// Port for writing backtest reports.
pub trait ReportPort {
    fn write(
        &self,
        table: &BacktestTable,
        metrics: &Metrics,
        output_path: &str,
    ) -> Result<(), AutoquantError>;
}

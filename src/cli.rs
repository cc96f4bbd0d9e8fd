//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{run_backtest, BacktestTable, DEFAULT_INITIAL_CAPITAL};
use crate::domain::config_validation::{
    read_date_range, read_strategy_params, read_trade_quantity, strategy_name,
    validate_backtest_config, validate_strategy_config,
};
use crate::domain::error::AutoquantError;
use crate::domain::metrics::Metrics;
use crate::domain::ohlcv::validate_bars;
use crate::domain::portfolio::{replay_trades, Ledger, OrderRejection, Transaction};
use crate::domain::signal::calculate_signals;
use crate::domain::strategy::{Strategy, StrategyKind};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "autoquant", about = "Single-asset technical strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override [data] symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Override [strategy] name
        #[arg(long)]
        strategy: Option<String>,
        /// Override [data] data_dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Write the per-bar table as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the trade log
        #[arg(long)]
        trades: bool,
        /// Paper-trade the trade log with this many shares per order
        #[arg(long)]
        paper_qty: Option<u64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List available strategies and their default parameters
    Strategies,
}

/// Values resolved from the config file plus command-line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub data_dir: PathBuf,
    pub initial_capital: f64,
    pub risk_free_rate: f64,
    pub trade_quantity: Option<u64>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub symbol: Option<String>,
    pub strategy: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub trade_quantity: Option<u64>,
}

pub struct PipelineOutput {
    pub table: BacktestTable,
    pub metrics: Metrics,
    pub paper: Option<PaperTrading>,
}

pub struct PaperTrading {
    pub ledger: Ledger,
    pub outcomes: Vec<Result<Transaction, OrderRejection>>,
}

/// Install the stderr subscriber; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "autoquant=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            strategy,
            data_dir,
            output,
            trades,
            paper_qty,
        } => {
            let overrides = Overrides {
                symbol,
                strategy,
                data_dir,
                output,
                trade_quantity: paper_qty,
            };
            run_backtest_command(&config, &overrides, trades)
        }
        Command::Validate { config } => run_validate(&config),
        Command::Strategies => run_strategies(),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_backtest_command(config_path: &Path, overrides: &Overrides, show_trades: bool) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Resolve run config and strategy
    let run_config = match build_run_config(&adapter, overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let strategy = match build_strategy(&adapter, overrides.strategy.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Strategy: {}", strategy);

    // Stages 3-6: Data, signals, backtest, metrics
    let data_port = CsvAdapter::new(run_config.data_dir.clone());
    let output = match run_backtest_pipeline(&data_port, &strategy, &run_config) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 7: Console summary
    print_summary(&run_config, &output, show_trades);

    // Stage 8: Optional CSV report
    if let Some(path) = &run_config.output {
        let path_str = path.to_string_lossy();
        if let Err(e) = CsvReportAdapter::new().write(&output.table, &output.metrics, &path_str) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("\nReport written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

pub fn build_run_config(
    adapter: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<RunConfig, AutoquantError> {
    let symbol = match &overrides.symbol {
        Some(s) => s.clone(),
        None => adapter
            .get_string("data", "symbol")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AutoquantError::ConfigMissing {
                section: "data".into(),
                key: "symbol".into(),
            })?,
    };
    let (start_date, end_date) = read_date_range(adapter)?;

    let initial_capital = adapter.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if !initial_capital.is_finite() || initial_capital <= 0.0 {
        return Err(AutoquantError::ConfigInvalid {
            section: "backtest".into(),
            key: "initial_capital".into(),
            reason: "initial_capital must be positive".into(),
        });
    }
    let risk_free_rate = adapter.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&risk_free_rate) {
        return Err(AutoquantError::ConfigInvalid {
            section: "backtest".into(),
            key: "risk_free_rate".into(),
            reason: "risk_free_rate must be between 0 and 1".into(),
        });
    }

    let trade_quantity = match overrides.trade_quantity {
        Some(q) => Some(q),
        None => read_trade_quantity(adapter)?,
    };

    Ok(RunConfig {
        symbol: symbol.trim().to_string(),
        start_date,
        end_date,
        data_dir: overrides.data_dir.clone().unwrap_or_else(|| {
            adapter
                .get_string("data", "data_dir")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data"))
        }),
        initial_capital,
        risk_free_rate,
        trade_quantity,
        output: overrides
            .output
            .clone()
            .or_else(|| adapter.get_string("report", "output").map(PathBuf::from)),
    })
}

/// Build the strategy named in `[strategy]` (or `name_override`) from the
/// section's parameter keys.
pub fn build_strategy(
    adapter: &dyn ConfigPort,
    name_override: Option<&str>,
) -> Result<Strategy, AutoquantError> {
    let name = match name_override {
        Some(n) => n.to_string(),
        None => {
            validate_strategy_config(adapter)?;
            strategy_name(adapter)?
        }
    };
    let params = read_strategy_params(adapter, &name)?;
    Strategy::from_params(&name, &params)
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    strategy: &Strategy,
    run_config: &RunConfig,
) -> Result<PipelineOutput, AutoquantError> {
    // Stage 3: Fetch price history
    info!(
        symbol = %run_config.symbol,
        start = %run_config.start_date,
        end = %run_config.end_date,
        "fetching price history"
    );
    let bars = data_port.fetch_ohlcv(
        &run_config.symbol,
        run_config.start_date,
        run_config.end_date,
    )?;
    validate_bars(&run_config.symbol, &bars)?;
    eprintln!(
        "Loaded {} bars for {} ({} to {})",
        bars.len(),
        run_config.symbol,
        bars[0].date,
        bars[bars.len() - 1].date
    );

    // Stage 4: Signals
    let signals = calculate_signals(&bars, strategy)?;

    // Stage 5: Backtest
    let table = run_backtest(signals, run_config.initial_capital)?;

    // Stage 6: Metrics
    let metrics = Metrics::compute(&table, run_config.risk_free_rate)?;

    let paper = match run_config.trade_quantity {
        Some(quantity) => {
            let mut ledger = Ledger::new(run_config.initial_capital)?;
            let outcomes =
                replay_trades(&mut ledger, &run_config.symbol, &table.trades(), quantity);
            Some(PaperTrading { ledger, outcomes })
        }
        None => None,
    };

    Ok(PipelineOutput {
        table,
        metrics,
        paper,
    })
}

fn print_summary(run_config: &RunConfig, output: &PipelineOutput, show_trades: bool) {
    let metrics = &output.metrics;

    eprintln!("\n=== Results: {} ===", run_config.symbol);
    for (label, value) in metrics.summary_lines() {
        eprintln!("{:<24}{}", format!("{}:", label), value);
    }

    eprintln!("\n=== Strategy vs Buy & Hold ===");
    eprintln!("{:<24}{:.2}", "Initial Capital:", run_config.initial_capital);
    for (label, value) in metrics.comparison_lines() {
        eprintln!("{:<24}{}", format!("{}:", label), value);
    }

    if show_trades {
        eprintln!("\n=== Trades ===");
        let trades = output.table.trades();
        if trades.is_empty() {
            eprintln!("  (none)");
        }
        for trade in &trades {
            eprintln!("  {}  {:<4}  @ {:.2}", trade.date, trade.action, trade.price);
        }
    }

    if let Some(paper) = &output.paper {
        let filled = paper.outcomes.iter().filter(|o| o.is_ok()).count();
        eprintln!("\n=== Paper Trading ===");
        eprintln!("Orders filled:          {}/{}", filled, paper.outcomes.len());
        for rejection in paper.outcomes.iter().filter_map(|o| o.as_ref().err()) {
            eprintln!("  rejected: {}", rejection);
        }
        let last_close = output
            .table
            .signals
            .bars
            .last()
            .map(|b| b.close)
            .unwrap_or_default();
        let prices: HashMap<String, f64> =
            [(run_config.symbol.clone(), last_close)].into_iter().collect();
        eprintln!("Cash:                   {:.2}", paper.ledger.cash);
        eprintln!(
            "Shares held:            {}",
            paper.ledger.position(&run_config.symbol)
        );
        eprintln!("Ledger equity:          {:.2}", paper.ledger.equity(&prices));
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    let strategy = match build_strategy(&adapter, None) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Configuration is valid");
    eprintln!("  Strategy: {}", strategy);
    ExitCode::SUCCESS
}

fn run_strategies() -> ExitCode {
    for kind in StrategyKind::ALL {
        let defaults = kind.default_params();
        let params: Vec<String> = kind
            .param_keys()
            .iter()
            .map(|k| format!("{}={}", k, defaults.get(*k).copied().unwrap_or_default()))
            .collect();
        println!("{:<24}{}", kind.display_name(), params.join(", "));
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_backtest_flags() {
        let cli = Cli::try_parse_from([
            "autoquant",
            "backtest",
            "-c",
            "cfg.ini",
            "--symbol",
            "MSFT",
            "--strategy",
            "RSI Strategy",
            "-o",
            "out.csv",
            "--trades",
            "--paper-qty",
            "10",
        ])
        .unwrap();
        match cli.command {
            Command::Backtest {
                config,
                symbol,
                strategy,
                output,
                trades,
                paper_qty,
                data_dir,
            } => {
                assert_eq!(config, PathBuf::from("cfg.ini"));
                assert_eq!(symbol.as_deref(), Some("MSFT"));
                assert_eq!(strategy.as_deref(), Some("RSI Strategy"));
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert!(trades);
                assert_eq!(paper_qty, Some(10));
                assert_eq!(data_dir, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_strategies_subcommand() {
        let cli = Cli::try_parse_from(["autoquant", "strategies"]).unwrap();
        assert!(matches!(cli.command, Command::Strategies));
    }

    #[test]
    fn backtest_requires_config() {
        assert!(Cli::try_parse_from(["autoquant", "backtest"]).is_err());
    }
}

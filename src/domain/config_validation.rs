//! Configuration validation.
//!
//! Validates all config fields before a backtest runs.

use crate::domain::backtest::DEFAULT_INITIAL_CAPITAL;
use crate::domain::error::AutoquantError;
use crate::domain::strategy::{Strategy, StrategyKind, StrategyParams};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), AutoquantError> {
    validate_initial_capital(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    validate_symbol(config)?;
    read_trade_quantity(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), AutoquantError> {
    let name = strategy_name(config)?;
    let params = read_strategy_params(config, &name)?;
    Strategy::from_params(&name, &params).map_err(|e| into_config_error(e, &name))?;
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), AutoquantError> {
    let value = config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL);
    if !value.is_finite() || value <= 0.0 {
        return Err(AutoquantError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), AutoquantError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if !(0.0..1.0).contains(&value) {
        return Err(AutoquantError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "risk_free_rate".to_string(),
            reason: "risk_free_rate must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), AutoquantError> {
    read_date_range(config).map(|_| ())
}

/// Parse `[data] start_date` / `end_date`; start must precede end.
pub fn read_date_range(config: &dyn ConfigPort) -> Result<(NaiveDate, NaiveDate), AutoquantError> {
    let start_str = config.get_string("data", "start_date");
    let end_str = config.get_string("data", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(AutoquantError::ConfigInvalid {
            section: "data".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok((start_date, end_date))
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, AutoquantError> {
    match value {
        None => Err(AutoquantError::ConfigMissing {
            section: "data".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            AutoquantError::ConfigInvalid {
                section: "data".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), AutoquantError> {
    match config.get_string("data", "symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(AutoquantError::ConfigMissing {
            section: "data".to_string(),
            key: "symbol".to_string(),
        }),
    }
}

/// Optional `[backtest] trade_quantity`, a positive whole share count.
pub fn read_trade_quantity(config: &dyn ConfigPort) -> Result<Option<u64>, AutoquantError> {
    match config.get_string("backtest", "trade_quantity") {
        None => Ok(None),
        Some(s) => match s.trim().parse::<u64>() {
            Ok(q) if q > 0 => Ok(Some(q)),
            _ => Err(AutoquantError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "trade_quantity".to_string(),
                reason: "trade_quantity must be a positive integer".to_string(),
            }),
        },
    }
}

pub fn strategy_name(config: &dyn ConfigPort) -> Result<String, AutoquantError> {
    match config.get_string("strategy", "name") {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(AutoquantError::ConfigMissing {
            section: "strategy".to_string(),
            key: "name".to_string(),
        }),
    }
}

/// Read the named strategy's parameters from `[strategy]`. Keys that are
/// absent take the strategy's default value.
pub fn read_strategy_params(
    config: &dyn ConfigPort,
    name: &str,
) -> Result<StrategyParams, AutoquantError> {
    let kind = StrategyKind::from_name(name).map_err(|e| into_config_error(e, "name"))?;
    let mut params = kind.default_params();

    for key in kind.param_keys() {
        if let Some(raw) = config.get_string("strategy", key) {
            let value = raw
                .trim()
                .parse::<f64>()
                .map_err(|_| AutoquantError::ConfigInvalid {
                    section: "strategy".to_string(),
                    key: key.to_string(),
                    reason: format!("'{}' is not a number", raw),
                })?;
            params.insert(key.to_string(), value);
        }
    }
    Ok(params)
}

fn into_config_error(err: AutoquantError, fallback_key: &str) -> AutoquantError {
    match err {
        AutoquantError::InvalidParameter { name, reason } => AutoquantError::ConfigInvalid {
            section: "strategy".to_string(),
            key: if name == "strategy" {
                fallback_key.to_string()
            } else {
                name
            },
            reason,
        },
        other => other,
    }
}

//! Strategy selection and parameter validation.
//!
//! A strategy is one of a closed set of indicator rules, each carrying its own
//! parameter record. Construction from a loose name + key/value map rejects
//! unknown names, missing keys and out-of-range values before any computation.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::AutoquantError;

/// Loose parameter map as read from configuration, e.g. `short_window -> 50`.
pub type StrategyParams = BTreeMap<String, f64>;

/// Largest accepted window or period.
pub const MAX_WINDOW: usize = u32::MAX as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    SmaCrossover,
    EmaCrossover,
    SmaLongOnly,
    Rsi,
    Bollinger,
    Macd,
    Stochastic,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 7] = [
        StrategyKind::SmaCrossover,
        StrategyKind::EmaCrossover,
        StrategyKind::SmaLongOnly,
        StrategyKind::Rsi,
        StrategyKind::Bollinger,
        StrategyKind::Macd,
        StrategyKind::Stochastic,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            StrategyKind::SmaCrossover => "SMA Crossover",
            StrategyKind::EmaCrossover => "EMA Crossover",
            StrategyKind::SmaLongOnly => "SMA Long Only",
            StrategyKind::Rsi => "RSI Strategy",
            StrategyKind::Bollinger => "Bollinger Bands",
            StrategyKind::Macd => "MACD Crossover",
            StrategyKind::Stochastic => "Stochastic Oscillator",
        }
    }

    fn aliases(self) -> &'static [&'static str] {
        match self {
            StrategyKind::SmaCrossover => &["sma"],
            StrategyKind::EmaCrossover => &["ema"],
            StrategyKind::SmaLongOnly => &["long_only", "trend"],
            StrategyKind::Rsi => &["rsi"],
            StrategyKind::Bollinger => &["bollinger"],
            StrategyKind::Macd => &["macd"],
            StrategyKind::Stochastic => &["stochastic", "stoch"],
        }
    }

    /// Parameter keys in declaration order.
    pub fn param_keys(self) -> &'static [&'static str] {
        match self {
            StrategyKind::SmaCrossover | StrategyKind::EmaCrossover => {
                &["short_window", "long_window"]
            }
            StrategyKind::SmaLongOnly => &["window"],
            StrategyKind::Rsi => &["period", "overbought", "oversold"],
            StrategyKind::Bollinger => &["window", "num_std"],
            StrategyKind::Macd => &["fast", "slow", "signal"],
            StrategyKind::Stochastic => &["k_period", "d_period", "overbought", "oversold"],
        }
    }

    /// Default parameter values for each strategy.
    pub fn default_params(self) -> StrategyParams {
        let pairs: &[(&str, f64)] = match self {
            StrategyKind::SmaCrossover | StrategyKind::EmaCrossover => {
                &[("short_window", 50.0), ("long_window", 200.0)]
            }
            StrategyKind::SmaLongOnly => &[("window", 200.0)],
            StrategyKind::Rsi => &[("period", 14.0), ("overbought", 70.0), ("oversold", 30.0)],
            StrategyKind::Bollinger => &[("window", 20.0), ("num_std", 2.0)],
            StrategyKind::Macd => &[("fast", 12.0), ("slow", 26.0), ("signal", 9.0)],
            StrategyKind::Stochastic => &[
                ("k_period", 14.0),
                ("d_period", 3.0),
                ("overbought", 80.0),
                ("oversold", 20.0),
            ],
        };
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    /// Case-, space- and underscore-insensitive lookup by display name or alias.
    pub fn from_name(name: &str) -> Result<Self, AutoquantError> {
        let wanted = normalize(name);
        StrategyKind::ALL
            .into_iter()
            .find(|kind| {
                normalize(kind.display_name()) == wanted
                    || kind.aliases().iter().any(|a| normalize(a) == wanted)
            })
            .ok_or_else(|| {
                AutoquantError::invalid_parameter("strategy", format!("unknown strategy '{}'", name))
            })
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    SmaCrossover {
        short_window: usize,
        long_window: usize,
    },
    EmaCrossover {
        short_window: usize,
        long_window: usize,
    },
    SmaLongOnly {
        window: usize,
    },
    Rsi {
        period: usize,
        overbought: f64,
        oversold: f64,
    },
    Bollinger {
        window: usize,
        num_std: f64,
    },
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Stochastic {
        k_period: usize,
        d_period: usize,
        overbought: f64,
        oversold: f64,
    },
}

impl Strategy {
    /// Build and validate a strategy from a name and a parameter map.
    /// Keys match ignoring case and underscores, so `shortWindow` and
    /// `short_window` are equivalent.
    pub fn from_params(name: &str, params: &StrategyParams) -> Result<Self, AutoquantError> {
        let kind = StrategyKind::from_name(name)?;
        let p = ParamReader { params };

        let strategy = match kind {
            StrategyKind::SmaCrossover => Strategy::SmaCrossover {
                short_window: p.usize("short_window")?,
                long_window: p.usize("long_window")?,
            },
            StrategyKind::EmaCrossover => Strategy::EmaCrossover {
                short_window: p.usize("short_window")?,
                long_window: p.usize("long_window")?,
            },
            StrategyKind::SmaLongOnly => Strategy::SmaLongOnly {
                window: p.usize("window")?,
            },
            StrategyKind::Rsi => Strategy::Rsi {
                period: p.usize("period")?,
                overbought: p.float("overbought")?,
                oversold: p.float("oversold")?,
            },
            StrategyKind::Bollinger => Strategy::Bollinger {
                window: p.usize("window")?,
                num_std: p.float("num_std")?,
            },
            StrategyKind::Macd => Strategy::Macd {
                fast: p.usize("fast")?,
                slow: p.usize("slow")?,
                signal: p.usize("signal")?,
            },
            StrategyKind::Stochastic => Strategy::Stochastic {
                k_period: p.usize("k_period")?,
                d_period: p.usize("d_period")?,
                overbought: p.float("overbought")?,
                oversold: p.float("oversold")?,
            },
        };

        strategy.validate()?;
        Ok(strategy)
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::SmaCrossover { .. } => StrategyKind::SmaCrossover,
            Strategy::EmaCrossover { .. } => StrategyKind::EmaCrossover,
            Strategy::SmaLongOnly { .. } => StrategyKind::SmaLongOnly,
            Strategy::Rsi { .. } => StrategyKind::Rsi,
            Strategy::Bollinger { .. } => StrategyKind::Bollinger,
            Strategy::Macd { .. } => StrategyKind::Macd,
            Strategy::Stochastic { .. } => StrategyKind::Stochastic,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().display_name()
    }

    /// Threshold strategies carry their previous signal between crossings.
    pub fn is_stateful(&self) -> bool {
        matches!(
            self,
            Strategy::Rsi { .. } | Strategy::Bollinger { .. } | Strategy::Stochastic { .. }
        )
    }

    pub fn validate(&self) -> Result<(), AutoquantError> {
        match *self {
            Strategy::SmaCrossover {
                short_window,
                long_window,
            }
            | Strategy::EmaCrossover {
                short_window,
                long_window,
            } => {
                positive("short_window", short_window)?;
                positive("long_window", long_window)?;
                if short_window >= long_window {
                    return Err(AutoquantError::invalid_parameter(
                        "short_window",
                        format!(
                            "short_window ({}) must be less than long_window ({})",
                            short_window, long_window
                        ),
                    ));
                }
            }
            Strategy::SmaLongOnly { window } => positive("window", window)?,
            Strategy::Rsi {
                period,
                overbought,
                oversold,
            } => {
                positive("period", period)?;
                thresholds(overbought, oversold)?;
            }
            Strategy::Bollinger { window, num_std } => {
                if window < 2 {
                    return Err(AutoquantError::invalid_parameter(
                        "window",
                        "Bollinger window must be at least 2",
                    ));
                }
                positive("window", window)?;
                if !num_std.is_finite() || num_std <= 0.0 {
                    return Err(AutoquantError::invalid_parameter(
                        "num_std",
                        "num_std must be positive",
                    ));
                }
            }
            Strategy::Macd { fast, slow, signal } => {
                positive("fast", fast)?;
                positive("slow", slow)?;
                positive("signal", signal)?;
                if fast >= slow {
                    return Err(AutoquantError::invalid_parameter(
                        "fast",
                        format!("fast ({}) must be less than slow ({})", fast, slow),
                    ));
                }
            }
            Strategy::Stochastic {
                k_period,
                d_period,
                overbought,
                oversold,
            } => {
                positive("k_period", k_period)?;
                positive("d_period", d_period)?;
                thresholds(overbought, oversold)?;
            }
        }
        Ok(())
    }

    /// The parameter map this strategy was (or could have been) built from.
    pub fn params(&self) -> StrategyParams {
        let pairs: Vec<(&str, f64)> = match *self {
            Strategy::SmaCrossover {
                short_window,
                long_window,
            }
            | Strategy::EmaCrossover {
                short_window,
                long_window,
            } => vec![
                ("short_window", short_window as f64),
                ("long_window", long_window as f64),
            ],
            Strategy::SmaLongOnly { window } => vec![("window", window as f64)],
            Strategy::Rsi {
                period,
                overbought,
                oversold,
            } => vec![
                ("period", period as f64),
                ("overbought", overbought),
                ("oversold", oversold),
            ],
            Strategy::Bollinger { window, num_std } => {
                vec![("window", window as f64), ("num_std", num_std)]
            }
            Strategy::Macd { fast, slow, signal } => vec![
                ("fast", fast as f64),
                ("slow", slow as f64),
                ("signal", signal as f64),
            ],
            Strategy::Stochastic {
                k_period,
                d_period,
                overbought,
                oversold,
            } => vec![
                ("k_period", k_period as f64),
                ("d_period", d_period as f64),
                ("overbought", overbought),
                ("oversold", oversold),
            ],
        };
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        let params = self.params();
        for (i, key) in self.kind().param_keys().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", key, params.get(*key).copied().unwrap_or_default())?;
        }
        write!(f, ")")
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

struct ParamReader<'a> {
    params: &'a StrategyParams,
}

impl ParamReader<'_> {
    fn float(&self, key: &str) -> Result<f64, AutoquantError> {
        let wanted = normalize(key);
        let value = self
            .params
            .iter()
            .find(|(k, _)| normalize(k) == wanted)
            .map(|(_, v)| *v)
            .ok_or_else(|| AutoquantError::invalid_parameter(key, "missing required parameter"))?;
        if !value.is_finite() {
            return Err(AutoquantError::invalid_parameter(key, "must be a finite number"));
        }
        Ok(value)
    }

    fn usize(&self, key: &str) -> Result<usize, AutoquantError> {
        let value = self.float(key)?;
        if value < 1.0 || value.fract() != 0.0 {
            return Err(AutoquantError::invalid_parameter(
                key,
                format!("must be a positive whole number, got {}", value),
            ));
        }
        if value > MAX_WINDOW as f64 {
            return Err(AutoquantError::invalid_parameter(
                key,
                format!("must be at most {}, got {}", MAX_WINDOW, value),
            ));
        }
        Ok(value as usize)
    }
}

fn positive(name: &str, value: usize) -> Result<(), AutoquantError> {
    if value == 0 {
        return Err(AutoquantError::invalid_parameter(name, "must be at least 1"));
    }
    if value > MAX_WINDOW {
        return Err(AutoquantError::invalid_parameter(
            name,
            format!("must be at most {}", MAX_WINDOW),
        ));
    }
    Ok(())
}

fn thresholds(overbought: f64, oversold: f64) -> Result<(), AutoquantError> {
    if !overbought.is_finite() || !oversold.is_finite() {
        return Err(AutoquantError::invalid_parameter(
            "overbought",
            "thresholds must be finite",
        ));
    }
    if oversold >= overbought {
        return Err(AutoquantError::invalid_parameter(
            "oversold",
            format!(
                "oversold ({}) must be below overbought ({})",
                oversold, overbought
            ),
        ));
    }
    Ok(())
}

//! Cash/position ledger for simulated market orders.
//!
//! Orders fill immediately at the caller's price. An order that fails its
//! funds or holdings check is rejected and leaves the ledger untouched.

use chrono::{NaiveDateTime, NaiveTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

use super::backtest::{TradeAction, TradeEvent};
use super::error::AutoquantError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for Side {
    type Err = OrderRejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            _ => Err(OrderRejection::InvalidOrder {
                reason: format!("invalid side '{}'", s),
            }),
        }
    }
}

impl From<TradeAction> for Side {
    fn from(action: TradeAction) -> Self {
        match action {
            TradeAction::Buy => Side::Buy,
            TradeAction::Sell => Side::Sell,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrderRejection {
    #[error("insufficient funds: need {required:.2}, have {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient position in {symbol}: need {required}, hold {held}")]
    InsufficientPosition {
        symbol: String,
        required: u64,
        held: u64,
    },

    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub side: Side,
    pub quantity: u64,
    pub price: f64,
}

impl Transaction {
    pub fn notional(&self) -> f64 {
        self.quantity as f64 * self.price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub cash: f64,
    pub positions: HashMap<String, u64>,
    pub history: Vec<Transaction>,
}

impl Ledger {
    /// Starting cash must be finite and non-negative.
    pub fn new(cash: f64) -> Result<Self, AutoquantError> {
        if !cash.is_finite() || cash < 0.0 {
            return Err(AutoquantError::invalid_parameter(
                "cash",
                format!("starting cash must be finite and non-negative, got {}", cash),
            ));
        }
        Ok(Ledger {
            cash,
            positions: HashMap::new(),
            history: Vec::new(),
        })
    }

    pub fn position(&self, symbol: &str) -> u64 {
        self.positions.get(symbol).copied().unwrap_or(0)
    }

    pub fn place_order(
        &mut self,
        symbol: &str,
        quantity: u64,
        side: Side,
        price: f64,
    ) -> Result<Transaction, OrderRejection> {
        self.place_order_at(symbol, quantity, side, price, Utc::now().naive_utc())
    }

    pub fn place_order_at(
        &mut self,
        symbol: &str,
        quantity: u64,
        side: Side,
        price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<Transaction, OrderRejection> {
        let result = self.apply(symbol, quantity, side, price, timestamp);
        match &result {
            Ok(tx) => info!(
                symbol,
                side = %tx.side,
                quantity,
                price,
                cash = self.cash,
                "order filled"
            ),
            Err(rejection) => warn!(symbol, side = %side, quantity, price, %rejection, "order rejected"),
        }
        result
    }

    fn apply(
        &mut self,
        symbol: &str,
        quantity: u64,
        side: Side,
        price: f64,
        timestamp: NaiveDateTime,
    ) -> Result<Transaction, OrderRejection> {
        if quantity == 0 {
            return Err(OrderRejection::InvalidOrder {
                reason: "quantity must be positive".into(),
            });
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(OrderRejection::InvalidOrder {
                reason: format!("price must be positive, got {}", price),
            });
        }

        let notional = quantity as f64 * price;
        match side {
            Side::Buy => {
                if self.cash < notional {
                    return Err(OrderRejection::InsufficientFunds {
                        required: notional,
                        available: self.cash,
                    });
                }
                self.cash -= notional;
                *self.positions.entry(symbol.to_string()).or_insert(0) += quantity;
            }
            Side::Sell => {
                let held = self.position(symbol);
                if held < quantity {
                    return Err(OrderRejection::InsufficientPosition {
                        symbol: symbol.to_string(),
                        required: quantity,
                        held,
                    });
                }
                self.cash += notional;
                if held == quantity {
                    self.positions.remove(symbol);
                } else {
                    self.positions.insert(symbol.to_string(), held - quantity);
                }
            }
        }

        let tx = Transaction {
            timestamp,
            symbol: symbol.to_string(),
            side,
            quantity,
            price,
        };
        self.history.push(tx.clone());
        Ok(tx)
    }

    /// Cash plus positions marked at `price_map`; unpriced holdings count as zero.
    pub fn equity(&self, price_map: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .iter()
            .filter_map(|(symbol, qty)| price_map.get(symbol).map(|p| *qty as f64 * p))
            .sum();
        self.cash + position_value
    }
}

/// A ledger behind a mutex, cloneable across threads. Each order holds the
/// lock for its whole check-and-update.
#[derive(Debug, Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(cash: f64) -> Result<Self, AutoquantError> {
        Ok(SharedLedger {
            inner: Arc::new(Mutex::new(Ledger::new(cash)?)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        // a panicked holder cannot leave a half-applied order behind
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn place_order(
        &self,
        symbol: &str,
        quantity: u64,
        side: Side,
        price: f64,
    ) -> Result<Transaction, OrderRejection> {
        self.lock().place_order(symbol, quantity, side, price)
    }

    pub fn snapshot(&self) -> Ledger {
        self.lock().clone()
    }
}

/// Paper-trade a backtest's trade log at a fixed share quantity.
pub fn replay_trades(
    ledger: &mut Ledger,
    symbol: &str,
    trades: &[TradeEvent],
    quantity: u64,
) -> Vec<Result<Transaction, OrderRejection>> {
    trades
        .iter()
        .map(|trade| {
            ledger.place_order_at(
                symbol,
                quantity,
                Side::from(trade.action),
                trade.price,
                trade.date.and_time(NaiveTime::MIN),
            )
        })
        .collect()
}

//! Collaborator seams.
//!
//! The engine is invoked synchronously by an external backtest loop and
//! talks to the rest of the system only through these traits. All of them
//! are mocked in tests; none of them imply any I/O on the hot path.

use std::collections::HashMap;

use crate::domain::{Bar, Symbol};

/// Which bar column to read from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    Volume,
}

/// Historical and current market data, served by the backtest data layer.
///
/// Histories end at the current simulated bar — the data layer must never
/// serve future bars, and the engine never asks for them.
pub trait MarketData {
    /// The most recent `periods` bars for a symbol, oldest first. Gaps are
    /// NaN-filled bars, not missing rows. May return fewer bars than asked
    /// for when history is short.
    fn bars(&self, symbol: &str, periods: usize) -> Vec<Bar>;

    /// Latest trade price, if the symbol has one this bar.
    fn current_price(&self, symbol: &str) -> Option<f64>;

    /// Whether orders for the symbol would be accepted this bar.
    fn can_trade(&self, symbol: &str) -> bool;

    /// One column of history, derived from [`MarketData::bars`].
    fn history(&self, symbol: &str, field: PriceField, periods: usize) -> Vec<f64> {
        self.bars(symbol, periods)
            .iter()
            .map(|bar| match field {
                PriceField::Open => bar.open,
                PriceField::High => bar.high,
                PriceField::Low => bar.low,
                PriceField::Close => bar.close,
                PriceField::Volume => bar.volume,
            })
            .collect()
    }
}

/// The strategy capability pair: universe selection plus alpha.
///
/// Deliberately a flat trait boundary rather than an inheritance hook — the
/// engine consumes whatever implements it and treats the signal values as
/// opaque conviction in [-1, 1].
pub trait Strategy {
    fn select_universe(&self, data: &dyn MarketData) -> Vec<Symbol>;

    fn generate_signals(
        &self,
        universe: &[Symbol],
        data: &dyn MarketData,
    ) -> HashMap<Symbol, f64>;
}

/// The backtester's portfolio ledger (fills live there, not here).
pub trait PortfolioLedger {
    /// Total account equity.
    fn portfolio_value(&self) -> f64;

    /// Currently held exposure per symbol as a signed fraction of equity.
    fn current_positions(&self) -> HashMap<Symbol, f64>;
}

/// Order emission boundary: the engine sets target fractions, the
/// execution collaborator does the rest.
pub trait OrderSink {
    fn set_target_fraction(&mut self, symbol: &str, fraction: f64);
}

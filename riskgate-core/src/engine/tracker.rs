//! Portfolio state tracker — the single owner of portfolio-level state and
//! the per-symbol position arena.
//!
//! All position lifecycle goes through the explicit open/update/close
//! operations here; no other component holds its own copy of a position.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::domain::{PortfolioState, PositionState, Symbol};

#[derive(Debug, Default)]
pub struct PortfolioTracker {
    state: PortfolioState,
    positions: HashMap<Symbol, PositionState>,
}

impl PortfolioTracker {
    pub fn new() -> Self {
        Self {
            state: PortfolioState::new(),
            positions: HashMap::new(),
        }
    }

    /// Refresh portfolio-level state from ledger-reported values. Runs at
    /// the start of every cycle, before the gate.
    pub fn refresh(&mut self, now: NaiveDateTime, equity: f64, gross_leverage: f64) {
        self.state.refresh(now, equity, gross_leverage);
    }

    pub fn portfolio(&self) -> &PortfolioState {
        &self.state
    }

    pub fn position(&self, symbol: &str) -> Option<&PositionState> {
        self.positions.get(symbol)
    }

    pub fn position_mut(&mut self, symbol: &str) -> Option<&mut PositionState> {
        self.positions.get_mut(symbol)
    }

    /// Symbols with open positions, sorted for deterministic iteration.
    pub fn open_symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.positions.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Install a freshly opened position. Replaces any stale record.
    pub fn open_position(&mut self, position: PositionState) {
        self.positions.insert(position.symbol.clone(), position);
    }

    /// Update the target for an already-open position.
    pub fn set_target(&mut self, symbol: &str, fraction: f64) {
        if let Some(position) = self.positions.get_mut(symbol) {
            position.target_fraction = fraction;
        }
    }

    /// Remove a closed position, returning its final state.
    pub fn close_position(&mut self, symbol: &str) -> Option<PositionState> {
        self.positions.remove(symbol)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskParameters;
    use chrono::NaiveDate;

    fn open(symbol: &str, fraction: f64) -> PositionState {
        PositionState::open(
            symbol.into(),
            fraction,
            100.0,
            &RiskParameters::default(),
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        )
    }

    #[test]
    fn open_update_close_lifecycle() {
        let mut tracker = PortfolioTracker::new();
        assert!(tracker.is_empty());

        tracker.open_position(open("SPY", 0.1));
        assert_eq!(tracker.len(), 1);
        assert_eq!(tracker.position("SPY").unwrap().target_fraction, 0.1);

        tracker.set_target("SPY", 0.05);
        assert_eq!(tracker.position("SPY").unwrap().target_fraction, 0.05);

        let closed = tracker.close_position("SPY").unwrap();
        assert_eq!(closed.symbol, "SPY");
        assert!(tracker.is_empty());
    }

    #[test]
    fn open_symbols_are_sorted() {
        let mut tracker = PortfolioTracker::new();
        tracker.open_position(open("QQQ", 0.1));
        tracker.open_position(open("AAPL", 0.1));
        tracker.open_position(open("SPY", -0.1));
        assert_eq!(tracker.open_symbols(), vec!["AAPL", "QQQ", "SPY"]);
    }

    #[test]
    fn set_target_on_unknown_symbol_is_a_no_op() {
        let mut tracker = PortfolioTracker::new();
        tracker.set_target("SPY", 0.5);
        assert!(tracker.is_empty());
    }
}

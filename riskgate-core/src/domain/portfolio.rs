//! Portfolio-level state: peak equity, daily P&L, leverage.
//!
//! Invariants: `peak_equity` is non-decreasing; `daily_pnl` resets exactly
//! once per calendar trading day, on the first refresh of that day, before
//! the gate runs.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Aggregate portfolio state, refreshed at the start of every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    /// Equity as reported by the ledger at the last refresh.
    pub equity: f64,
    /// Monotonic high-water mark of equity.
    pub peak_equity: f64,
    /// Day-to-date P&L as a fraction of day-start equity. Negative is a loss.
    pub daily_pnl: f64,
    /// Equity at the first refresh of the current trading day.
    pub day_start_equity: f64,
    /// Gross exposure / equity.
    pub current_leverage: f64,
    /// Trading day of the last refresh; `None` before the first cycle.
    pub current_day: Option<NaiveDate>,
}

impl PortfolioState {
    pub fn new() -> Self {
        Self {
            equity: 0.0,
            peak_equity: 0.0,
            daily_pnl: 0.0,
            day_start_equity: 0.0,
            current_leverage: 0.0,
            current_day: None,
        }
    }

    /// Refresh from ledger-reported equity and gross leverage.
    ///
    /// Rolls the trading day when the date changes: day-start equity is
    /// re-anchored and `daily_pnl` returns to zero before anything else in
    /// the cycle can read it.
    pub fn refresh(&mut self, now: NaiveDateTime, equity: f64, gross_leverage: f64) {
        let day = now.date();
        if self.current_day != Some(day) {
            self.current_day = Some(day);
            self.day_start_equity = equity;
            self.daily_pnl = 0.0;
        } else if self.day_start_equity > 0.0 {
            self.daily_pnl = equity / self.day_start_equity - 1.0;
        }

        self.equity = equity;
        self.peak_equity = self.peak_equity.max(equity);
        self.current_leverage = gross_leverage;
    }

    /// Current drawdown from the peak, as a non-positive fraction.
    pub fn drawdown(&self) -> f64 {
        if self.peak_equity > 0.0 {
            self.equity / self.peak_equity - 1.0
        } else {
            0.0
        }
    }
}

impl Default for PortfolioState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn peak_equity_is_monotone() {
        let mut state = PortfolioState::new();
        state.refresh(dt(1, 16), 100_000.0, 0.5);
        assert_eq!(state.peak_equity, 100_000.0);
        state.refresh(dt(2, 16), 120_000.0, 0.5);
        assert_eq!(state.peak_equity, 120_000.0);
        state.refresh(dt(3, 16), 90_000.0, 0.5);
        assert_eq!(state.peak_equity, 120_000.0);
    }

    #[test]
    fn daily_pnl_tracks_within_day() {
        let mut state = PortfolioState::new();
        state.refresh(dt(1, 10), 100_000.0, 0.0);
        assert_eq!(state.daily_pnl, 0.0);
        state.refresh(dt(1, 14), 94_000.0, 0.0);
        assert!((state.daily_pnl + 0.06).abs() < 1e-12);
    }

    #[test]
    fn daily_pnl_resets_once_on_day_roll() {
        let mut state = PortfolioState::new();
        state.refresh(dt(1, 10), 100_000.0, 0.0);
        state.refresh(dt(1, 14), 94_000.0, 0.0);
        assert!(state.daily_pnl < 0.0);

        // First refresh of the next day re-anchors to the new day-start.
        state.refresh(dt(2, 10), 94_000.0, 0.0);
        assert_eq!(state.daily_pnl, 0.0);
        assert_eq!(state.day_start_equity, 94_000.0);

        // Second refresh the same day does not re-anchor.
        state.refresh(dt(2, 14), 95_000.0, 0.0);
        assert!(state.daily_pnl > 0.0);
        assert_eq!(state.day_start_equity, 94_000.0);
    }

    #[test]
    fn drawdown_from_peak() {
        let mut state = PortfolioState::new();
        state.refresh(dt(1, 16), 100_000.0, 0.0);
        state.refresh(dt(2, 16), 80_000.0, 0.0);
        assert!((state.drawdown() + 0.20).abs() < 1e-12);
    }

    #[test]
    fn drawdown_is_zero_before_first_refresh() {
        assert_eq!(PortfolioState::new().drawdown(), 0.0);
    }
}

//! Position state — one record per currently-held symbol.
//!
//! Created when a target first becomes non-zero, mutated only through the
//! tracker while held, removed on closure. Stop and take-profit levels live
//! here; the stop may only tighten (the manager enforces the ratchet).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::RiskParameters;
use crate::domain::Symbol;

/// Position side (semantic representation of the target's sign).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// Determine side from a signed fraction. Zero is flat (no side).
    pub fn from_fraction(fraction: f64) -> Option<Self> {
        if fraction > 0.0 {
            Some(PositionSide::Long)
        } else if fraction < 0.0 {
            Some(PositionSide::Short)
        } else {
            None
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            PositionSide::Long => 1.0,
            PositionSide::Short => -1.0,
        }
    }
}

/// Why a position was force-closed independent of the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::StopLoss => write!(f, "stop_loss"),
            ExitReason::TakeProfit => write!(f, "take_profit"),
        }
    }
}

/// State for one open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub symbol: Symbol,
    pub side: PositionSide,
    /// Signed fraction of equity; |value| <= max_position_size.
    pub target_fraction: f64,
    pub entry_price: f64,
    pub stop_level: f64,
    pub take_profit_level: f64,
    /// Favorable price extreme since entry: max for longs, min for shorts.
    /// The trailing stop is derived from this mark.
    pub high_water_price: f64,
    pub opened_on: NaiveDate,
    pub bars_held: usize,
}

impl PositionState {
    /// Open a position and derive its initial protective levels.
    ///
    /// Long: stop below entry, take-profit above; short mirrored.
    pub fn open(
        symbol: Symbol,
        target_fraction: f64,
        entry_price: f64,
        params: &RiskParameters,
        opened_on: NaiveDate,
    ) -> Self {
        assert!(target_fraction != 0.0, "cannot open a flat position");
        assert!(entry_price > 0.0, "entry price must be positive");

        let side = if target_fraction > 0.0 {
            PositionSide::Long
        } else {
            PositionSide::Short
        };
        let (stop_level, take_profit_level) = match side {
            PositionSide::Long => (
                entry_price * (1.0 - params.stop_loss_pct),
                entry_price * (1.0 + params.take_profit_pct),
            ),
            PositionSide::Short => (
                entry_price * (1.0 + params.stop_loss_pct),
                entry_price * (1.0 - params.take_profit_pct),
            ),
        };

        Self {
            symbol,
            side,
            target_fraction,
            entry_price,
            stop_level,
            take_profit_level,
            high_water_price: entry_price,
            opened_on,
            bars_held: 0,
        }
    }

    /// Advance the favorable price extreme.
    pub fn update_water_mark(&mut self, price: f64) {
        self.high_water_price = match self.side {
            PositionSide::Long => self.high_water_price.max(price),
            PositionSide::Short => self.high_water_price.min(price),
        };
    }

    /// The stop level implied by the current water mark, before ratcheting.
    pub fn desired_stop(&self, stop_loss_pct: f64) -> f64 {
        match self.side {
            PositionSide::Long => self.high_water_price * (1.0 - stop_loss_pct),
            PositionSide::Short => self.high_water_price * (1.0 + stop_loss_pct),
        }
    }

    /// One more bar held.
    pub fn tick_bar(&mut self) {
        self.bars_held += 1;
    }

    /// Signed return at the given price.
    pub fn unrealized_return(&self, price: f64) -> f64 {
        (price / self.entry_price - 1.0) * self.side.sign()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RiskParameters {
        RiskParameters {
            stop_loss_pct: 0.08,
            take_profit_pct: 0.20,
            ..Default::default()
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn side_from_fraction() {
        assert_eq!(PositionSide::from_fraction(0.05), Some(PositionSide::Long));
        assert_eq!(PositionSide::from_fraction(-0.05), Some(PositionSide::Short));
        assert_eq!(PositionSide::from_fraction(0.0), None);
    }

    #[test]
    fn long_open_levels() {
        let pos = PositionState::open("SPY".into(), 0.1, 100.0, &params(), date());
        assert_eq!(pos.side, PositionSide::Long);
        assert!((pos.stop_level - 92.0).abs() < 1e-12);
        assert!((pos.take_profit_level - 120.0).abs() < 1e-12);
        assert_eq!(pos.high_water_price, 100.0);
    }

    #[test]
    fn short_open_levels() {
        let pos = PositionState::open("SPY".into(), -0.1, 100.0, &params(), date());
        assert_eq!(pos.side, PositionSide::Short);
        assert!((pos.stop_level - 108.0).abs() < 1e-12);
        assert!((pos.take_profit_level - 80.0).abs() < 1e-12);
    }

    #[test]
    fn long_water_mark_only_rises() {
        let mut pos = PositionState::open("SPY".into(), 0.1, 100.0, &params(), date());
        pos.update_water_mark(110.0);
        assert_eq!(pos.high_water_price, 110.0);
        pos.update_water_mark(95.0);
        assert_eq!(pos.high_water_price, 110.0);
    }

    #[test]
    fn short_water_mark_only_falls() {
        let mut pos = PositionState::open("SPY".into(), -0.1, 100.0, &params(), date());
        pos.update_water_mark(90.0);
        assert_eq!(pos.high_water_price, 90.0);
        pos.update_water_mark(105.0);
        assert_eq!(pos.high_water_price, 90.0);
    }

    #[test]
    fn unrealized_return_is_signed() {
        let long = PositionState::open("SPY".into(), 0.1, 100.0, &params(), date());
        let short = PositionState::open("SPY".into(), -0.1, 100.0, &params(), date());
        assert!((long.unrealized_return(110.0) - 0.10).abs() < 1e-12);
        assert!((short.unrealized_return(110.0) + 0.10).abs() < 1e-12);
    }
}

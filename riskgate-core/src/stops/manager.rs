//! Per-bar stop maintenance and breach detection.
//!
//! Every cycle a position is held: advance the water mark, re-derive the
//! trailing stop off it, ratchet, then test both protective levels against
//! the current price. The take-profit is fixed at entry and never moves.
//! Breaches force closure regardless of what the signal says this cycle.

use crate::config::RiskParameters;
use crate::domain::{ExitReason, PositionSide, PositionState};
use crate::stops::ratchet;

/// Advance the water mark and trail the stop, tighten-only.
pub fn refresh_levels(position: &mut PositionState, price: f64, params: &RiskParameters) {
    position.update_water_mark(price);
    let desired = position.desired_stop(params.stop_loss_pct);
    position.stop_level = ratchet(position.side, position.stop_level, desired);
}

/// Test the current price against both protective levels.
///
/// When a single bar crosses both, the stop-loss wins — the adverse reading
/// of an ambiguous bar.
pub fn breach(position: &PositionState, price: f64) -> Option<ExitReason> {
    match position.side {
        PositionSide::Long => {
            if price <= position.stop_level {
                Some(ExitReason::StopLoss)
            } else if price >= position.take_profit_level {
                Some(ExitReason::TakeProfit)
            } else {
                None
            }
        }
        PositionSide::Short => {
            if price >= position.stop_level {
                Some(ExitReason::StopLoss)
            } else if price <= position.take_profit_level {
                Some(ExitReason::TakeProfit)
            } else {
                None
            }
        }
    }
}

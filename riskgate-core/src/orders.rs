//! Order translation — the last step before emission.
//!
//! Pure filtering and rewriting of sized targets into target-fraction
//! orders. No position state is mutated here. Two filters apply:
//! the blacklist and the minimum-order threshold — but risk-reducing
//! orders (forced exits, closes of held positions) always pass both.

use serde::{Deserialize, Serialize};

use crate::config::RiskParameters;
use crate::domain::{ExitReason, Symbol};

/// Why an order was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderReason {
    /// Signal-driven entry or resize.
    Signal,
    /// Signal returned to flat on a held symbol.
    SignalExit,
    /// Forced closure: trailing stop breached.
    StopLoss,
    /// Forced closure: take-profit level reached.
    TakeProfit,
}

impl From<ExitReason> for OrderReason {
    fn from(reason: ExitReason) -> Self {
        match reason {
            ExitReason::StopLoss => OrderReason::StopLoss,
            ExitReason::TakeProfit => OrderReason::TakeProfit,
        }
    }
}

impl OrderReason {
    /// Forced exits bypass the blacklist and threshold filters.
    pub fn is_forced(self) -> bool {
        matches!(self, OrderReason::StopLoss | OrderReason::TakeProfit)
    }
}

/// A "set target portfolio fraction" instruction for the execution
/// collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetOrder {
    pub symbol: Symbol,
    pub fraction: f64,
    pub reason: OrderReason,
}

/// A sized target awaiting translation.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderCandidate {
    pub symbol: Symbol,
    pub target: f64,
    pub reason: OrderReason,
}

/// Why a candidate was dropped instead of emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    Blacklisted,
    BelowMinimum,
}

/// Result of translating one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    Emit(TargetOrder),
    Skip { symbol: Symbol, reason: SkipReason },
}

/// Translate one sized target.
///
/// `held_fraction` is the engine's current target for the symbol, if a
/// position is open. Rules:
/// - forced exits always emit;
/// - blacklisted symbols get no new exposure, but closes still pass;
/// - a sub-threshold target on a held symbol is an exit, not churn — it is
///   rewritten to an explicit flat order so round trips always close;
/// - a sub-threshold target with no position is economically meaningless
///   and is skipped.
pub fn translate(
    candidate: OrderCandidate,
    held_fraction: Option<f64>,
    params: &RiskParameters,
) -> Translation {
    let OrderCandidate {
        symbol,
        target,
        reason,
    } = candidate;

    if reason.is_forced() {
        return Translation::Emit(TargetOrder {
            symbol,
            fraction: 0.0,
            reason,
        });
    }

    let held = held_fraction.is_some_and(|f| f != 0.0);
    let closing = held && target.abs() < params.min_order_fraction.max(f64::MIN_POSITIVE);

    if closing {
        return Translation::Emit(TargetOrder {
            symbol,
            fraction: 0.0,
            reason: OrderReason::SignalExit,
        });
    }

    if params.blacklist.contains(&symbol) {
        return Translation::Skip {
            symbol,
            reason: SkipReason::Blacklisted,
        };
    }

    if target.abs() < params.min_order_fraction {
        return Translation::Skip {
            symbol,
            reason: SkipReason::BelowMinimum,
        };
    }

    Translation::Emit(TargetOrder {
        symbol,
        fraction: target,
        reason,
    })
}

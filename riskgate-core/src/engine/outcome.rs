//! Per-cycle reporting: what happened to each symbol, and run aggregates.
//!
//! The original pattern here was a blanket per-asset catch-and-ignore; the
//! explicit outcome type replaces it so tests can assert on exactly which
//! path a symbol took.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{ExitReason, Symbol};
use crate::gate::GateDecision;
use crate::orders::TargetOrder;
use crate::volatility::VolatilitySource;

/// What the engine did with one symbol in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SymbolOutcome {
    /// Sized normally; `target` may be zero (flat, no order needed).
    Sized {
        target: f64,
        vol_source: VolatilitySource,
    },
    /// A protective level fired; overrides the signal this cycle.
    ForcedExit(ExitReason),
    /// Unexpected non-finite computation; signal treated as flat.
    Coerced,
    SkippedBlacklist,
    SkippedBelowMinimum,
    SkippedNotTradable,
    /// Held position with no price this bar; levels left untouched.
    SkippedNoPrice,
}

/// Record of one rebalance cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceReport {
    pub timestamp: NaiveDateTime,
    pub gate: GateDecision,
    /// Outcome per symbol considered. Empty on denied cycles.
    pub outcomes: BTreeMap<Symbol, SymbolOutcome>,
    /// Orders actually emitted, in emission order.
    pub orders: Vec<TargetOrder>,
    /// Raw signals that needed clamping on intake.
    pub clamped_signals: usize,
    pub equity: f64,
    pub leverage: f64,
    pub daily_pnl: f64,
}

impl RebalanceReport {
    pub fn denied(&self) -> bool {
        !self.gate.is_allowed()
    }
}

/// Running aggregates across a whole run. Cheap bookkeeping for the final
/// printout; the per-cycle reports carry the detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSummary {
    pub cycles: usize,
    pub denied_cycles: usize,
    pub orders_emitted: usize,
    pub stop_exits: usize,
    pub take_profit_exits: usize,
    pub volatility_fallbacks: usize,
    pub coerced_symbols: usize,
    pub clamped_signals: usize,
}

impl EngineSummary {
    pub fn absorb(&mut self, report: &RebalanceReport) {
        self.cycles += 1;
        if report.denied() {
            self.denied_cycles += 1;
        }
        self.orders_emitted += report.orders.len();
        self.clamped_signals += report.clamped_signals;

        for outcome in report.outcomes.values() {
            match outcome {
                SymbolOutcome::ForcedExit(ExitReason::StopLoss) => self.stop_exits += 1,
                SymbolOutcome::ForcedExit(ExitReason::TakeProfit) => {
                    self.take_profit_exits += 1
                }
                SymbolOutcome::Sized { vol_source, .. }
                    if *vol_source == VolatilitySource::Fallback =>
                {
                    self.volatility_fallbacks += 1
                }
                SymbolOutcome::Coerced => self.coerced_symbols += 1,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::OrderReason;
    use chrono::NaiveDate;

    fn report(outcomes: Vec<(&str, SymbolOutcome)>, orders: usize) -> RebalanceReport {
        RebalanceReport {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(16, 0, 0)
                .unwrap(),
            gate: GateDecision::Allowed,
            outcomes: outcomes
                .into_iter()
                .map(|(s, o)| (s.to_string(), o))
                .collect(),
            orders: (0..orders)
                .map(|i| TargetOrder {
                    symbol: format!("S{i}"),
                    fraction: 0.01,
                    reason: OrderReason::Signal,
                })
                .collect(),
            clamped_signals: 1,
            equity: 100_000.0,
            leverage: 0.5,
            daily_pnl: 0.0,
        }
    }

    #[test]
    fn summary_absorbs_outcomes() {
        let mut summary = EngineSummary::default();
        summary.absorb(&report(
            vec![
                ("SPY", SymbolOutcome::ForcedExit(ExitReason::StopLoss)),
                ("QQQ", SymbolOutcome::ForcedExit(ExitReason::TakeProfit)),
                (
                    "IWM",
                    SymbolOutcome::Sized {
                        target: 0.05,
                        vol_source: VolatilitySource::Fallback,
                    },
                ),
                ("XLE", SymbolOutcome::Coerced),
            ],
            2,
        ));

        assert_eq!(summary.cycles, 1);
        assert_eq!(summary.stop_exits, 1);
        assert_eq!(summary.take_profit_exits, 1);
        assert_eq!(summary.volatility_fallbacks, 1);
        assert_eq!(summary.coerced_symbols, 1);
        assert_eq!(summary.orders_emitted, 2);
        assert_eq!(summary.clamped_signals, 1);
        assert_eq!(summary.denied_cycles, 0);
    }

    #[test]
    fn normally_sized_symbols_do_not_count_as_fallbacks() {
        let mut summary = EngineSummary::default();
        summary.absorb(&report(
            vec![(
                "SPY",
                SymbolOutcome::Sized {
                    target: 0.05,
                    vol_source: VolatilitySource::TrueRange,
                },
            )],
            1,
        ));
        assert_eq!(summary.volatility_fallbacks, 0);
    }
}

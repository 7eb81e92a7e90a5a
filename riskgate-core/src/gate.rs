//! Pre-trade risk gate.
//!
//! Three checks, evaluated in order, short-circuiting on the first failure:
//! leverage limit, daily-loss circuit breaker, blackout windows. A denial
//! skips the whole rebalance cycle. It is an expected control-flow outcome,
//! not an error — it is returned as data and logged at warning level by the
//! engine.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::RiskParameters;
use crate::domain::PortfolioState;

/// Why the gate denied trading for a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DenialReason {
    LeverageExceeded { leverage: f64, max_leverage: f64 },
    DailyLossBreached { daily_pnl: f64, limit: f64 },
    Blackout { label: String },
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::LeverageExceeded {
                leverage,
                max_leverage,
            } => write!(f, "leverage {leverage:.4} exceeds max {max_leverage:.4}"),
            DenialReason::DailyLossBreached { daily_pnl, limit } => {
                write!(f, "daily pnl {daily_pnl:.4} breaches limit {limit:.4}")
            }
            DenialReason::Blackout { label } => write!(f, "blackout window '{label}'"),
        }
    }
}

/// Outcome of the pre-trade check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateDecision {
    Allowed,
    Denied(DenialReason),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }
}

/// Evaluate the gate against the freshly-refreshed portfolio state.
///
/// The daily-loss denial persists for the rest of the trading day because
/// `daily_pnl` only resets on the next day's first refresh.
pub fn check(
    portfolio: &PortfolioState,
    params: &RiskParameters,
    now: NaiveDateTime,
) -> GateDecision {
    if portfolio.current_leverage > params.max_leverage {
        return GateDecision::Denied(DenialReason::LeverageExceeded {
            leverage: portfolio.current_leverage,
            max_leverage: params.max_leverage,
        });
    }

    if portfolio.daily_pnl < params.daily_loss_limit {
        return GateDecision::Denied(DenialReason::DailyLossBreached {
            daily_pnl: portfolio.daily_pnl,
            limit: params.daily_loss_limit,
        });
    }

    if let Some(window) = params.blackouts.iter().find(|w| w.contains(now)) {
        return GateDecision::Denied(DenialReason::Blackout {
            label: window.label.clone(),
        });
    }

    GateDecision::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlackoutWindow;
    use chrono::NaiveDate;

    fn dt(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn state(leverage: f64, daily_pnl: f64) -> PortfolioState {
        let mut s = PortfolioState::new();
        s.refresh(dt(1, 10), 100_000.0, leverage);
        s.daily_pnl = daily_pnl;
        s
    }

    #[test]
    fn allows_within_limits() {
        let decision = check(&state(0.8, -0.01), &RiskParameters::default(), dt(1, 10));
        assert!(decision.is_allowed());
    }

    #[test]
    fn denies_excess_leverage() {
        let decision = check(&state(1.05, 0.0), &RiskParameters::default(), dt(1, 10));
        assert_eq!(
            decision,
            GateDecision::Denied(DenialReason::LeverageExceeded {
                leverage: 1.05,
                max_leverage: 1.0,
            })
        );
    }

    #[test]
    fn leverage_exactly_at_max_is_allowed() {
        let decision = check(&state(1.0, 0.0), &RiskParameters::default(), dt(1, 10));
        assert!(decision.is_allowed());
    }

    #[test]
    fn denies_daily_loss_breach() {
        let decision = check(&state(0.5, -0.06), &RiskParameters::default(), dt(1, 10));
        assert_eq!(
            decision,
            GateDecision::Denied(DenialReason::DailyLossBreached {
                daily_pnl: -0.06,
                limit: -0.05,
            })
        );
    }

    #[test]
    fn leverage_check_wins_over_daily_loss() {
        let decision = check(&state(1.5, -0.10), &RiskParameters::default(), dt(1, 10));
        assert!(matches!(
            decision,
            GateDecision::Denied(DenialReason::LeverageExceeded { .. })
        ));
    }

    #[test]
    fn denies_inside_blackout() {
        let params = RiskParameters {
            blackouts: vec![BlackoutWindow {
                label: "fomc".into(),
                start: dt(1, 14),
                end: dt(1, 15),
            }],
            ..Default::default()
        };
        let decision = check(&state(0.5, 0.0), &params, dt(1, 14));
        assert_eq!(
            decision,
            GateDecision::Denied(DenialReason::Blackout {
                label: "fomc".into()
            })
        );
        assert!(check(&state(0.5, 0.0), &params, dt(1, 15)).is_allowed());
    }

    #[test]
    fn denial_reason_displays() {
        let reason = DenialReason::Blackout { label: "cpi".into() };
        assert_eq!(reason.to_string(), "blackout window 'cpi'");
    }
}

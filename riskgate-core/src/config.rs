//! Risk parameters — the immutable per-run configuration.
//!
//! `RiskParameters` is validated at construction and never changes while a
//! rebalance is in flight; the engine exposes an explicit swap operation that
//! may only run between cycles. The blake3 `config_hash` gives every run a
//! deterministic identity for artifact stamping.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Symbol;

/// A half-open `[start, end)` window during which all trading is halted
/// (e.g., a scheduled macro announcement).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackoutWindow {
    pub label: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl BlackoutWindow {
    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t < self.end
    }
}

/// Configuration violations detected by [`RiskParameters::validate`].
///
/// Every variant is fatal: the engine refuses to construct rather than run
/// with bounds that would produce nonsensical position sizes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamsError {
    #[error("max_leverage must be > 0, got {0}")]
    MaxLeverage(f64),
    #[error("stop_loss_pct must be in (0, 1), got {0}")]
    StopLossPct(f64),
    #[error("take_profit_pct must be in (0, 1), got {0}")]
    TakeProfitPct(f64),
    #[error("max_position_size must be in (0, 1], got {0}")]
    MaxPositionSize(f64),
    #[error("daily_loss_limit must be a negative fraction, got {0}")]
    DailyLossLimit(f64),
    #[error("per_trade_risk must be in (0, 1), got {0}")]
    PerTradeRisk(f64),
    #[error("min_stop_fraction must be > 0, got {0}")]
    MinStopFraction(f64),
    #[error("min_order_fraction must be >= 0 and finite, got {0}")]
    MinOrderFraction(f64),
    #[error("atr_window must be >= 1")]
    AtrWindow,
    #[error("fallback_atr_fraction must be > 0, got {0}")]
    FallbackAtrFraction(f64),
    #[error("blackout window '{0}' has end <= start")]
    Blackout(String),
    #[error("failed to parse risk parameters: {0}")]
    Toml(String),
}

/// Risk configuration for one backtest run.
///
/// Fractional fields are fractions of equity unless noted. The struct is
/// serde-loadable from TOML; absent fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskParameters {
    /// Maximum gross exposure / equity before the gate trips.
    pub max_leverage: f64,
    /// Initial stop distance as a fraction of entry price.
    pub stop_loss_pct: f64,
    /// Fixed take-profit distance as a fraction of entry price.
    pub take_profit_pct: f64,
    /// Cap on |target fraction| per position.
    pub max_position_size: f64,
    /// Daily circuit breaker: negative fraction of day-start equity.
    pub daily_loss_limit: f64,
    /// Equity fraction risked per trade (Van Tharp risk budget).
    pub per_trade_risk: f64,
    /// Floor on the stop distance used for sizing; prevents unbounded
    /// positions when volatility collapses to zero.
    pub min_stop_fraction: f64,
    /// Targets smaller than this are churn and are not emitted.
    pub min_order_fraction: f64,
    /// ATR lookback in bars.
    pub atr_window: usize,
    /// Conservative ATR fraction assumed when history is unusable.
    pub fallback_atr_fraction: f64,
    /// Symbols that may never receive new exposure.
    pub blacklist: BTreeSet<Symbol>,
    /// Scheduled trading halts.
    pub blackouts: Vec<BlackoutWindow>,
}

impl Default for RiskParameters {
    fn default() -> Self {
        Self {
            max_leverage: 1.0,
            stop_loss_pct: 0.08,
            take_profit_pct: 0.20,
            max_position_size: 0.10,
            daily_loss_limit: -0.05,
            per_trade_risk: 0.01,
            min_stop_fraction: 0.01,
            min_order_fraction: 0.001,
            atr_window: 14,
            fallback_atr_fraction: 0.02,
            blacklist: BTreeSet::new(),
            blackouts: Vec::new(),
        }
    }
}

impl RiskParameters {
    /// Check every bound. Returns the first violation found.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.max_leverage > 0.0) || !self.max_leverage.is_finite() {
            return Err(ParamsError::MaxLeverage(self.max_leverage));
        }
        if !(self.stop_loss_pct > 0.0 && self.stop_loss_pct < 1.0) {
            return Err(ParamsError::StopLossPct(self.stop_loss_pct));
        }
        if !(self.take_profit_pct > 0.0 && self.take_profit_pct < 1.0) {
            return Err(ParamsError::TakeProfitPct(self.take_profit_pct));
        }
        if !(self.max_position_size > 0.0 && self.max_position_size <= 1.0) {
            return Err(ParamsError::MaxPositionSize(self.max_position_size));
        }
        if !(self.daily_loss_limit < 0.0) || !self.daily_loss_limit.is_finite() {
            return Err(ParamsError::DailyLossLimit(self.daily_loss_limit));
        }
        if !(self.per_trade_risk > 0.0 && self.per_trade_risk < 1.0) {
            return Err(ParamsError::PerTradeRisk(self.per_trade_risk));
        }
        if !(self.min_stop_fraction > 0.0) || !self.min_stop_fraction.is_finite() {
            return Err(ParamsError::MinStopFraction(self.min_stop_fraction));
        }
        if !(self.min_order_fraction >= 0.0) || !self.min_order_fraction.is_finite() {
            return Err(ParamsError::MinOrderFraction(self.min_order_fraction));
        }
        if self.atr_window == 0 {
            return Err(ParamsError::AtrWindow);
        }
        if !(self.fallback_atr_fraction > 0.0) || !self.fallback_atr_fraction.is_finite() {
            return Err(ParamsError::FallbackAtrFraction(self.fallback_atr_fraction));
        }
        for window in &self.blackouts {
            if window.end <= window.start {
                return Err(ParamsError::Blackout(window.label.clone()));
            }
        }
        Ok(())
    }

    /// Parse from TOML and validate.
    pub fn from_toml_str(s: &str) -> Result<Self, ParamsError> {
        let params: Self = toml::from_str(s).map_err(|e| ParamsError::Toml(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Deterministic content hash of this configuration.
    ///
    /// Two runs with identical parameters share a hash and their artifacts
    /// are comparable. The blacklist is a `BTreeSet` so serialization order
    /// is stable.
    pub fn config_hash(&self) -> String {
        let json =
            serde_json::to_string(self).expect("RiskParameters serialization cannot fail");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

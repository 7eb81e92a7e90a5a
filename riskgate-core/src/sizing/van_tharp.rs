//! Van Tharp risk-budget sizer.
//!
//! Risk a fixed fraction of equity per trade, with the stop at a multiple
//! of ATR. In fraction space the equity term cancels:
//!
//! ```text
//! stop_distance = max(atr_multiplier * atr_fraction, min_stop_fraction)
//! raw_fraction  = per_trade_risk / stop_distance
//! result        = sign(signal) * min(raw_fraction, max_position_size)
//! ```
//!
//! Noisier assets get smaller allocations for equal nominal risk. The
//! `min_stop_fraction` floor keeps a dead-flat price series from producing
//! an unbounded position.

use crate::config::RiskParameters;
use crate::sizing::SizePolicy;

/// Volatility-normalized risk-budget sizer.
///
/// # Example
/// - Equity fraction risked per trade: 1%
/// - ATR fraction: 0.02, multiplier 2x → stop distance 0.04
/// - Raw fraction: 0.01 / 0.04 = 0.25, capped at `max_position_size`
#[derive(Debug, Clone)]
pub struct VanTharpSizer {
    /// Stop distance in ATRs (e.g., 2.0 = stop at 2 x ATR).
    atr_multiplier: f64,
}

impl VanTharpSizer {
    pub fn new(atr_multiplier: f64) -> Self {
        assert!(atr_multiplier > 0.0, "atr_multiplier must be > 0");
        Self { atr_multiplier }
    }
}

impl Default for VanTharpSizer {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl SizePolicy for VanTharpSizer {
    fn target_fraction(&self, signal: f64, atr_fraction: f64, params: &RiskParameters) -> f64 {
        if signal == 0.0 || !signal.is_finite() {
            return 0.0;
        }

        let stop_distance = (self.atr_multiplier * atr_fraction).max(params.min_stop_fraction);
        let raw_fraction = params.per_trade_risk / stop_distance;
        let bounded = raw_fraction.abs().min(params.max_position_size);

        signal.signum() * bounded
    }

    fn name(&self) -> &str {
        "van_tharp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RiskParameters {
        RiskParameters {
            per_trade_risk: 0.01,
            min_stop_fraction: 0.01,
            max_position_size: 0.1,
            ..Default::default()
        }
    }

    #[test]
    fn caps_at_max_position_size() {
        // stop_distance = 2 * 0.02 = 0.04; raw = 0.01 / 0.04 = 0.25; cap 0.1
        let sizer = VanTharpSizer::default();
        let fraction = sizer.target_fraction(1.0, 0.02, &params());
        assert!((fraction - 0.1).abs() < 1e-12);
    }

    #[test]
    fn below_cap_when_volatility_is_high() {
        // stop_distance = 2 * 0.10 = 0.20; raw = 0.01 / 0.20 = 0.05
        let sizer = VanTharpSizer::default();
        let fraction = sizer.target_fraction(1.0, 0.10, &params());
        assert!((fraction - 0.05).abs() < 1e-12);
    }

    #[test]
    fn size_shrinks_as_volatility_grows() {
        let sizer = VanTharpSizer::default();
        let calm = sizer.target_fraction(1.0, 0.05, &params());
        let wild = sizer.target_fraction(1.0, 0.15, &params());
        assert!(wild < calm);
    }

    #[test]
    fn zero_atr_uses_min_stop_floor() {
        // stop_distance = max(0, 0.01) = 0.01; raw = 1.0; cap 0.1 — no division blowup.
        let sizer = VanTharpSizer::default();
        let fraction = sizer.target_fraction(1.0, 0.0, &params());
        assert!((fraction - 0.1).abs() < 1e-12);
    }

    #[test]
    fn sign_follows_signal() {
        let sizer = VanTharpSizer::default();
        assert!(sizer.target_fraction(0.7, 0.05, &params()) > 0.0);
        assert!(sizer.target_fraction(-0.7, 0.05, &params()) < 0.0);
    }

    #[test]
    fn zero_signal_is_flat() {
        let sizer = VanTharpSizer::default();
        assert_eq!(sizer.target_fraction(0.0, 0.05, &params()), 0.0);
    }

    #[test]
    fn signal_magnitude_does_not_scale_size() {
        // Conviction gates direction only; the risk budget sets the size.
        let sizer = VanTharpSizer::default();
        let weak = sizer.target_fraction(0.1, 0.05, &params());
        let strong = sizer.target_fraction(1.0, 0.05, &params());
        assert_eq!(weak, strong);
    }
}

//! Position sizers — translate signal direction into a target fraction.
//!
//! Sizers are pure: signal + volatility + parameters in, signed fraction of
//! equity out. They never see the portfolio and never emit orders.

pub mod fixed_fraction;
pub mod van_tharp;

pub use fixed_fraction::FixedFractionSizer;
pub use van_tharp::VanTharpSizer;

use crate::config::RiskParameters;

/// Position sizing policy.
///
/// # Responsibilities
/// - Convert a directional signal into a signed target fraction of equity
/// - Bound the result by `max_position_size`
///
/// # Non-Responsibilities
/// - Sizers do NOT decide entry/exit (that's the signal's job)
/// - Sizers do NOT bypass stop management or the risk gate
pub trait SizePolicy: Send + Sync {
    /// Target fraction for one symbol.
    ///
    /// `atr_fraction` is volatility as a fraction of price (ATR / close).
    /// A zero signal is flat and must return 0. The result's magnitude must
    /// never exceed `params.max_position_size`.
    fn target_fraction(&self, signal: f64, atr_fraction: f64, params: &RiskParameters) -> f64;

    /// Policy name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummySizer;

    impl SizePolicy for DummySizer {
        fn target_fraction(
            &self,
            _signal: f64,
            _atr_fraction: f64,
            _params: &RiskParameters,
        ) -> f64 {
            0.05
        }

        fn name(&self) -> &str {
            "dummy"
        }
    }

    #[test]
    fn size_policy_trait_compiles() {
        let sizer: Box<dyn SizePolicy> = Box::new(DummySizer);
        let fraction = sizer.target_fraction(1.0, 0.02, &RiskParameters::default());
        assert_eq!(fraction, 0.05);
        assert_eq!(sizer.name(), "dummy");
    }
}

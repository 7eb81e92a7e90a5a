//! Fixed-fraction sizer.
//!
//! Simplest policy: every non-flat signal gets the same fraction of equity,
//! still bounded by `max_position_size`. Useful as a baseline and in tests
//! that want sizing out of the picture.

use crate::config::RiskParameters;
use crate::sizing::SizePolicy;

#[derive(Debug, Clone)]
pub struct FixedFractionSizer {
    fraction: f64,
}

impl FixedFractionSizer {
    pub fn new(fraction: f64) -> Self {
        assert!(
            fraction > 0.0 && fraction <= 1.0,
            "fraction must be in (0, 1]"
        );
        Self { fraction }
    }
}

impl SizePolicy for FixedFractionSizer {
    fn target_fraction(&self, signal: f64, _atr_fraction: f64, params: &RiskParameters) -> f64 {
        if signal == 0.0 || !signal.is_finite() {
            return 0.0;
        }
        signal.signum() * self.fraction.min(params.max_position_size)
    }

    fn name(&self) -> &str {
        "fixed_fraction"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_size_regardless_of_volatility() {
        let sizer = FixedFractionSizer::new(0.05);
        let params = RiskParameters::default();
        assert_eq!(sizer.target_fraction(1.0, 0.01, &params), 0.05);
        assert_eq!(sizer.target_fraction(1.0, 0.50, &params), 0.05);
    }

    #[test]
    fn still_bounded_by_max_position_size() {
        let sizer = FixedFractionSizer::new(0.5);
        let params = RiskParameters {
            max_position_size: 0.1,
            ..Default::default()
        };
        assert_eq!(sizer.target_fraction(1.0, 0.02, &params), 0.1);
    }

    #[test]
    fn short_signal_flips_sign() {
        let sizer = FixedFractionSizer::new(0.05);
        assert_eq!(
            sizer.target_fraction(-0.4, 0.02, &RiskParameters::default()),
            -0.05
        );
    }

    #[test]
    #[should_panic(expected = "fraction must be in (0, 1]")]
    fn rejects_zero_fraction() {
        FixedFractionSizer::new(0.0);
    }
}

//! Volatility estimation — rolling average true range as a price fraction.
//!
//! True range per bar: max(high-low, |high-prev_close|, |low-prev_close|).
//! The estimate is the simple mean over the window, normalized by the
//! latest close. Estimation must never abort a rebalance: anything
//! unusable degrades to a fixed conservative fraction, and the source tag
//! reports which path produced the number.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;

/// How a volatility estimate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatilitySource {
    /// Full high/low data over the whole window.
    TrueRange,
    /// At least one bar lacked high/low and degraded to |close - prev_close|.
    CloseToClose,
    /// History too short or prices unusable; the configured fallback.
    Fallback,
}

/// ATR expressed as a fraction of the latest close, plus provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityEstimate {
    pub fraction: f64,
    pub source: VolatilitySource,
}

impl VolatilityEstimate {
    fn fallback(fraction: f64) -> Self {
        Self {
            fraction,
            source: VolatilitySource::Fallback,
        }
    }
}

/// Estimate ATR-as-fraction over the trailing `window` bars.
///
/// Needs `window + 1` bars (the previous close seeds the first true range).
/// Returns the fallback when history is short, any input is non-finite, or
/// the latest close is non-positive.
pub fn estimate(bars: &[Bar], window: usize, fallback_fraction: f64) -> VolatilityEstimate {
    if window == 0 || bars.len() < window + 1 {
        return VolatilityEstimate::fallback(fallback_fraction);
    }

    let last_close = bars[bars.len() - 1].close;
    if !last_close.is_finite() || last_close <= 0.0 {
        return VolatilityEstimate::fallback(fallback_fraction);
    }

    let start = bars.len() - window;
    let mut sum = 0.0;
    let mut used_proxy = false;

    for i in start..bars.len() {
        let prev_close = bars[i - 1].close;
        let bar = &bars[i];
        let tr = if bar.high.is_nan() || bar.low.is_nan() {
            used_proxy = true;
            (bar.close - prev_close).abs()
        } else {
            (bar.high - bar.low)
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        };
        if !tr.is_finite() {
            return VolatilityEstimate::fallback(fallback_fraction);
        }
        sum += tr;
    }

    let fraction = sum / window as f64 / last_close;
    if !fraction.is_finite() || fraction < 0.0 {
        return VolatilityEstimate::fallback(fallback_fraction);
    }

    VolatilityEstimate {
        fraction,
        source: if used_proxy {
            VolatilitySource::CloseToClose
        } else {
            VolatilitySource::TrueRange
        },
    }
}

//! Ratchet rule: stops may tighten, never loosen.
//!
//! This blocks the volatility trap where an expanding trail distance would
//! widen a stop after a favorable move, re-exposing locked-in gains.

use crate::domain::PositionSide;

/// Clamp a proposed stop against the current one.
///
/// Long positions: the stop can only rise. Short positions: only fall.
pub fn ratchet(side: PositionSide, current: f64, proposed: f64) -> f64 {
    match side {
        PositionSide::Long => current.max(proposed),
        PositionSide::Short => current.min(proposed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_tightening_allowed() {
        assert_eq!(ratchet(PositionSide::Long, 95.0, 100.0), 100.0);
    }

    #[test]
    fn long_loosening_blocked() {
        assert_eq!(ratchet(PositionSide::Long, 100.0, 90.0), 100.0);
    }

    #[test]
    fn short_tightening_allowed() {
        assert_eq!(ratchet(PositionSide::Short, 105.0, 100.0), 100.0);
    }

    #[test]
    fn short_loosening_blocked() {
        assert_eq!(ratchet(PositionSide::Short, 100.0, 110.0), 100.0);
    }

    #[test]
    fn volatility_trap_scenario() {
        // Price rose, then the proposed trail widened below the held level.
        // The stop stays put.
        assert_eq!(ratchet(PositionSide::Long, 95.0, 90.0), 95.0);
    }
}

//! Fatal engine errors.
//!
//! Only precondition violations surface as `Err`. Risk-gate denials and
//! per-symbol data problems are designed control-flow outcomes and are
//! reported as data on the cycle report instead.

use thiserror::Error;

use crate::config::ParamsError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The ledger reported non-positive (or non-finite) equity. Sizing
    /// against such a base would be nonsensical, so the cycle refuses to run.
    #[error("portfolio equity must be positive and finite, got {0}")]
    NonPositiveEquity(f64),

    /// Malformed risk parameters at construction or between-cycle update.
    #[error("invalid risk parameters: {0}")]
    InvalidParams(#[from] ParamsError),
}

//! Domain types: bars, signals, positions, portfolio state.

pub mod bar;
pub mod portfolio;
pub mod position;
pub mod signal;

pub use bar::Bar;
pub use portfolio::PortfolioState;
pub use position::{ExitReason, PositionSide, PositionState};
pub use signal::SignalSet;

/// Symbol type alias
pub type Symbol = String;

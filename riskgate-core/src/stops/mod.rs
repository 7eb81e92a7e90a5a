//! Stop/take-profit lifecycle for open positions.

pub mod manager;
pub mod ratchet;

pub use manager::{breach, refresh_levels};
pub use ratchet::ratchet;

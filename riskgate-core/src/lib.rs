//! RiskGate Core — per-bar, risk-gated strategy execution for an
//! event-driven backtester.
//!
//! The engine sits between a strategy's directional signals and the
//! backtester's order execution:
//! - Pre-trade risk gate (leverage cap, daily-loss circuit breaker,
//!   blackout windows) that can veto a whole cycle
//! - Volatility-adjusted position sizing (risk-budget / ATR style)
//! - Per-position trailing stop and take-profit lifecycle with a
//!   tighten-only ratchet
//! - Blacklist and minimum-size order translation
//! - Append-only metrics recording
//!
//! Everything runs synchronously inside the caller's event loop; all
//! collaborators (data, strategy, ledger, order sink) are trait seams.

pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod gate;
pub mod market;
pub mod metrics;
pub mod orders;
pub mod sizing;
pub mod stops;
pub mod volatility;

pub use config::{BlackoutWindow, ParamsError, RiskParameters};
pub use engine::{Engine, EngineSummary, RebalanceReport, SymbolOutcome};
pub use error::EngineError;
pub use gate::{DenialReason, GateDecision};
pub use market::{MarketData, OrderSink, PortfolioLedger, PriceField, Strategy};
pub use metrics::{CsvMetricSink, MemorySink, MetricSink};
pub use orders::{OrderReason, TargetOrder};
pub use sizing::{FixedFractionSizer, SizePolicy, VanTharpSizer};
pub use volatility::{VolatilityEstimate, VolatilitySource};

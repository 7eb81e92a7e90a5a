//! The rebalance engine — one synchronous pass per scheduled event.
//!
//! Phase order within a cycle is fixed:
//! 1. Tracker refresh (day roll, peak equity, leverage)
//! 2. Risk gate — a denial ends the cycle before anything can mutate
//! 3. Signal intake (universe selection + alpha, both external)
//! 4. Stop/take-profit maintenance for held positions; breaches become
//!    forced exits that override the signal for the same symbol
//! 5. Volatility-adjusted sizing over universe ∪ held
//! 6. Order translation and emission
//! 7. Metrics append
//!
//! A cycle is never partially applied: the only fatal outcomes are
//! precondition violations detected before step 4.

pub mod outcome;
pub mod tracker;

pub use outcome::{EngineSummary, RebalanceReport, SymbolOutcome};
pub use tracker::PortfolioTracker;

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::config::RiskParameters;
use crate::domain::{PositionState, SignalSet, Symbol};
use crate::error::EngineError;
use crate::gate::{self, GateDecision};
use crate::market::{MarketData, OrderSink, PortfolioLedger, Strategy};
use crate::metrics::MetricSink;
use crate::orders::{self, OrderCandidate, OrderReason, TargetOrder, Translation};
use crate::sizing::{SizePolicy, VanTharpSizer};
use crate::stops;
use crate::volatility::{self, VolatilitySource};

/// Risk-gated execution engine. One instance owns all state for one
/// backtest run.
pub struct Engine {
    params: RiskParameters,
    sizer: Box<dyn SizePolicy>,
    tracker: PortfolioTracker,
    summary: EngineSummary,
}

impl Engine {
    /// Build with the default Van Tharp sizer. Parameters are validated;
    /// malformed bounds refuse to construct.
    pub fn new(params: RiskParameters) -> Result<Self, EngineError> {
        Self::with_sizer(params, Box::new(VanTharpSizer::default()))
    }

    pub fn with_sizer(
        params: RiskParameters,
        sizer: Box<dyn SizePolicy>,
    ) -> Result<Self, EngineError> {
        params.validate()?;
        Ok(Self {
            params,
            sizer,
            tracker: PortfolioTracker::new(),
            summary: EngineSummary::default(),
        })
    }

    /// Swap risk parameters between cycles. The engine is never mid-cycle
    /// when a caller can reach this (`rebalance` is synchronous), so the
    /// only guard needed is validation.
    pub fn update_params(&mut self, params: RiskParameters) -> Result<(), EngineError> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn params(&self) -> &RiskParameters {
        &self.params
    }

    /// Deterministic identity of this run's configuration.
    pub fn run_id(&self) -> String {
        self.params.config_hash()
    }

    pub fn summary(&self) -> &EngineSummary {
        &self.summary
    }

    pub fn tracker(&self) -> &PortfolioTracker {
        &self.tracker
    }

    /// Execute one rebalance event.
    pub fn rebalance(
        &mut self,
        now: NaiveDateTime,
        strategy: &dyn Strategy,
        data: &dyn MarketData,
        ledger: &dyn PortfolioLedger,
        sink: &mut dyn OrderSink,
        metrics: &mut dyn MetricSink,
    ) -> Result<RebalanceReport, EngineError> {
        let equity = ledger.portfolio_value();
        if !equity.is_finite() || equity <= 0.0 {
            return Err(EngineError::NonPositiveEquity(equity));
        }

        // Ledger positions are fractions of equity, so gross leverage is
        // just the sum of magnitudes.
        let held = ledger.current_positions();
        let gross_leverage: f64 = held.values().map(|f| f.abs()).sum();
        self.tracker.refresh(now, equity, gross_leverage);

        let gate = gate::check(self.tracker.portfolio(), &self.params, now);
        if let GateDecision::Denied(reason) = &gate {
            warn!(%reason, "risk gate denied trading for this cycle");
            let report = self.denied_report(now, gate.clone(), equity, gross_leverage);
            self.record_metrics(metrics, now, &report);
            self.summary.absorb(&report);
            return Ok(report);
        }

        let universe = strategy.select_universe(data);
        let signals = SignalSet::intake(strategy.generate_signals(&universe, data));

        let mut outcomes: BTreeMap<Symbol, SymbolOutcome> = BTreeMap::new();
        let mut candidates: Vec<OrderCandidate> = Vec::new();
        let mut prices: HashMap<Symbol, f64> = HashMap::new();

        // Stop maintenance runs before sizing so forced exits can override
        // the signal for the same symbol in the same cycle.
        for symbol in self.tracker.open_symbols() {
            match valid_price(data.current_price(&symbol)) {
                Some(price) => {
                    prices.insert(symbol.clone(), price);
                    if let Some(position) = self.tracker.position_mut(&symbol) {
                        position.tick_bar();
                        stops::refresh_levels(position, price, &self.params);
                        if let Some(reason) = stops::breach(position, price) {
                            info!(symbol = %symbol, %reason, price, "protective exit triggered");
                            outcomes.insert(symbol.clone(), SymbolOutcome::ForcedExit(reason));
                            candidates.push(OrderCandidate {
                                symbol: symbol.clone(),
                                target: 0.0,
                                reason: reason.into(),
                            });
                        }
                    }
                }
                None => {
                    debug!(symbol = %symbol, "held symbol has no price this bar; levels left unchanged");
                    outcomes.insert(symbol.clone(), SymbolOutcome::SkippedNoPrice);
                }
            }
        }

        // Size the universe plus any held symbols the universe dropped;
        // the latter read as flat signals and close out.
        let mut considered = universe;
        for symbol in self.tracker.open_symbols() {
            if !considered.contains(&symbol) {
                considered.push(symbol);
            }
        }

        for symbol in considered {
            if outcomes.contains_key(&symbol) {
                continue; // forced exit or no-price already decided it
            }
            if !data.can_trade(&symbol) {
                outcomes.insert(symbol, SymbolOutcome::SkippedNotTradable);
                continue;
            }
            let price = match prices.get(&symbol).copied() {
                Some(p) => Some(p),
                None => valid_price(data.current_price(&symbol)),
            };
            let Some(price) = price else {
                debug!(symbol = %symbol, "no usable price; signal coerced to flat");
                outcomes.insert(symbol, SymbolOutcome::SkippedNoPrice);
                continue;
            };
            prices.insert(symbol.clone(), price);

            let signal = signals.strength(&symbol);
            let bars = data.bars(&symbol, self.params.atr_window + 1);
            let vol = volatility::estimate(
                &bars,
                self.params.atr_window,
                self.params.fallback_atr_fraction,
            );
            if vol.source == VolatilitySource::Fallback {
                debug!(symbol = %symbol, fraction = vol.fraction, "volatility fallback in use");
            }

            let target = self.sizer.target_fraction(signal, vol.fraction, &self.params);
            if !target.is_finite() {
                debug!(symbol = %symbol, "sizing produced a non-finite target; coerced to flat");
                outcomes.insert(symbol, SymbolOutcome::Coerced);
                continue;
            }

            let held_here = self.tracker.position(&symbol).is_some();
            if target != 0.0 || held_here {
                candidates.push(OrderCandidate {
                    symbol: symbol.clone(),
                    target,
                    reason: OrderReason::Signal,
                });
            }
            outcomes.insert(
                symbol,
                SymbolOutcome::Sized {
                    target,
                    vol_source: vol.source,
                },
            );
        }

        // Translate and emit.
        let mut emitted: Vec<TargetOrder> = Vec::new();
        for candidate in candidates {
            let held_fraction = self
                .tracker
                .position(&candidate.symbol)
                .map(|p| p.target_fraction);
            match orders::translate(candidate, held_fraction, &self.params) {
                Translation::Emit(order) => {
                    sink.set_target_fraction(&order.symbol, order.fraction);
                    emitted.push(order);
                }
                Translation::Skip { symbol, reason } => {
                    let outcome = match reason {
                        orders::SkipReason::Blacklisted => SymbolOutcome::SkippedBlacklist,
                        orders::SkipReason::BelowMinimum => SymbolOutcome::SkippedBelowMinimum,
                    };
                    outcomes.insert(symbol, outcome);
                }
            }
        }

        // Position lifecycle follows the emitted targets.
        for order in &emitted {
            let currently = self
                .tracker
                .position(&order.symbol)
                .map(|p| p.target_fraction)
                .unwrap_or(0.0);
            if order.fraction == 0.0 {
                if currently != 0.0 {
                    self.tracker.close_position(&order.symbol);
                }
            } else if currently == 0.0 || order.fraction.signum() != currently.signum() {
                // Fresh entry, or a direction flip — either way the old
                // levels no longer describe this position; re-anchor at the
                // current price.
                self.tracker.close_position(&order.symbol);
                if let Some(&price) = prices.get(&order.symbol) {
                    self.tracker.open_position(PositionState::open(
                        order.symbol.clone(),
                        order.fraction,
                        price,
                        &self.params,
                        now.date(),
                    ));
                }
            } else {
                self.tracker.set_target(&order.symbol, order.fraction);
            }
        }

        let report = RebalanceReport {
            timestamp: now,
            gate,
            outcomes,
            orders: emitted,
            clamped_signals: signals.clamped_count(),
            equity,
            leverage: gross_leverage,
            daily_pnl: self.tracker.portfolio().daily_pnl,
        };
        self.record_metrics(metrics, now, &report);
        self.summary.absorb(&report);
        Ok(report)
    }

    fn denied_report(
        &self,
        now: NaiveDateTime,
        gate: GateDecision,
        equity: f64,
        leverage: f64,
    ) -> RebalanceReport {
        RebalanceReport {
            timestamp: now,
            gate,
            outcomes: BTreeMap::new(),
            orders: Vec::new(),
            clamped_signals: 0,
            equity,
            leverage,
            daily_pnl: self.tracker.portfolio().daily_pnl,
        }
    }

    fn record_metrics(
        &self,
        metrics: &mut dyn MetricSink,
        now: NaiveDateTime,
        report: &RebalanceReport,
    ) {
        let portfolio = self.tracker.portfolio();
        metrics.record("equity", portfolio.equity, now);
        metrics.record("peak_equity", portfolio.peak_equity, now);
        metrics.record("drawdown", portfolio.drawdown(), now);
        metrics.record("daily_pnl", portfolio.daily_pnl, now);
        metrics.record("leverage", portfolio.current_leverage, now);
        metrics.record("open_positions", self.tracker.len() as f64, now);
        metrics.record("orders_emitted", report.orders.len() as f64, now);
        metrics.record("gate_denied", if report.denied() { 1.0 } else { 0.0 }, now);
    }
}

/// A price the engine is willing to compute with.
fn valid_price(price: Option<f64>) -> Option<f64> {
    price.filter(|p| p.is_finite() && *p > 0.0)
}

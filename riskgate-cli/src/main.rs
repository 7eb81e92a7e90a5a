//! RiskGate CLI — demo runs of the risk-gated execution engine.
//!
//! Commands:
//! - `run` — drive the engine over a synthetic random-walk universe with a
//!   paper ledger, writing the per-cycle metrics CSV
//! - `check` — validate a TOML risk-parameter file and print its run id

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use riskgate_core::domain::{Bar, Symbol};
use riskgate_core::{
    CsvMetricSink, Engine, MarketData, OrderSink, PortfolioLedger, PriceField, RiskParameters,
    Strategy,
};

#[derive(Parser)]
#[command(
    name = "riskgate",
    about = "RiskGate CLI — risk-gated execution engine demo"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a synthetic backtest through the engine.
    Run {
        /// Path to a TOML risk-parameter file. Defaults to built-in limits.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of simulated trading days.
        #[arg(long, default_value_t = 250)]
        days: usize,

        /// Number of synthetic symbols in the universe.
        #[arg(long, default_value_t = 8)]
        symbols: usize,

        /// RNG seed for the price paths.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Output path for the metrics CSV.
        #[arg(long, default_value = "metrics.csv")]
        metrics_out: PathBuf,
    },
    /// Validate a risk-parameter file and print its run id.
    Check {
        /// Path to a TOML risk-parameter file.
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            days,
            symbols,
            seed,
            metrics_out,
        } => run_demo(config, days, symbols, seed, metrics_out),
        Commands::Check { config } => check_config(config),
    }
}

fn load_params(config: Option<PathBuf>) -> Result<RiskParameters> {
    match config {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            RiskParameters::from_toml_str(&text)
                .with_context(|| format!("invalid risk parameters in {}", path.display()))
        }
        None => Ok(RiskParameters::default()),
    }
}

fn check_config(config: PathBuf) -> Result<()> {
    let params = load_params(Some(config))?;
    println!("parameters OK");
    println!("run id: {}", params.config_hash());
    Ok(())
}

// ── Synthetic market ─────────────────────────────────────────────────

/// Pre-generated random-walk price paths, revealed one day at a time so the
/// engine can never look ahead.
struct SyntheticMarket {
    bars: HashMap<Symbol, Vec<Bar>>,
    symbols: Vec<Symbol>,
    visible: usize,
}

impl SyntheticMarket {
    fn generate(symbol_count: usize, days: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let symbols: Vec<Symbol> = (0..symbol_count).map(|i| format!("SYN{i:02}")).collect();

        let mut bars = HashMap::new();
        for symbol in &symbols {
            let mut close = 50.0 + rng.gen::<f64>() * 100.0;
            let drift = (rng.gen::<f64>() - 0.5) * 0.002;
            let vol = 0.005 + rng.gen::<f64>() * 0.02;
            let mut path = Vec::with_capacity(days);
            for day in 0..days {
                let shock = (rng.gen::<f64>() - 0.5) * 2.0 * vol;
                let open = close;
                close = (close * (1.0 + drift + shock)).max(1.0);
                let spread = close * vol * rng.gen::<f64>();
                path.push(Bar {
                    symbol: symbol.clone(),
                    date: base_date + chrono::Duration::days(day as i64),
                    open,
                    high: open.max(close) + spread,
                    low: (open.min(close) - spread).max(0.5),
                    close,
                    volume: 500_000.0 + rng.gen::<f64>() * 2_000_000.0,
                });
            }
            bars.insert(symbol.clone(), path);
        }

        Self {
            bars,
            symbols,
            visible: 0,
        }
    }

    /// Reveal bars up to and including `day`.
    fn set_visible(&mut self, day: usize) {
        self.visible = day + 1;
    }

    fn close_on(&self, symbol: &str, day: usize) -> f64 {
        self.bars[symbol][day].close
    }

    /// Close-to-close return per symbol for `day`.
    fn daily_returns(&self, day: usize) -> HashMap<Symbol, f64> {
        if day == 0 {
            return HashMap::new();
        }
        self.symbols
            .iter()
            .map(|s| {
                let prev = self.close_on(s, day - 1);
                let now = self.close_on(s, day);
                (s.clone(), now / prev - 1.0)
            })
            .collect()
    }
}

impl MarketData for SyntheticMarket {
    fn bars(&self, symbol: &str, periods: usize) -> Vec<Bar> {
        let Some(path) = self.bars.get(symbol) else {
            return Vec::new();
        };
        let end = self.visible.min(path.len());
        let start = end.saturating_sub(periods);
        path[start..end].to_vec()
    }

    fn current_price(&self, symbol: &str) -> Option<f64> {
        let path = self.bars.get(symbol)?;
        let end = self.visible.min(path.len());
        path[..end].last().map(|b| b.close)
    }

    fn can_trade(&self, symbol: &str) -> bool {
        self.bars.contains_key(symbol)
    }
}

// ── Demo strategy: rate-of-change momentum ───────────────────────────

struct RocMomentum {
    lookback: usize,
}

impl RocMomentum {
    fn signals(&self, universe: &[Symbol], data: &dyn MarketData) -> HashMap<Symbol, f64> {
        universe
            .iter()
            .filter_map(|symbol| {
                let closes = data.history(symbol, PriceField::Close, self.lookback + 1);
                if closes.len() < self.lookback + 1 {
                    return None;
                }
                let first = closes[0];
                let last = closes[closes.len() - 1];
                if first <= 0.0 {
                    return None;
                }
                // Scale ±10% moves to full conviction.
                let roc = last / first - 1.0;
                Some((symbol.clone(), (roc * 10.0).clamp(-1.0, 1.0)))
            })
            .collect()
    }
}

/// Fixed universe plus the momentum alpha: the capability pair the engine
/// consumes.
struct FixedUniverse {
    symbols: Vec<Symbol>,
    alpha: RocMomentum,
}

impl Strategy for FixedUniverse {
    fn select_universe(&self, _data: &dyn MarketData) -> Vec<Symbol> {
        self.symbols.clone()
    }

    fn generate_signals(
        &self,
        universe: &[Symbol],
        data: &dyn MarketData,
    ) -> HashMap<Symbol, f64> {
        self.alpha.signals(universe, data)
    }
}

// ── Paper ledger ─────────────────────────────────────────────────────

/// Toy fill model: target fractions apply instantly at the close, position
/// P&L compounds with close-to-close returns.
struct PaperLedger {
    equity: f64,
    positions: HashMap<Symbol, f64>,
}

impl PaperLedger {
    fn new(initial_capital: f64) -> Self {
        Self {
            equity: initial_capital,
            positions: HashMap::new(),
        }
    }

    fn apply_returns(&mut self, returns: &HashMap<Symbol, f64>) {
        let pnl: f64 = self
            .positions
            .iter()
            .map(|(symbol, fraction)| fraction * returns.get(symbol).copied().unwrap_or(0.0))
            .sum();
        self.equity *= 1.0 + pnl;
    }

    fn apply_orders(&mut self, orders: &[(Symbol, f64)]) {
        for (symbol, fraction) in orders {
            if *fraction == 0.0 {
                self.positions.remove(symbol);
            } else {
                self.positions.insert(symbol.clone(), *fraction);
            }
        }
    }
}

impl PortfolioLedger for PaperLedger {
    fn portfolio_value(&self) -> f64 {
        self.equity
    }

    fn current_positions(&self) -> HashMap<Symbol, f64> {
        self.positions.clone()
    }
}

#[derive(Default)]
struct CollectSink {
    orders: Vec<(Symbol, f64)>,
}

impl OrderSink for CollectSink {
    fn set_target_fraction(&mut self, symbol: &str, fraction: f64) {
        self.orders.push((symbol.to_string(), fraction));
    }
}

// ── Demo loop ────────────────────────────────────────────────────────

fn run_demo(
    config: Option<PathBuf>,
    days: usize,
    symbols: usize,
    seed: u64,
    metrics_out: PathBuf,
) -> Result<()> {
    let params = load_params(config)?;
    let mut engine = Engine::new(params).context("engine construction failed")?;
    println!("run id: {}", engine.run_id());

    let mut market = SyntheticMarket::generate(symbols, days, seed);
    let strategy = FixedUniverse {
        symbols: market.symbols.clone(),
        alpha: RocMomentum { lookback: 20 },
    };
    let mut ledger = PaperLedger::new(100_000.0);
    let mut metrics = CsvMetricSink::create(&metrics_out)
        .with_context(|| format!("failed to create {}", metrics_out.display()))?;

    let base_date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut denied = 0usize;

    for day in 0..days {
        let returns = market.daily_returns(day);
        ledger.apply_returns(&returns);
        market.set_visible(day);

        let now: NaiveDateTime = (base_date + chrono::Duration::days(day as i64))
            .and_hms_opt(16, 0, 0)
            .context("valid close time")?;

        let mut sink = CollectSink::default();
        let report = engine
            .rebalance(now, &strategy, &market, &ledger, &mut sink, &mut metrics)
            .context("rebalance failed")?;
        if report.denied() {
            denied += 1;
        }
        ledger.apply_orders(&sink.orders);
    }

    metrics.flush().context("failed to flush metrics")?;

    let summary = engine.summary();
    println!("days simulated:       {days}");
    println!("cycles denied:        {denied}");
    println!("orders emitted:       {}", summary.orders_emitted);
    println!("stop exits:           {}", summary.stop_exits);
    println!("take-profit exits:    {}", summary.take_profit_exits);
    println!("volatility fallbacks: {}", summary.volatility_fallbacks);
    println!("final equity:         {:.2}", ledger.equity);
    println!("metrics written to:   {}", metrics_out.display());
    Ok(())
}

//! Process entrypoint: loads configuration, wires risk limits and the
//! selected strategy, installs the SIGINT/SIGTERM handler, and runs the
//! engine until asked to stop.

use apex_engine::config::ConfigError;
use apex_engine::prelude::*;
use apex_engine::strategy::{market_making::MarketMakingParams, stat_arb::StatArbParams};
use apex_engine::{logging, strategy};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const SYMBOL_ID: u32 = 1;
const TICK_SIZE: Price = 1;

fn build_driver(config: &Config) -> Driver {
    match config.strategy.as_str() {
        "stat_arb" => Driver::StatArb(strategy::stat_arb::StatArbStrategy::new(StatArbParams {
            lookback_period: config.lookback_period,
            entry_threshold: config.entry_threshold,
            exit_threshold: config.exit_threshold,
            position_size: config.quote_size,
            max_position: config.max_position,
            tick_size: TICK_SIZE,
        })),
        _ => Driver::MarketMaking(strategy::market_making::MarketMakingStrategy::new(MarketMakingParams {
            spread_bps: config.spread_bps,
            quote_size: config.quote_size,
            max_position: config.max_position,
            tick_size: TICK_SIZE,
            max_orders_per_side: 1,
            quote_refresh_ms: 0,
            sanity_spread_bps: 500.0,
        })),
    }
}

fn seed_from_clock() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos() as u64).unwrap_or(1)
}

fn main() -> ExitCode {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "apex-engine.cfg".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(ConfigError::MissingFile(path)) => {
            eprintln!("missing config file: {path}");
            return ExitCode::FAILURE;
        }
    };

    let _logging_handle = match logging::init(&config.log_file, "info") {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("failed to initialize logging to {}: {err}", config.log_file);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(symbol = %config.symbol, strategy = %config.strategy, "starting apex-engine");

    let risk_limits = RiskLimits {
        max_position: config.max_position,
        max_order_size: config.max_order_size,
        max_loss_per_symbol: config.max_loss,
        price_collar_percent: config.price_collar,
        max_orders_per_second: config.max_orders_per_sec,
    };
    let price_domain = PriceDomain::new(1, 200_000);
    let driver = build_driver(&config);
    let rng_seed = seed_from_clock();
    let feed = Box::new(SyntheticFeed::new(rng_seed, price_domain, TICK_SIZE));

    let engine_config = EngineConfig {
        symbol_id: SYMBOL_ID,
        price_domain,
        risk_limits,
        fill_probability: 0.6,
        rng_seed,
    };

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        if let Err(err) = ctrlc::set_handler(move || {
            tracing::warn!("shutdown signal received");
            running.store(false, Ordering::Relaxed);
        }) {
            tracing::error!(%err, "failed to install signal handler, relying on in-process shutdown only");
        }
    }

    let handle = match Engine::new(engine_config).spawn(driver, feed, running.clone()) {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(%err, "strategy initialization failed");
            return ExitCode::FAILURE;
        }
    };

    while running.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(100));
        if logging::critical_raised() {
            tracing::error!("critical condition raised, initiating shutdown");
            handle.stop();
            break;
        }
    }

    let report = handle.join();
    tracing::info!(
        p50_ns = report.latency.p50_ns,
        p99_ns = report.latency.p99_ns,
        max_ns = report.latency.max_ns,
        samples = report.latency.count,
        submitted = report.gateway.submitted,
        fills = report.gateway.fills,
        volume = report.gateway.volume,
        "apex-engine shut down cleanly"
    );

    ExitCode::SUCCESS
}

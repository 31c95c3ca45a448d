//! In-process electronic trading engine: market-data ingestion, a live
//! limit order book per instrument, pluggable strategies, pre-trade risk,
//! a simulated exchange gateway, and position/PnL accounting.
//!
//! The hot path is `arena + spsc -> book -> strategy -> risk -> oms ->
//! gateway`, with fills flowing back `gateway -> oms -> position`. See
//! `engine` for how the pipeline is wired across threads.

pub mod arena;
pub mod bitset;
pub mod book;
pub mod config;
pub mod engine;
pub mod gateway;
pub mod logging;
pub mod metrics;
pub mod oms;
pub mod position;
pub mod risk;
pub mod spsc;
pub mod strategy;
pub mod types;

/// Common imports for callers wiring up the engine end to end.
pub mod prelude {
    pub use crate::arena::{Arena, Handle};
    pub use crate::book::{AddOutcome, Book, DepthLevel, NullTradeListener, PriceDomain, TradeListener};
    pub use crate::config::Config;
    pub use crate::engine::{
        Engine, EngineConfig, EngineHandle, EngineReport, FeedSource, LatencySnapshot, MarketDataEvent,
        SyntheticFeed,
    };
    pub use crate::gateway::{Gateway, GatewayEvent, SimulatedGateway};
    pub use crate::oms::{Fill, NullOmsListener, Oms, OmsListener, OrderRequest, OrderStatus, RejectReason};
    pub use crate::position::{Position, PositionManager};
    pub use crate::risk::{RiskCheck, RiskLimits, RiskManager};
    pub use crate::spsc::Spsc;
    pub use crate::strategy::{Driver, Strategy, StrategyContext, StrategyError};
    pub use crate::types::{
        next_exec_id, next_order_id, OrderId, OrderType, Price, Qty, Side, TimeInForce, Trade, Ts,
        BEST_ASK_EMPTY, BEST_BID_EMPTY,
    };
}

//! Shared primitive types used across the book, OMS, risk and strategy layers.

use mimalloc::MiMalloc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global allocator for the whole process, including the `apex-engine` binary.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Integer price tick, relative to a book's configured base price.
pub type Price = i64;
/// Resting/remaining order quantity.
pub type Qty = u32;
/// Monotonic nanosecond timestamp from a single clock source.
pub type Ts = u64;
/// Internal, monotonically increasing order identifier.
pub type OrderId = u64;
/// Gateway-assigned execution identifier, one per fill.
pub type ExecId = u64;

/// Sentinel used for an empty bid side.
pub const BEST_BID_EMPTY: Price = 0;
/// Sentinel used for an empty ask side.
pub const BEST_ASK_EMPTY: Price = Price::MAX;

static NEXT_ORDER_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_EXEC_ID: AtomicU64 = AtomicU64::new(1);

/// Allocates the next internal order id. Monotonic, process-wide.
pub fn next_order_id() -> OrderId {
    NEXT_ORDER_ID.fetch_add(1, Ordering::Relaxed)
}

/// Allocates the next gateway execution id. Monotonic, process-wide.
pub fn next_exec_id() -> ExecId {
    NEXT_EXEC_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type. Market orders are represented at the book boundary as a
/// crossing limit (price = i64::MAX for buy, 0 for sell) but keep their own
/// tag so residual handling can be keyed on it (see `TimeInForce`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderType {
    Limit,
    Market,
}

/// Time-in-force. `Gtc` rests any residual; `Ioc` cancels it; `Fok` requires
/// the whole order fill at submit time or rejects untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
}

/// A single executed trade, always priced at the resting (maker) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trade {
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub price: Price,
    pub quantity: Qty,
    pub timestamp: Ts,
}

//! Process lifecycle and thread wiring: the feed, book/OMS and gateway
//! worker threads, sharing one `running` flag and communicating
//! exclusively through the lock-free SPSC queues in `spsc`.
//!
//! Shutdown order is leaves-first (feed -> book -> gateway); the logger
//! thread lives outside `Engine` (see `logging::LoggingHandle`) and is
//! flushed last, when the caller drops its guard after `join`.

use crate::book::{Book, PriceDomain, TradeListener};
use crate::gateway::{Gateway, GatewayEvent, GatewayStats, SimulatedGateway};
use crate::metrics::LatencyRecorder;
use crate::oms::{Fill, NullOmsListener, Oms, OrderRequest, OrderStatus};
use crate::position::PositionManager;
use crate::risk::{RiskLimits, RiskManager};
use crate::spsc::Spsc;
use crate::strategy::{Driver, Strategy, StrategyContext, StrategyError};
use crate::types::{next_exec_id, OrderId, OrderType, Price, Qty, Side, TimeInForce, Trade, Ts};
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Depth of every cross-thread SPSC in the pipeline. Chosen generously
/// relative to the single-digit-microsecond per-message budget so a brief
/// producer/consumer stall doesn't spill into dropped messages.
pub const QUEUE_CAPACITY: usize = 4096;

const IDLE_SLEEP: Duration = Duration::from_micros(5);

type MarketDataQueue = Spsc<MarketDataEvent, QUEUE_CAPACITY>;
type CommandQueue = Spsc<GatewayCommand, QUEUE_CAPACITY>;
type EventQueue = Spsc<GatewayEvent, QUEUE_CAPACITY>;

/// A decoded market-data record, as pushed by the feed thread and consumed
/// by the book/OMS thread. Carries a single instrument's worth of book
/// mutations; the feed source is responsible for decoding whatever wire
/// format it reads into this shape.
#[derive(Debug, Clone, Copy)]
pub enum MarketDataEvent {
    NewOrder {
        id: OrderId,
        side: Side,
        price: Price,
        quantity: Qty,
        order_type: OrderType,
        time_in_force: TimeInForce,
        timestamp: Ts,
    },
    Cancel {
        id: OrderId,
        timestamp: Ts,
    },
    Modify {
        id: OrderId,
        new_quantity: Qty,
        timestamp: Ts,
    },
}

impl MarketDataEvent {
    fn timestamp(&self) -> Ts {
        match *self {
            MarketDataEvent::NewOrder { timestamp, .. }
            | MarketDataEvent::Cancel { timestamp, .. }
            | MarketDataEvent::Modify { timestamp, .. } => timestamp,
        }
    }
}

/// Feed thread interface: the simulated feed generator is referenced only
/// through this trait. `next_event` must never block; returning `None`
/// means "nothing ready right now", not "done".
pub trait FeedSource: Send {
    fn next_event(&mut self) -> Option<MarketDataEvent>;
}

/// Minimal synthetic feed for demos: a bounded random walk of the mid
/// price, alternately resting a buy and a sell one tick off the walk.
/// Stands in for the real feed decoder/generator, which this spec keeps
/// out of scope.
pub struct SyntheticFeed {
    rng: rand::rngs::StdRng,
    next_id: OrderId,
    mid: Price,
    tick: Price,
    domain: PriceDomain,
    start: Instant,
}

impl SyntheticFeed {
    pub fn new(seed: u64, domain: PriceDomain, tick: Price) -> Self {
        let mid = domain.base + (domain.num_levels as Price) / 2;
        Self { rng: rand::rngs::StdRng::seed_from_u64(seed), next_id: 1, mid, tick, domain, start: Instant::now() }
    }
}

impl FeedSource for SyntheticFeed {
    fn next_event(&mut self) -> Option<MarketDataEvent> {
        use rand::Rng;
        let step = self.rng.random_range(-2..=2) as Price * self.tick;
        self.mid = (self.mid + step).clamp(self.domain.base, self.domain.base + self.domain.num_levels as Price - 1);
        let side = if self.rng.random_bool(0.5) { Side::Buy } else { Side::Sell };
        let price = match side {
            Side::Buy => self.mid - self.tick,
            Side::Sell => self.mid + self.tick,
        };
        let id = self.next_id;
        self.next_id += 1;
        Some(MarketDataEvent::NewOrder {
            id,
            side,
            price,
            quantity: self.rng.random_range(1..=50),
            order_type: OrderType::Limit,
            time_in_force: TimeInForce::Gtc,
            timestamp: self.start.elapsed().as_nanos() as Ts,
        })
    }
}

/// One request the book/OMS thread hands off to the gateway thread.
#[derive(Debug, Clone, Copy)]
enum GatewayCommand {
    Submit(OrderRequest, Ts),
    Cancel(OrderId, Ts),
}

/// `Gateway` implementation backing the book thread's `StrategyContext`:
/// every call is a non-blocking push onto the SPSC the gateway thread
/// consumes, and `poll_events` drains the SPSC the gateway thread produces
/// into. Fills and acks are posted back onto a second SPSC consumed by the
/// book thread, so OMS and position mutation stay confined to the book
/// thread even though the simulated fill/ack logic runs on the gateway
/// thread.
struct QueuedGateway {
    commands: Arc<CommandQueue>,
    events: Arc<EventQueue>,
}

impl Gateway for QueuedGateway {
    fn submit(&mut self, request: OrderRequest, ts: Ts) -> bool {
        self.commands.push(GatewayCommand::Submit(request, ts))
    }

    fn cancel(&mut self, order_id: OrderId, ts: Ts) -> bool {
        self.commands.push(GatewayCommand::Cancel(order_id, ts))
    }

    fn poll_events(&mut self) -> Vec<GatewayEvent> {
        let mut out = Vec::new();
        while let Some(e) = self.events.pop() {
            out.push(e);
        }
        out
    }
}

struct TracingTradeListener;

impl TradeListener for TracingTradeListener {
    fn on_trade(&mut self, trade: Trade) {
        tracing::debug!(
            buy = trade.buy_order_id,
            sell = trade.sell_order_id,
            price = trade.price,
            qty = trade.quantity,
            "trade"
        );
    }
}

/// Static configuration for one instrument's pipeline.
pub struct EngineConfig {
    pub symbol_id: u32,
    pub price_domain: PriceDomain,
    pub risk_limits: RiskLimits,
    /// Probability the simulated gateway fills a submitted order at all
    /// (see `SimulatedGateway`).
    pub fill_probability: f64,
    /// Seeds the gateway thread's fill simulator, kept explicit rather
    /// than sourced from a clock so runs are reproducible.
    pub rng_seed: u64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LatencySnapshot {
    pub p50_ns: u64,
    pub p99_ns: u64,
    pub max_ns: u64,
    pub count: u64,
}

impl From<&LatencyRecorder> for LatencySnapshot {
    fn from(rec: &LatencyRecorder) -> Self {
        Self { p50_ns: rec.p50_ns(), p99_ns: rec.p99_ns(), max_ns: rec.max_ns(), count: rec.count() }
    }
}

/// Statistics returned once every worker thread has joined.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineReport {
    pub latency: LatencySnapshot,
    pub gateway: GatewayStats,
}

/// Owns the three worker threads of one instrument's pipeline.
pub struct EngineHandle {
    feed: JoinHandle<()>,
    book: JoinHandle<LatencySnapshot>,
    gateway: JoinHandle<GatewayStats>,
    running: Arc<AtomicBool>,
}

impl EngineHandle {
    /// Flips the shared flag; worker threads drain their own input queue
    /// and exit in leaves-first order (feed, then book, then gateway).
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Joins all three threads in shutdown order and returns the final
    /// statistics. Panics if a worker thread panicked.
    pub fn join(self) -> EngineReport {
        self.feed.join().expect("feed thread panicked");
        let latency = self.book.join().expect("book thread panicked");
        let gateway = self.gateway.join().expect("gateway thread panicked");
        EngineReport { latency, gateway }
    }
}

pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Builds the book/OMS/risk/position/gateway state, runs the
    /// strategy's (fallible) `initialize` synchronously on the calling
    /// thread, so a bad parameter is reported before any thread starts and
    /// propagates straight back to the caller, then spawns the three
    /// worker threads.
    pub fn spawn(
        self,
        mut driver: Driver,
        feed: Box<dyn FeedSource>,
        running: Arc<AtomicBool>,
    ) -> Result<EngineHandle, StrategyError> {
        let EngineConfig { symbol_id, price_domain, risk_limits, fill_probability, rng_seed } = self.config;

        let mut book = Book::new(price_domain);
        let mut oms = Oms::new();
        let mut risk = RiskManager::new(risk_limits);
        let positions = PositionManager::new();

        let commands: Arc<CommandQueue> = Arc::new(Spsc::new());
        let events: Arc<EventQueue> = Arc::new(Spsc::new());
        let mut gateway = QueuedGateway { commands: commands.clone(), events: events.clone() };

        {
            let mut ctx =
                StrategyContext { symbol_id, oms: &mut oms, risk: &mut risk, gateway: &mut gateway, positions: &positions };
            driver.initialize(&mut ctx)?;
        }

        let market_data: Arc<MarketDataQueue> = Arc::new(Spsc::new());
        let start = Instant::now();

        let sim = SimulatedGateway::new(fill_probability, rand::rngs::StdRng::seed_from_u64(rng_seed));
        let gw_handle = {
            let running = running.clone();
            let commands = commands.clone();
            let events = events.clone();
            thread::Builder::new()
                .name("apex-gateway".into())
                .spawn(move || gateway_thread_loop(sim, commands, events, running))
                .expect("spawn gateway thread")
        };

        let feed_handle = {
            let running = running.clone();
            let market_data = market_data.clone();
            thread::Builder::new()
                .name("apex-feed".into())
                .spawn(move || feed_thread_loop(feed, market_data, running))
                .expect("spawn feed thread")
        };

        let book_handle = {
            let running = running.clone();
            thread::Builder::new()
                .name("apex-book".into())
                .spawn(move || {
                    book_thread_loop(
                        book, oms, risk, positions, driver, symbol_id, market_data, gateway, running, start,
                    )
                })
                .expect("spawn book thread")
        };

        Ok(EngineHandle { feed: feed_handle, book: book_handle, gateway: gw_handle, running })
    }
}

fn feed_thread_loop(mut feed: Box<dyn FeedSource>, queue: Arc<MarketDataQueue>, running: Arc<AtomicBool>) {
    while running.load(Ordering::Relaxed) {
        match feed.next_event() {
            Some(event) => {
                if !queue.push(event) {
                    tracing::warn!("market-data queue full, dropping update");
                }
            }
            None => thread::sleep(IDLE_SLEEP),
        }
    }
}

fn gateway_thread_loop<R: rand::Rng>(
    mut sim: SimulatedGateway<R>,
    commands: Arc<CommandQueue>,
    events: Arc<EventQueue>,
    running: Arc<AtomicBool>,
) -> GatewayStats {
    loop {
        match commands.pop() {
            Some(GatewayCommand::Submit(request, ts)) => {
                sim.submit(request, ts);
                for event in sim.poll_events() {
                    if !events.push(event) {
                        tracing::warn!("gateway event queue full, dropping event");
                    }
                }
            }
            Some(GatewayCommand::Cancel(order_id, ts)) => {
                sim.cancel(order_id, ts);
                for event in sim.poll_events() {
                    if !events.push(event) {
                        tracing::warn!("gateway event queue full, dropping event");
                    }
                }
            }
            None => {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
                thread::sleep(IDLE_SLEEP);
            }
        }
    }
    sim.stats()
}

#[allow(clippy::too_many_arguments)]
fn book_thread_loop(
    mut book: Book,
    mut oms: Oms,
    mut risk: RiskManager,
    mut positions: PositionManager,
    mut driver: Driver,
    symbol_id: u32,
    market_data: Arc<MarketDataQueue>,
    mut gateway: QueuedGateway,
    running: Arc<AtomicBool>,
    start: Instant,
) -> LatencySnapshot {
    let mut latency = LatencyRecorder::new();
    let mut trades = TracingTradeListener;

    {
        let mut ctx =
            StrategyContext { symbol_id, oms: &mut oms, risk: &mut risk, gateway: &mut gateway, positions: &positions };
        driver.start(&mut ctx);
    }

    loop {
        let mut did_work = false;

        while let Some(event) = market_data.pop() {
            did_work = true;
            let began = Instant::now();
            apply_market_data(&mut book, event, &mut trades);
            let ts = event.timestamp();
            let mut ctx = StrategyContext {
                symbol_id,
                oms: &mut oms,
                risk: &mut risk,
                gateway: &mut gateway,
                positions: &positions,
            };
            driver.on_market_data(&book, &mut ctx, ts);
            latency.record_ns(began.elapsed().as_nanos() as u64);
        }

        for event in gateway.poll_events() {
            did_work = true;
            apply_gateway_event(
                event, &mut oms, &mut positions, &mut driver, symbol_id, &mut risk, &mut gateway, start,
            );
        }

        if !did_work {
            if !running.load(Ordering::Relaxed) && market_data.is_empty() {
                break;
            }
            thread::sleep(IDLE_SLEEP);
        }
    }

    let shutdown_ts = start.elapsed().as_nanos() as Ts;
    for order_id in oms.outstanding_order_ids() {
        oms.mark_cancelled(order_id, shutdown_ts, &mut NullOmsListener);
    }
    {
        let mut ctx =
            StrategyContext { symbol_id, oms: &mut oms, risk: &mut risk, gateway: &mut gateway, positions: &positions };
        driver.stop(&mut ctx);
        driver.shutdown(&mut ctx);
    }

    LatencySnapshot::from(&latency)
}

fn apply_market_data(book: &mut Book, event: MarketDataEvent, trades: &mut dyn TradeListener) {
    match event {
        MarketDataEvent::NewOrder { id, side, price, quantity, order_type, time_in_force, timestamp } => {
            book.add_order(id, side, price, quantity, order_type, time_in_force, timestamp, trades);
        }
        MarketDataEvent::Cancel { id, .. } => {
            book.cancel_order(id);
        }
        MarketDataEvent::Modify { id, new_quantity, .. } => {
            book.modify_order(id, new_quantity);
        }
    }
}

/// Applies one gateway event to OMS/position state and, only when the
/// status actually transitioned, forwards the corresponding strategy
/// callback (fill before order-update). `NullOmsListener` is used for the
/// OMS's own callback slot here because strategy callbacks need a full
/// `StrategyContext`, which can't alias a `&mut Oms` already borrowed
/// inside `Oms::apply_fill`, so this function drives them directly
/// instead of through `OmsListener`.
#[allow(clippy::too_many_arguments)]
fn apply_gateway_event(
    event: GatewayEvent,
    oms: &mut Oms,
    positions: &mut PositionManager,
    driver: &mut Driver,
    symbol_id: u32,
    risk: &mut RiskManager,
    gateway: &mut QueuedGateway,
    start: Instant,
) {
    let now = start.elapsed().as_nanos() as Ts;
    match event {
        GatewayEvent::Acknowledged { order_id } => {
            if oms.mark_acknowledged(order_id, now, &mut NullOmsListener) {
                let positions_ref = &*positions;
                let mut ctx =
                    StrategyContext { symbol_id, oms, risk, gateway, positions: positions_ref };
                driver.on_order_update(order_id, OrderStatus::Acknowledged, &mut ctx);
            }
        }
        GatewayEvent::Filled { order_id, price, quantity, timestamp } => {
            let side = oms.get(order_id).map(|rec| rec.request.side);
            if oms.apply_fill(order_id, price, quantity, timestamp, &mut NullOmsListener) {
                if let Some(side) = side {
                    positions.apply_fill(symbol_id, side, price, quantity, timestamp);
                }
                let status = oms.get(order_id).map(|rec| rec.status).unwrap_or(OrderStatus::Filled);
                let positions_ref = &*positions;
                let mut ctx =
                    StrategyContext { symbol_id, oms, risk, gateway, positions: positions_ref };
                driver.on_fill(
                    Fill { order_id, exec_id: next_exec_id(), price, quantity, timestamp },
                    &mut ctx,
                );
                driver.on_order_update(order_id, status, &mut ctx);
            }
        }
        GatewayEvent::Cancelled { order_id } => {
            if oms.mark_cancelled(order_id, now, &mut NullOmsListener) {
                let positions_ref = &*positions;
                let mut ctx =
                    StrategyContext { symbol_id, oms, risk, gateway, positions: positions_ref };
                driver.on_order_update(order_id, OrderStatus::Cancelled, &mut ctx);
            }
        }
        GatewayEvent::Rejected { order_id } => {
            if oms.mark_rejected(order_id, crate::oms::RejectReason::GatewayNotConnected, now, &mut NullOmsListener) {
                let positions_ref = &*positions;
                let mut ctx =
                    StrategyContext { symbol_id, oms, risk, gateway, positions: positions_ref };
                driver.on_order_update(order_id, OrderStatus::Rejected, &mut ctx);
            }
        }
    }
}

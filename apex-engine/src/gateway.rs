//! Simulated exchange gateway: acknowledges and probabilistically fills
//! submitted orders, delivering events back to the OMS in FIFO order per
//! `order_id`. Stands in for real exchange connectivity (out of scope).

use crate::oms::OrderRequest;
use crate::types::{OrderId, Price, Qty, Ts};
use rand::Rng;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GatewayEvent {
    Acknowledged { order_id: OrderId },
    Filled { order_id: OrderId, price: Price, quantity: Qty, timestamp: Ts },
    Cancelled { order_id: OrderId },
    Rejected { order_id: OrderId },
}

pub trait Gateway {
    /// Submits a request for simulated execution. Returns `false`
    /// (surfaced by the OMS as a `REJECTED` transition) when not connected.
    fn submit(&mut self, request: OrderRequest, ts: Ts) -> bool;
    /// Requests cancellation of a resting order.
    fn cancel(&mut self, order_id: OrderId, ts: Ts) -> bool;
    /// Drains events produced since the last call, oldest first.
    fn poll_events(&mut self) -> Vec<GatewayEvent>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GatewayStats {
    pub submitted: u64,
    pub acknowledged: u64,
    pub fills: u64,
    pub volume: u64,
    pub dropped: u64,
}

/// Exchange I/O stub: acknowledges every connected submission, then with
/// probability `fill_probability` simulates a partial or full fill (partial
/// ratio uniform in 50-100%), clamped to at least one unit so a
/// fill-eligible order can never simulate a zero-quantity fill.
pub struct SimulatedGateway<R: Rng> {
    connected: bool,
    fill_probability: f64,
    rng: R,
    events: VecDeque<GatewayEvent>,
    submitted: AtomicU64,
    acknowledged: AtomicU64,
    fills: AtomicU64,
    volume: AtomicU64,
    dropped: AtomicU64,
}

impl<R: Rng> SimulatedGateway<R> {
    pub fn new(fill_probability: f64, rng: R) -> Self {
        Self {
            connected: true,
            fill_probability,
            rng,
            events: VecDeque::new(),
            submitted: AtomicU64::new(0),
            acknowledged: AtomicU64::new(0),
            fills: AtomicU64::new(0),
            volume: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            acknowledged: self.acknowledged.load(Ordering::Relaxed),
            fills: self.fills.load(Ordering::Relaxed),
            volume: self.volume.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl<R: Rng> Gateway for SimulatedGateway<R> {
    fn submit(&mut self, request: OrderRequest, ts: Ts) -> bool {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        if !self.connected {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            self.events.push_back(GatewayEvent::Rejected { order_id: request.order_id });
            return false;
        }

        self.events.push_back(GatewayEvent::Acknowledged { order_id: request.order_id });
        self.acknowledged.fetch_add(1, Ordering::Relaxed);

        if self.rng.random::<f64>() < self.fill_probability {
            let pct = self.rng.random_range(50..=100u32);
            let traded = ((request.quantity as u64 * pct as u64) / 100).max(1) as Qty;
            let traded = traded.min(request.quantity);
            self.events.push_back(GatewayEvent::Filled {
                order_id: request.order_id,
                price: request.price,
                quantity: traded,
                timestamp: ts,
            });
            self.fills.fetch_add(1, Ordering::Relaxed);
            self.volume.fetch_add(traded as u64, Ordering::Relaxed);
        }
        true
    }

    fn cancel(&mut self, order_id: OrderId, _ts: Ts) -> bool {
        if !self.connected {
            return false;
        }
        self.events.push_back(GatewayEvent::Cancelled { order_id });
        true
    }

    fn poll_events(&mut self) -> Vec<GatewayEvent> {
        self.events.drain(..).collect()
    }
}

//! Order-management system: owns the client-order state machine, aggregates
//! fills into a VWAP average price, and fans callbacks out with the fill
//! callback always preceding the order-update callback it caused.

mod types;

pub use types::{OrderRequest, OrderStatus, RejectReason};

use crate::types::{next_exec_id, next_order_id, OrderId, OrderType, Price, Qty, Side, TimeInForce, Ts};
use rustc_hash::FxHashMap;

/// A single execution reported back by the gateway or the book.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub order_id: OrderId,
    pub exec_id: u64,
    pub price: Price,
    pub quantity: Qty,
    pub timestamp: Ts,
}

/// Receives OMS lifecycle events. Fill callbacks always precede the
/// order-update callback they caused.
pub trait OmsListener {
    fn on_fill(&mut self, fill: Fill);
    fn on_order_update(&mut self, order_id: OrderId, status: OrderStatus);
}

#[derive(Default)]
pub struct NullOmsListener;

impl OmsListener for NullOmsListener {
    fn on_fill(&mut self, _fill: Fill) {}
    fn on_order_update(&mut self, _order_id: OrderId, _status: OrderStatus) {}
}

pub struct OrderRecord {
    pub request: OrderRequest,
    pub status: OrderStatus,
    pub filled_quantity: Qty,
    pub average_fill_price: f64,
    pub last_update_time: Ts,
    pub reject_reason: Option<RejectReason>,
}

#[derive(Default)]
pub struct Oms {
    records: FxHashMap<OrderId, OrderRecord>,
}

impl Oms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns an internal id and creates a `PENDING` record.
    #[allow(clippy::too_many_arguments)]
    pub fn submit(
        &mut self,
        symbol_id: u32,
        side: Side,
        order_type: OrderType,
        time_in_force: TimeInForce,
        price: Price,
        quantity: Qty,
        ts: Ts,
    ) -> OrderId {
        let order_id = next_order_id();
        let request = OrderRequest { order_id, symbol_id, side, order_type, time_in_force, price, quantity };
        self.records.insert(
            order_id,
            OrderRecord {
                request,
                status: OrderStatus::Pending,
                filled_quantity: 0,
                average_fill_price: 0.0,
                last_update_time: ts,
                reject_reason: None,
            },
        );
        order_id
    }

    pub fn get(&self, order_id: OrderId) -> Option<&OrderRecord> {
        self.records.get(&order_id)
    }

    /// Ids of every order not yet in a terminal state, used by the
    /// control thread to cancel outstanding orders on shutdown.
    pub fn outstanding_order_ids(&self) -> Vec<OrderId> {
        self.records
            .iter()
            .filter(|(_, rec)| !rec.status.is_terminal())
            .map(|(id, _)| *id)
            .collect()
    }

    fn transition(
        &mut self,
        order_id: OrderId,
        expected: &[OrderStatus],
        next: OrderStatus,
        ts: Ts,
        listener: &mut dyn OmsListener,
    ) -> bool {
        let Some(rec) = self.records.get_mut(&order_id) else { return false };
        if rec.status.is_terminal() || !expected.contains(&rec.status) {
            return false;
        }
        rec.status = next;
        rec.last_update_time = ts;
        listener.on_order_update(order_id, next);
        true
    }

    pub fn mark_sent(&mut self, order_id: OrderId, ts: Ts, listener: &mut dyn OmsListener) -> bool {
        self.transition(order_id, &[OrderStatus::Pending], OrderStatus::Sent, ts, listener)
    }

    pub fn mark_acknowledged(&mut self, order_id: OrderId, ts: Ts, listener: &mut dyn OmsListener) -> bool {
        self.transition(order_id, &[OrderStatus::Sent], OrderStatus::Acknowledged, ts, listener)
    }

    pub fn mark_cancelled(&mut self, order_id: OrderId, ts: Ts, listener: &mut dyn OmsListener) -> bool {
        let Some(rec) = self.records.get_mut(&order_id) else { return false };
        if rec.status.is_terminal() {
            return false;
        }
        rec.status = OrderStatus::Cancelled;
        rec.last_update_time = ts;
        listener.on_order_update(order_id, OrderStatus::Cancelled);
        true
    }

    pub fn mark_rejected(
        &mut self,
        order_id: OrderId,
        reason: RejectReason,
        ts: Ts,
        listener: &mut dyn OmsListener,
    ) -> bool {
        let Some(rec) = self.records.get_mut(&order_id) else { return false };
        if rec.status.is_terminal() {
            return false;
        }
        rec.status = OrderStatus::Rejected;
        rec.reject_reason = Some(reason);
        rec.last_update_time = ts;
        listener.on_order_update(order_id, OrderStatus::Rejected);
        true
    }

    /// Applies a fill: aggregates into the VWAP, transitions to
    /// `PARTIALLY_FILLED` or `FILLED`, and fires the fill callback before
    /// the order-update callback. Returns `false` for a terminal or
    /// unknown order.
    pub fn apply_fill(
        &mut self,
        order_id: OrderId,
        price: Price,
        quantity: Qty,
        ts: Ts,
        listener: &mut dyn OmsListener,
    ) -> bool {
        let Some(rec) = self.records.get_mut(&order_id) else { return false };
        if rec.status.is_terminal() {
            return false;
        }

        let prior_notional = rec.average_fill_price * rec.filled_quantity as f64;
        let new_filled = rec.filled_quantity + quantity;
        rec.average_fill_price = (prior_notional + price as f64 * quantity as f64) / new_filled as f64;
        rec.filled_quantity = new_filled;
        rec.last_update_time = ts;

        let next_status = if rec.filled_quantity >= rec.request.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        rec.status = next_status;

        listener.on_fill(Fill { order_id, exec_id: next_exec_id(), price, quantity, timestamp: ts });
        listener.on_order_update(order_id, next_status);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderType, TimeInForce};

    struct Recorder {
        fills: Vec<Fill>,
        updates: Vec<(OrderId, OrderStatus)>,
    }
    impl OmsListener for Recorder {
        fn on_fill(&mut self, fill: Fill) {
            self.fills.push(fill);
        }
        fn on_order_update(&mut self, order_id: OrderId, status: OrderStatus) {
            self.updates.push((order_id, status));
        }
    }

    #[test]
    fn partial_fills_aggregate_to_vwap_and_reach_filled() {
        let mut oms = Oms::new();
        let mut rec = Recorder { fills: Vec::new(), updates: Vec::new() };
        let id = oms.submit(1, Side::Buy, OrderType::Limit, TimeInForce::Gtc, 0, 200, 1);
        oms.mark_sent(id, 2, &mut rec);
        oms.mark_acknowledged(id, 3, &mut rec);
        assert!(oms.apply_fill(id, 10_000, 100, 4, &mut rec));
        assert_eq!(oms.get(id).unwrap().status, OrderStatus::PartiallyFilled);
        assert!(oms.apply_fill(id, 10_010, 100, 5, &mut rec));
        let r = oms.get(id).unwrap();
        assert_eq!(r.status, OrderStatus::Filled);
        assert_eq!(r.filled_quantity, 200);
        assert!((r.average_fill_price - 10_005.0).abs() < 1e-9);
        // Fill callback precedes the order-update callback for the same fill.
        assert_eq!(rec.updates.last(), Some(&(id, OrderStatus::Filled)));
    }

    #[test]
    fn terminal_state_rejects_further_mutation() {
        let mut oms = Oms::new();
        let mut rec = Recorder { fills: Vec::new(), updates: Vec::new() };
        let id = oms.submit(1, Side::Buy, OrderType::Limit, TimeInForce::Gtc, 0, 100, 1);
        assert!(oms.mark_rejected(id, RejectReason::RiskOrderSize, 2, &mut rec));
        assert!(!oms.mark_sent(id, 3, &mut rec));
        assert!(!oms.apply_fill(id, 10_000, 10, 4, &mut rec));
    }

    #[test]
    fn unknown_order_returns_false() {
        let mut oms = Oms::new();
        let mut rec = Recorder { fills: Vec::new(), updates: Vec::new() };
        assert!(!oms.mark_sent(9999, 1, &mut rec));
    }

    #[test]
    fn outstanding_ids_exclude_terminal_orders() {
        let mut oms = Oms::new();
        let mut rec = Recorder { fills: Vec::new(), updates: Vec::new() };
        let open = oms.submit(1, Side::Buy, OrderType::Limit, TimeInForce::Gtc, 0, 100, 1);
        let done = oms.submit(1, Side::Buy, OrderType::Limit, TimeInForce::Gtc, 0, 100, 1);
        oms.mark_rejected(done, RejectReason::RiskOrderSize, 2, &mut rec);
        assert_eq!(oms.outstanding_order_ids(), vec![open]);
    }
}

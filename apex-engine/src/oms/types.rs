//! Order-management record types: request intent, lifecycle status, and the
//! reasons an order can be rejected.

use crate::types::{OrderId, OrderType, Price, Qty, Side, TimeInForce, Ts};

/// The client's original order intent, immutable once submitted.
#[derive(Debug, Clone, Copy)]
pub struct OrderRequest {
    pub order_id: OrderId,
    pub symbol_id: u32,
    pub side: Side,
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub price: Price,
    pub quantity: Qty,
}

/// OMS lifecycle status. Terminal states (`Filled`, `Cancelled`, `Rejected`)
/// reject any further mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    Sent,
    Acknowledged,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected)
    }
}

/// Reason an order was rejected, surfaced to the caller via the status
/// transition rather than an exception. A strategy-submitted order is
/// rejected by risk or by the gateway; it never reaches the local book (the
/// book only sees market-data-driven additions), so there is no
/// book-originated reject reason here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    RiskOrderSize,
    RiskPositionLimit,
    RiskPriceCollar,
    RiskOrderRate,
    GatewayNotConnected,
}

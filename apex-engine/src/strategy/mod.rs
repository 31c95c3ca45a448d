//! Strategy drivers: pluggable event-to-order decision logic that closes
//! the loop from book events to risk-checked, gateway-routed orders.

pub mod market_making;
pub mod stat_arb;

use crate::book::Book;
use crate::gateway::Gateway;
use crate::oms::{Fill, Oms, OrderStatus, RejectReason};
use crate::position::PositionManager;
use crate::risk::{RiskCheck, RiskManager};
use crate::types::{OrderId, OrderType, Price, Qty, Side, TimeInForce, Ts};

#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    #[error("invalid strategy parameter: {0}")]
    InvalidParameter(&'static str),
}

/// Everything a strategy needs to turn a decision into a risk-checked,
/// routed order, without owning the OMS/risk/gateway/position state itself.
pub struct StrategyContext<'a> {
    pub symbol_id: u32,
    pub oms: &'a mut Oms,
    pub risk: &'a mut RiskManager,
    pub gateway: &'a mut dyn Gateway,
    pub positions: &'a PositionManager,
}

impl<'a> StrategyContext<'a> {
    /// Submits via the OMS, applies risk, and on approval forwards to the
    /// gateway. Always returns the assigned order id; on risk rejection the
    /// order is recorded `REJECTED` and never reaches the gateway.
    #[allow(clippy::too_many_arguments)]
    pub fn submit_order(
        &mut self,
        side: Side,
        order_type: OrderType,
        time_in_force: TimeInForce,
        price: Price,
        quantity: Qty,
        market_price: Option<Price>,
        ts: Ts,
    ) -> OrderId {
        let order_id =
            self.oms.submit(self.symbol_id, side, order_type, time_in_force, price, quantity, ts);

        let current_position = self.positions.get(self.symbol_id).quantity;
        let mut sink = crate::oms::NullOmsListener;
        let check = self.risk.check_order(
            self.symbol_id,
            side,
            price,
            quantity,
            market_price,
            current_position,
            ts,
        );
        let reason = match check {
            RiskCheck::Pass => None,
            RiskCheck::FailOrderSize => Some(RejectReason::RiskOrderSize),
            RiskCheck::FailPositionLimit => Some(RejectReason::RiskPositionLimit),
            RiskCheck::FailPriceCollar => Some(RejectReason::RiskPriceCollar),
            RiskCheck::FailPnlLimit => None,
            RiskCheck::FailOrderRate => Some(RejectReason::RiskOrderRate),
        };
        if let Some(reason) = reason {
            self.oms.mark_rejected(order_id, reason, ts, &mut sink);
            return order_id;
        }

        self.oms.mark_sent(order_id, ts, &mut sink);
        let request = self.oms.get(order_id).expect("just submitted").request;
        if !self.gateway.submit(request, ts) {
            self.oms.mark_rejected(order_id, RejectReason::GatewayNotConnected, ts, &mut sink);
        }
        order_id
    }

    pub fn cancel_order(&mut self, order_id: OrderId, ts: Ts) -> bool {
        self.gateway.cancel(order_id, ts)
    }
}

/// Polymorphic strategy interface, dispatched through a tagged union
/// rather than a trait object to avoid a virtual call on the hot path
/// (see `Driver`).
pub trait Strategy {
    fn initialize(&mut self, ctx: &mut StrategyContext) -> Result<(), StrategyError>;
    fn start(&mut self, ctx: &mut StrategyContext);
    fn stop(&mut self, ctx: &mut StrategyContext);
    fn shutdown(&mut self, ctx: &mut StrategyContext);
    fn on_market_data(&mut self, book: &Book, ctx: &mut StrategyContext, ts: Ts);
    fn on_order_update(&mut self, order_id: OrderId, status: OrderStatus, ctx: &mut StrategyContext);
    fn on_fill(&mut self, fill: Fill, ctx: &mut StrategyContext);
}

/// Compile-time-dispatched tagged union of the two canonical strategies,
/// avoiding dynamic dispatch on the hot path.
pub enum Driver {
    MarketMaking(market_making::MarketMakingStrategy),
    StatArb(stat_arb::StatArbStrategy),
}

impl Strategy for Driver {
    fn initialize(&mut self, ctx: &mut StrategyContext) -> Result<(), StrategyError> {
        match self {
            Driver::MarketMaking(s) => s.initialize(ctx),
            Driver::StatArb(s) => s.initialize(ctx),
        }
    }
    fn start(&mut self, ctx: &mut StrategyContext) {
        match self {
            Driver::MarketMaking(s) => s.start(ctx),
            Driver::StatArb(s) => s.start(ctx),
        }
    }
    fn stop(&mut self, ctx: &mut StrategyContext) {
        match self {
            Driver::MarketMaking(s) => s.stop(ctx),
            Driver::StatArb(s) => s.stop(ctx),
        }
    }
    fn shutdown(&mut self, ctx: &mut StrategyContext) {
        match self {
            Driver::MarketMaking(s) => s.shutdown(ctx),
            Driver::StatArb(s) => s.shutdown(ctx),
        }
    }
    fn on_market_data(&mut self, book: &Book, ctx: &mut StrategyContext, ts: Ts) {
        match self {
            Driver::MarketMaking(s) => s.on_market_data(book, ctx, ts),
            Driver::StatArb(s) => s.on_market_data(book, ctx, ts),
        }
    }
    fn on_order_update(&mut self, order_id: OrderId, status: OrderStatus, ctx: &mut StrategyContext) {
        match self {
            Driver::MarketMaking(s) => s.on_order_update(order_id, status, ctx),
            Driver::StatArb(s) => s.on_order_update(order_id, status, ctx),
        }
    }
    fn on_fill(&mut self, fill: Fill, ctx: &mut StrategyContext) {
        match self {
            Driver::MarketMaking(s) => s.on_fill(fill, ctx),
            Driver::StatArb(s) => s.on_fill(fill, ctx),
        }
    }
}

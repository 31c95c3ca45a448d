//! Symmetric market-making: quote both sides around mid, sized down as
//! inventory grows, refreshed on a timer.

use super::{Strategy, StrategyContext, StrategyError};
use crate::book::Book;
use crate::oms::{Fill, OrderStatus};
use crate::types::{OrderId, OrderType, Price, Qty, Side, TimeInForce, Ts, BEST_ASK_EMPTY, BEST_BID_EMPTY};

#[derive(Debug, Clone, Copy)]
pub struct MarketMakingParams {
    pub spread_bps: f64,
    pub quote_size: Qty,
    pub max_position: i64,
    pub tick_size: Price,
    pub max_orders_per_side: u32,
    pub quote_refresh_ms: u64,
    /// Market-data events are ignored while the spread exceeds this
    /// sanity threshold (in bps of mid), guarding against quoting into a
    /// torn-up book. Carried as a generous default.
    pub sanity_spread_bps: f64,
}

impl Default for MarketMakingParams {
    fn default() -> Self {
        Self {
            spread_bps: 10.0,
            quote_size: 10,
            max_position: 1_000,
            tick_size: 1,
            max_orders_per_side: 1,
            quote_refresh_ms: 0,
            sanity_spread_bps: 500.0,
        }
    }
}

pub struct MarketMakingStrategy {
    params: MarketMakingParams,
    last_refresh_ns: Ts,
    resting_buys: Vec<OrderId>,
    resting_sells: Vec<OrderId>,
}

impl MarketMakingStrategy {
    pub fn new(params: MarketMakingParams) -> Self {
        Self { params, last_refresh_ns: 0, resting_buys: Vec::new(), resting_sells: Vec::new() }
    }

    /// Linear inventory-proportional size, floored at 1 unit; `None` when
    /// the quote would push position past `max_position`.
    fn sized_quote(&self, position_in_direction: i64) -> Option<Qty> {
        let max_position = self.params.max_position.max(1);
        if position_in_direction >= max_position {
            return None;
        }
        let headroom = (max_position - position_in_direction) as f64;
        let factor = (headroom / max_position as f64).clamp(0.0, 1.0);
        let size = ((self.params.quote_size as f64) * factor).round().max(1.0) as Qty;
        Some(size.min(self.params.quote_size))
    }

    fn round_down_to_tick(&self, price: f64) -> Price {
        let tick = self.params.tick_size.max(1) as f64;
        ((price / tick).floor() as Price) * self.params.tick_size.max(1)
    }

    fn round_up_to_tick(&self, price: f64) -> Price {
        let tick = self.params.tick_size.max(1) as f64;
        ((price / tick).ceil() as Price) * self.params.tick_size.max(1)
    }
}

impl Strategy for MarketMakingStrategy {
    fn initialize(&mut self, _ctx: &mut StrategyContext) -> Result<(), StrategyError> {
        if self.params.quote_size == 0 {
            return Err(StrategyError::InvalidParameter("quote_size"));
        }
        if self.params.tick_size == 0 {
            return Err(StrategyError::InvalidParameter("tick_size"));
        }
        Ok(())
    }

    fn start(&mut self, _ctx: &mut StrategyContext) {}
    fn stop(&mut self, _ctx: &mut StrategyContext) {}
    fn shutdown(&mut self, _ctx: &mut StrategyContext) {}

    fn on_market_data(&mut self, book: &Book, ctx: &mut StrategyContext, ts: Ts) {
        let bid = book.best_bid();
        let ask = book.best_ask();
        if bid == BEST_BID_EMPTY || ask == BEST_ASK_EMPTY {
            return;
        }
        let mid = book.mid();
        if mid == 0 {
            return;
        }
        let spread_bps = (book.spread() as f64 / mid as f64) * 10_000.0;
        if spread_bps > self.params.sanity_spread_bps {
            return;
        }
        if ts.saturating_sub(self.last_refresh_ns) < self.params.quote_refresh_ms * 1_000_000 {
            return;
        }

        for id in self.resting_buys.drain(..) {
            ctx.cancel_order(id, ts);
        }
        for id in self.resting_sells.drain(..) {
            ctx.cancel_order(id, ts);
        }

        let position = ctx.positions.get(ctx.symbol_id).quantity;
        let raw_bid = mid as f64 * (1.0 - self.params.spread_bps / 10_000.0);
        let raw_ask = mid as f64 * (1.0 + self.params.spread_bps / 10_000.0);
        let bid_price = self.round_down_to_tick(raw_bid);
        let ask_price = self.round_up_to_tick(raw_ask);

        if let Some(size) = self.sized_quote(position.max(0)) {
            let id = ctx.submit_order(
                Side::Buy,
                OrderType::Limit,
                TimeInForce::Gtc,
                bid_price,
                size,
                Some(mid),
                ts,
            );
            self.resting_buys.push(id);
        }
        if let Some(size) = self.sized_quote((-position).max(0)) {
            let id = ctx.submit_order(
                Side::Sell,
                OrderType::Limit,
                TimeInForce::Gtc,
                ask_price,
                size,
                Some(mid),
                ts,
            );
            self.resting_sells.push(id);
        }

        self.last_refresh_ns = ts;
    }

    fn on_order_update(&mut self, _order_id: OrderId, _status: OrderStatus, _ctx: &mut StrategyContext) {}
    fn on_fill(&mut self, _fill: Fill, _ctx: &mut StrategyContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_symmetric_around_mid_at_flat_position() {
        let strat = MarketMakingStrategy::new(MarketMakingParams {
            spread_bps: 10.0,
            quote_size: 10,
            max_position: 1_000,
            tick_size: 1,
            max_orders_per_side: 1,
            quote_refresh_ms: 0,
            sanity_spread_bps: 500.0,
        });
        let raw_bid = 10_000.0 * (1.0 - 10.0 / 10_000.0);
        let raw_ask = 10_000.0 * (1.0 + 10.0 / 10_000.0);
        assert_eq!(strat.round_down_to_tick(raw_bid), 9_990);
        assert_eq!(strat.round_up_to_tick(raw_ask), 10_010);
        assert_eq!(strat.sized_quote(0), Some(10));
    }

    #[test]
    fn size_shrinks_with_inventory_and_floors_at_one() {
        let strat = MarketMakingStrategy::new(MarketMakingParams {
            max_position: 100,
            quote_size: 10,
            ..MarketMakingParams::default()
        });
        assert_eq!(strat.sized_quote(0), Some(10));
        assert_eq!(strat.sized_quote(90), Some(1));
        assert_eq!(strat.sized_quote(100), None);
    }
}

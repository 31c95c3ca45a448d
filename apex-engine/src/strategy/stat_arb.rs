//! Z-score mean-reversion: trade the deviation of mid-price from its
//! rolling mean back toward flat.

use super::{Strategy, StrategyContext, StrategyError};
use crate::book::Book;
use crate::oms::{Fill, OrderStatus};
use crate::types::{OrderId, OrderType, Price, Qty, Side, TimeInForce, Ts, BEST_ASK_EMPTY, BEST_BID_EMPTY};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
pub struct StatArbParams {
    pub lookback_period: usize,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub position_size: Qty,
    pub max_position: i64,
    pub tick_size: Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Flat,
    Long,
    Short,
}

pub struct StatArbStrategy {
    params: StatArbParams,
    window: VecDeque<f64>,
    state: State,
}

impl StatArbStrategy {
    pub fn new(params: StatArbParams) -> Self {
        Self { params, window: VecDeque::with_capacity(params.lookback_period), state: State::Flat }
    }

    fn push_mid(&mut self, mid: f64) {
        if self.window.len() == self.params.lookback_period {
            self.window.pop_front();
        }
        self.window.push_back(mid);
    }

    /// `None` until the window is full; population standard deviation.
    fn z_score(&self, mid: f64) -> Option<f64> {
        if self.window.len() < self.params.lookback_period {
            return None;
        }
        let n = self.window.len() as f64;
        let mean = self.window.iter().sum::<f64>() / n;
        let variance = self.window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let sigma = variance.sqrt();
        if sigma == 0.0 {
            return Some(0.0);
        }
        Some((mid - mean) / sigma)
    }
}

impl Strategy for StatArbStrategy {
    fn initialize(&mut self, _ctx: &mut StrategyContext) -> Result<(), StrategyError> {
        if self.params.lookback_period == 0 {
            return Err(StrategyError::InvalidParameter("lookback_period"));
        }
        if self.params.position_size == 0 {
            return Err(StrategyError::InvalidParameter("position_size"));
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
        let mid = book.mid() as f64;
        self.push_mid(mid);
        let Some(z) = self.z_score(mid) else { return };

        let position = ctx.positions.get(ctx.symbol_id).quantity;
        let mkt = Some(book.mid());

        match self.state {
            State::Flat => {
                if z > self.params.entry_threshold {
                    ctx.submit_order(Side::Sell, OrderType::Limit, TimeInForce::Ioc, bid, self.params.position_size, mkt, ts);
                    self.state = State::Short;
                } else if z < -self.params.entry_threshold {
                    ctx.submit_order(Side::Buy, OrderType::Limit, TimeInForce::Ioc, ask, self.params.position_size, mkt, ts);
                    self.state = State::Long;
                }
            }
            State::Short => {
                if z < self.params.exit_threshold {
                    let qty = position.unsigned_abs() as Qty;
                    if qty > 0 {
                        ctx.submit_order(Side::Buy, OrderType::Limit, TimeInForce::Ioc, ask, qty, mkt, ts);
                    }
                    self.state = State::Flat;
                }
            }
            State::Long => {
                if z > -self.params.exit_threshold {
                    let qty = position.unsigned_abs() as Qty;
                    if qty > 0 {
                        ctx.submit_order(Side::Sell, OrderType::Limit, TimeInForce::Ioc, bid, qty, mkt, ts);
                    }
                    self.state = State::Flat;
                }
            }
        }
    }

    fn on_order_update(&mut self, _order_id: OrderId, _status: OrderStatus, _ctx: &mut StrategyContext) {}
    fn on_fill(&mut self, _fill: Fill, _ctx: &mut StrategyContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> StatArbParams {
        StatArbParams {
            lookback_period: 4,
            entry_threshold: 1.0,
            exit_threshold: 0.2,
            position_size: 10,
            max_position: 100,
            tick_size: 1,
        }
    }

    #[test]
    fn z_score_is_none_until_window_fills() {
        let mut strat = StatArbStrategy::new(params());
        strat.push_mid(100.0);
        strat.push_mid(100.0);
        assert_eq!(strat.z_score(100.0), None);
        strat.push_mid(100.0);
        strat.push_mid(100.0);
        assert_eq!(strat.z_score(100.0), Some(0.0));
    }

    #[test]
    fn z_score_zero_variance_window_is_zero_not_nan() {
        let mut strat = StatArbStrategy::new(params());
        for _ in 0..4 {
            strat.push_mid(50.0);
        }
        assert_eq!(strat.z_score(50.0), Some(0.0));
    }

    #[test]
    fn z_score_reflects_deviation_above_mean() {
        let mut strat = StatArbStrategy::new(params());
        strat.push_mid(90.0);
        strat.push_mid(100.0);
        strat.push_mid(100.0);
        strat.push_mid(110.0);
        let z = strat.z_score(110.0).unwrap();
        assert!(z > 0.0);
    }
}

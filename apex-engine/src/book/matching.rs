//! Price-time priority matching: the aggressor-crossing walk and the
//! fill-or-kill liquidity precheck, both driven off the same ladder state
//! the resting-order operations in `mod.rs` maintain.

use super::{AddOutcome, Book};
use crate::arena::Handle;
use crate::book::level::OrderNode;
use crate::book::syncer::TradeListener;
use crate::types::{OrderId, OrderType, Price, Qty, Side, TimeInForce, Trade, Ts};

impl Book {
    /// Matches then rests: the aggressor trades against the opposing book
    /// while it crosses, then any residual is rested (Limit + Gtc) or
    /// discarded (Market, or Limit + Ioc/Fok residual).
    #[allow(clippy::too_many_arguments)]
    pub fn add_order(
        &mut self,
        id: OrderId,
        side: Side,
        price: Price,
        qty: Qty,
        order_type: OrderType,
        tif: TimeInForce,
        ts: Ts,
        listener: &mut dyn TradeListener,
    ) -> AddOutcome {
        if qty == 0 {
            return AddOutcome::Done { filled: 0, resting: 0 };
        }
        if order_type == OrderType::Limit && self.dom.idx(price).is_none() {
            return AddOutcome::OutOfRange;
        }

        let cross_limit = match order_type {
            OrderType::Limit => price,
            OrderType::Market => match side {
                Side::Buy => Price::MAX,
                Side::Sell => Price::MIN,
            },
        };

        if tif == TimeInForce::Fok {
            let available = self.available_liquidity(side, cross_limit, qty);
            if available < qty {
                return AddOutcome::Killed;
            }
        }

        let filled = self.cross(side, cross_limit, qty, id, ts, listener);
        let remaining = qty - filled;

        let should_rest =
            remaining > 0 && order_type == OrderType::Limit && tif == TimeInForce::Gtc;
        if should_rest {
            let pidx = self.dom.idx(price).expect("validated above");
            let h = self.arena.alloc(OrderNode {
                id,
                side,
                price_idx: pidx,
                qty: remaining,
                timestamp: ts,
                prev: Handle::NONE,
                next: Handle::NONE,
            });
            self.id_map.insert(id, h);
            self.insert_tail(side, h, pidx, remaining);
        }

        AddOutcome::Done { filled, resting: if should_rest { remaining } else { 0 } }
    }

    /// Sums resting quantity available to `side` at-or-better than
    /// `limit_price`, capped at `cap` (no need to keep scanning past it).
    fn available_liquidity(&self, side: Side, limit_price: Price, cap: Qty) -> Qty {
        let opp = side.opposite();
        let mut total: u64 = 0;
        let mut idx = self.best_idx(opp);
        while let Some(i) = idx {
            let level_price = self.dom.price_at(i);
            let crosses = match side {
                Side::Buy => limit_price >= level_price,
                Side::Sell => limit_price <= level_price,
            };
            if !crosses {
                break;
            }
            total += self.levels(opp)[i].total_quantity as u64;
            if total >= cap as u64 {
                return cap;
            }
            idx = self.next_opposing_idx(opp, i);
        }
        total.min(cap as u64) as Qty
    }

    /// Walks away from the current best on `opp` (the side being matched
    /// against), in the direction that visits worse prices next.
    fn next_opposing_idx(&self, opp: Side, i: usize) -> Option<usize> {
        match opp {
            Side::Sell => self.non_empty_asks.next_one_at_or_after(i + 1),
            Side::Buy => {
                if i == 0 {
                    None
                } else {
                    self.non_empty_bids.prev_one_at_or_before(i - 1)
                }
            }
        }
    }

    /// Crosses `side`'s aggressor (internal id `aggressor_id`) against the
    /// opposing ladder up to `limit_price`, emitting one trade per resting
    /// order consumed, in resting price/time order. Returns quantity filled.
    fn cross(
        &mut self,
        side: Side,
        limit_price: Price,
        qty: Qty,
        aggressor_id: OrderId,
        ts: Ts,
        listener: &mut dyn TradeListener,
    ) -> Qty {
        let opp = side.opposite();
        let mut remaining = qty;

        while remaining > 0 {
            let Some(idx) = self.best_idx(opp) else { break };
            let level_price = self.dom.price_at(idx);
            let crosses = match side {
                Side::Buy => limit_price >= level_price,
                Side::Sell => limit_price <= level_price,
            };
            if !crosses {
                break;
            }

            let head = self.levels(opp)[idx].head;
            if head.is_none() {
                break;
            }
            let (resting_id, resting_qty) = {
                let node = self.arena.get(head);
                (node.id, node.qty)
            };
            let traded = remaining.min(resting_qty);

            let trade = Trade {
                buy_order_id: if side == Side::Buy { aggressor_id } else { resting_id },
                sell_order_id: if side == Side::Sell { aggressor_id } else { resting_id },
                price: level_price,
                quantity: traded,
                timestamp: ts,
            };
            listener.on_trade(trade);

            remaining -= traded;
            if traded == resting_qty {
                self.id_map.remove(&resting_id);
                self.unlink(opp, head);
                self.arena.dealloc(head);
            } else {
                self.arena.get_mut(head).qty -= traded;
                let lvl = &mut self.levels_mut(opp)[idx];
                lvl.total_quantity = lvl.total_quantity.saturating_sub(traded);
            }
        }

        qty - remaining
    }
}

//! Limit order book: a dense, array-indexed price ladder per side with
//! intrusive per-level FIFOs and price-time priority matching.
//!
//! Touched only by the owning (book) thread; see the crate-level
//! concurrency notes in `engine.rs`.

mod level;
mod matching;
mod syncer;

pub use level::{DepthLevel, PriceDomain};
pub use syncer::{NullTradeListener, TradeListener};

use crate::arena::Arena;
use crate::bitset::Bitset;
use crate::types::{OrderId, Price, Qty, Side};
use level::{OrderNode, PriceLevel};
use rustc_hash::FxHashMap;

/// Outcome of `add_order`, distinguishing the fates an aggressor can meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Price fell outside the ladder's configured domain.
    OutOfRange,
    /// Fill-or-kill could not fill completely; book untouched.
    Killed,
    /// Matched `filled` units; `resting` (possibly zero) now sits in the
    /// book. `resting == 0` covers both a full fill and a discarded
    /// market/IOC residual.
    Done { filled: Qty, resting: Qty },
}

pub struct Book {
    dom: PriceDomain,
    bids: Box<[PriceLevel]>,
    asks: Box<[PriceLevel]>,
    non_empty_bids: Bitset,
    non_empty_asks: Bitset,
    best_bid_idx: Option<usize>,
    best_ask_idx: Option<usize>,
    arena: Arena<OrderNode>,
    id_map: FxHashMap<OrderId, crate::arena::Handle>,
}

impl Book {
    pub fn new(dom: PriceDomain) -> Self {
        let n = dom.num_levels;
        Self {
            dom,
            bids: vec![PriceLevel::default(); n].into_boxed_slice(),
            asks: vec![PriceLevel::default(); n].into_boxed_slice(),
            non_empty_bids: Bitset::with_len(n),
            non_empty_asks: Bitset::with_len(n),
            best_bid_idx: None,
            best_ask_idx: None,
            arena: Arena::with_capacity(1024),
            id_map: FxHashMap::default(),
        }
    }

    #[inline]
    fn levels(&self, side: Side) -> &[PriceLevel] {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    #[inline]
    fn levels_mut(&mut self, side: Side) -> &mut [PriceLevel] {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    #[inline]
    fn bitset_mut(&mut self, side: Side) -> &mut Bitset {
        match side {
            Side::Buy => &mut self.non_empty_bids,
            Side::Sell => &mut self.non_empty_asks,
        }
    }

    #[inline]
    fn best_idx(&self, side: Side) -> Option<usize> {
        match side {
            Side::Buy => self.best_bid_idx,
            Side::Sell => self.best_ask_idx,
        }
    }

    /// Cancels a resting order. Returns `false` (no callback) for an
    /// unknown id, matching the book's silent-failure error model.
    pub fn cancel_order(&mut self, id: OrderId) -> bool {
        let Some(h) = self.id_map.remove(&id) else {
            return false;
        };
        let (side, pidx) = {
            let node = self.arena.get(h);
            (node.side, node.price_idx)
        };
        self.unlink(side, h);
        self.arena.dealloc(h);
        let _ = pidx;
        true
    }

    /// Modifies the resting quantity of order `id` in place, regardless of
    /// whether the new size is larger or smaller than the old one. The node
    /// keeps its position in the level's FIFO either way: a size increase
    /// does *not* re-queue it to the back, unlike the common market
    /// convention of losing priority on size-up. Returns `false` for an
    /// unknown id.
    pub fn modify_order(&mut self, id: OrderId, new_qty: Qty) -> bool {
        let Some(&h) = self.id_map.get(&id) else {
            return false;
        };
        let (side, pidx, old_qty) = {
            let node = self.arena.get(h);
            (node.side, node.price_idx, node.qty)
        };
        if new_qty == 0 {
            return self.cancel_order(id);
        }
        {
            let node = self.arena.get_mut(h);
            node.qty = new_qty;
        }
        let lvl = &mut self.levels_mut(side)[pidx];
        if new_qty >= old_qty {
            lvl.total_quantity = lvl.total_quantity.saturating_add(new_qty - old_qty);
        } else {
            lvl.total_quantity = lvl.total_quantity.saturating_sub(old_qty - new_qty);
        }
        true
    }

    pub fn best_bid(&self) -> Price {
        self.best_bid_idx.map(|i| self.dom.price_at(i)).unwrap_or(crate::types::BEST_BID_EMPTY)
    }

    pub fn best_ask(&self) -> Price {
        self.best_ask_idx.map(|i| self.dom.price_at(i)).unwrap_or(crate::types::BEST_ASK_EMPTY)
    }

    /// Zero when either side is empty.
    pub fn mid(&self) -> Price {
        match (self.best_bid_idx, self.best_ask_idx) {
            (Some(_), Some(_)) => (self.best_bid() + self.best_ask()) / 2,
            _ => 0,
        }
    }

    /// Zero when either side is empty.
    pub fn spread(&self) -> Price {
        match (self.best_bid_idx, self.best_ask_idx) {
            (Some(_), Some(_)) => self.best_ask() - self.best_bid(),
            _ => 0,
        }
    }

    /// Top-`n` resting levels on `side`, best price first.
    pub fn depth(&self, side: Side, n: usize) -> Vec<DepthLevel> {
        let mut out = Vec::with_capacity(n);
        let mut idx = match self.best_idx(side) {
            Some(i) => i,
            None => return out,
        };
        loop {
            if out.len() >= n {
                break;
            }
            let lvl = &self.levels(side)[idx];
            if !lvl.is_empty() {
                out.push(DepthLevel {
                    price: self.dom.price_at(idx),
                    total_quantity: lvl.total_quantity,
                    order_count: lvl.order_count,
                });
            }
            let next = match side {
                Side::Buy => {
                    if idx == 0 {
                        None
                    } else {
                        self.non_empty_bids.prev_one_at_or_before(idx - 1)
                    }
                }
                Side::Sell => self.non_empty_asks.next_one_at_or_after(idx + 1),
            };
            match next {
                Some(i) => idx = i,
                None => break,
            }
        }
        out
    }

    fn insert_tail(&mut self, side: Side, h: crate::arena::Handle, pidx: usize, qty: Qty) {
        let levels = self.levels_mut(side);
        let lvl = &mut levels[pidx];
        if lvl.tail.is_none() {
            lvl.head = h;
            lvl.tail = h;
        } else {
            let t = lvl.tail;
            self.arena.get_mut(t).next = h;
            self.arena.get_mut(h).prev = t;
            self.levels_mut(side)[pidx].tail = h;
        }
        let lvl = &mut self.levels_mut(side)[pidx];
        lvl.total_quantity = lvl.total_quantity.saturating_add(qty);
        lvl.order_count += 1;

        self.bitset_mut(side).set(pidx);
        match side {
            Side::Buy => {
                if self.best_bid_idx.is_none_or(|b| pidx > b) {
                    self.best_bid_idx = Some(pidx);
                }
            }
            Side::Sell => {
                if self.best_ask_idx.is_none_or(|b| pidx < b) {
                    self.best_ask_idx = Some(pidx);
                }
            }
        }
    }

    fn unlink(&mut self, side: Side, h: crate::arena::Handle) {
        let (pidx, prev, next, qty) = {
            let node = self.arena.get(h);
            (node.price_idx, node.prev, node.next, node.qty)
        };
        if prev.is_none() {
            self.levels_mut(side)[pidx].head = next;
        } else {
            self.arena.get_mut(prev).next = next;
        }
        if next.is_none() {
            self.levels_mut(side)[pidx].tail = prev;
        } else {
            self.arena.get_mut(next).prev = prev;
        }
        let lvl = &mut self.levels_mut(side)[pidx];
        lvl.total_quantity = lvl.total_quantity.saturating_sub(qty);
        lvl.order_count = lvl.order_count.saturating_sub(1);

        if lvl.is_empty() {
            self.bitset_mut(side).clear(pidx);
            self.recompute_best_after_empty(side, pidx);
        }
    }

    fn recompute_best_after_empty(&mut self, side: Side, emptied_idx: usize) {
        match side {
            Side::Buy => {
                if self.best_bid_idx == Some(emptied_idx) {
                    self.best_bid_idx = if emptied_idx == 0 {
                        None
                    } else {
                        self.non_empty_bids.prev_one_at_or_before(emptied_idx - 1)
                    };
                }
            }
            Side::Sell => {
                if self.best_ask_idx == Some(emptied_idx) {
                    self.best_ask_idx = self.non_empty_asks.next_one_at_or_after(emptied_idx + 1);
                }
            }
        }
    }
}

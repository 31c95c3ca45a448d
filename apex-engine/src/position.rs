//! Per-symbol position accounting: signed net quantity, volume-weighted
//! average price, and realized/unrealized PnL.

use crate::types::{Price, Qty, Side, Ts};
use rustc_hash::FxHashMap;

/// Net position in one symbol. `average_price == 0` whenever `quantity == 0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Position {
    pub quantity: i64,
    pub average_price: f64,
    pub realized_pnl: f64,
    pub last_update_time: Ts,
}

impl Position {
    /// Applies one fill: extend, partially close, or cross through flat
    /// (close-then-open), realizing PnL on the closing leg.
    pub fn apply_fill(&mut self, side: Side, price: Price, qty: Qty, ts: Ts) {
        let delta: i64 = match side {
            Side::Buy => qty as i64,
            Side::Sell => -(qty as i64),
        };
        let prev_qty = self.quantity;

        if prev_qty == 0 {
            self.quantity = delta;
            self.average_price = price as f64;
        } else if prev_qty.signum() == delta.signum() {
            let new_qty = prev_qty + delta;
            let prior_notional = self.average_price * prev_qty.unsigned_abs() as f64;
            let added_notional = price as f64 * delta.unsigned_abs() as f64;
            self.average_price = (prior_notional + added_notional) / new_qty.unsigned_abs() as f64;
            self.quantity = new_qty;
        } else {
            let closing = delta.unsigned_abs().min(prev_qty.unsigned_abs());
            let realized =
                (price as f64 - self.average_price) * closing as f64 * prev_qty.signum() as f64;
            self.realized_pnl += realized;

            let new_qty = prev_qty + delta;
            if new_qty == 0 {
                self.average_price = 0.0;
            } else if new_qty.signum() != prev_qty.signum() {
                // Crossed through flat: open the opposite-direction remainder
                // at the fill price.
                self.average_price = price as f64;
            }
            self.quantity = new_qty;
        }
        self.last_update_time = ts;
    }

    /// `(mark_price - average_price) * quantity`.
    pub fn unrealized_pnl(&self, mark_price: Price) -> f64 {
        (mark_price as f64 - self.average_price) * self.quantity as f64
    }

    pub fn total_pnl(&self, mark_price: Price) -> f64 {
        self.realized_pnl + self.unrealized_pnl(mark_price)
    }
}

/// Tracks one `Position` per symbol.
#[derive(Default)]
pub struct PositionManager {
    positions: FxHashMap<u32, Position>,
}

impl PositionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_fill(&mut self, symbol_id: u32, side: Side, price: Price, qty: Qty, ts: Ts) {
        self.positions.entry(symbol_id).or_default().apply_fill(side, price, qty, ts);
    }

    pub fn get(&self, symbol_id: u32) -> Position {
        self.positions.get(&symbol_id).copied().unwrap_or_default()
    }

    /// Sum of `total_pnl` across symbols, keyed by a caller-supplied
    /// mark-to-market map (symbol_id -> mark price).
    pub fn total_pnl(&self, marks: &FxHashMap<u32, Price>) -> f64 {
        self.positions
            .iter()
            .map(|(sym, pos)| pos.total_pnl(marks.get(sym).copied().unwrap_or(0)))
            .sum()
    }
}

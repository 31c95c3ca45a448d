//! Pre-trade and post-trade risk checks, run synchronously in the order
//! submission path on the single OMS thread.

use crate::types::{Price, Qty, Side, Ts};
use rustc_hash::FxHashMap;

const ONE_SECOND_NS: Ts = 1_000_000_000;

#[derive(Debug, Clone, Copy)]
pub struct RiskLimits {
    pub max_position: i64,
    pub max_order_size: Qty,
    pub max_loss_per_symbol: f64,
    pub price_collar_percent: f64,
    pub max_orders_per_second: u32,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_position: i64::MAX,
            max_order_size: Qty::MAX,
            max_loss_per_symbol: f64::INFINITY,
            price_collar_percent: f64::INFINITY,
            max_orders_per_second: u32::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskCheck {
    Pass,
    FailOrderSize,
    FailPositionLimit,
    FailPriceCollar,
    FailPnlLimit,
    FailOrderRate,
}

#[derive(Default)]
struct RateWindow {
    window_start: Ts,
    count: u32,
}

/// Per-symbol risk limits with a global default fallback, plus the
/// per-symbol order-rate window state.
#[derive(Default)]
pub struct RiskManager {
    default_limits: RiskLimits,
    limits: FxHashMap<u32, RiskLimits>,
    rate_windows: FxHashMap<u32, RateWindow>,
}

impl RiskManager {
    pub fn new(default_limits: RiskLimits) -> Self {
        Self { default_limits, limits: FxHashMap::default(), rate_windows: FxHashMap::default() }
    }

    pub fn set_limits(&mut self, symbol_id: u32, limits: RiskLimits) {
        self.limits.insert(symbol_id, limits);
    }

    fn limits_for(&self, symbol_id: u32) -> RiskLimits {
        self.limits.get(&symbol_id).copied().unwrap_or(self.default_limits)
    }

    /// Rule order is short-circuit: size, projected position, price
    /// collar, order rate.
    pub fn check_order(
        &mut self,
        symbol_id: u32,
        side: Side,
        price: Price,
        quantity: Qty,
        market_price: Option<Price>,
        current_position: i64,
        now: Ts,
    ) -> RiskCheck {
        let limits = self.limits_for(symbol_id);

        if quantity > limits.max_order_size {
            return RiskCheck::FailOrderSize;
        }

        let delta: i64 = match side {
            Side::Buy => quantity as i64,
            Side::Sell => -(quantity as i64),
        };
        if (current_position + delta).unsigned_abs() as i64 > limits.max_position {
            return RiskCheck::FailPositionLimit;
        }

        if let Some(mp) = market_price {
            if mp != 0 {
                let deviation = ((price - mp).abs() as f64 / mp as f64) * 100.0;
                if deviation > limits.price_collar_percent {
                    return RiskCheck::FailPriceCollar;
                }
            }
        }

        let window = self.rate_windows.entry(symbol_id).or_default();
        if now.saturating_sub(window.window_start) >= ONE_SECOND_NS {
            window.window_start = now;
            window.count = 0;
        }
        if window.count >= limits.max_orders_per_second {
            return RiskCheck::FailOrderRate;
        }
        window.count += 1;

        RiskCheck::Pass
    }

    /// Post-trade PnL breach: does not itself cancel orders, callers
    /// consult it as a policy signal.
    pub fn pnl_breach(&self, symbol_id: u32, realized: f64, unrealized: f64) -> bool {
        let limits = self.limits_for(symbol_id);
        realized + unrealized < -limits.max_loss_per_symbol
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> RiskLimits {
        RiskLimits {
            max_position: 1_000,
            max_order_size: 500,
            max_loss_per_symbol: 10_000.0,
            price_collar_percent: 5.0,
            max_orders_per_second: 2,
        }
    }

    #[test]
    fn order_exceeding_max_size_is_rejected() {
        let mut rm = RiskManager::new(limits());
        assert_eq!(rm.check_order(1, Side::Buy, 100, 501, None, 0, 0), RiskCheck::FailOrderSize);
    }

    #[test]
    fn rate_limit_resets_each_window() {
        let mut rm = RiskManager::new(limits());
        assert_eq!(rm.check_order(1, Side::Buy, 100, 10, None, 0, 0), RiskCheck::Pass);
        assert_eq!(rm.check_order(1, Side::Buy, 100, 10, None, 0, 0), RiskCheck::Pass);
        assert_eq!(rm.check_order(1, Side::Buy, 100, 10, None, 0, 0), RiskCheck::FailOrderRate);
        assert_eq!(
            rm.check_order(1, Side::Buy, 100, 10, None, 0, ONE_SECOND_NS),
            RiskCheck::Pass
        );
    }

    #[test]
    fn position_limit_checked_against_projected_position() {
        let mut rm = RiskManager::new(limits());
        assert_eq!(rm.check_order(1, Side::Buy, 100, 200, None, 900, 0), RiskCheck::FailPositionLimit);
    }

    #[test]
    fn price_collar_only_applies_when_market_price_given() {
        let mut rm = RiskManager::new(limits());
        assert_eq!(
            rm.check_order(1, Side::Buy, 110, 10, Some(100), 0, 0),
            RiskCheck::FailPriceCollar
        );
        assert_eq!(rm.check_order(2, Side::Buy, 110, 10, None, 0, 0), RiskCheck::Pass);
    }

    #[test]
    fn pnl_breach_detects_loss_past_threshold() {
        let rm = RiskManager::new(limits());
        assert!(rm.pnl_breach(1, -6_000.0, -5_000.0));
        assert!(!rm.pnl_breach(1, -1_000.0, 0.0));
    }
}

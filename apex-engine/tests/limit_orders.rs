mod common;

use apex_engine::prelude::*;
use common::{depth_snapshot, new_book};

#[test]
fn full_fill_removes_both_sides() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Sell, 10_000, 10, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    let outcome = book.add_order(2, Side::Buy, 10_000, 10, OrderType::Limit, TimeInForce::Gtc, 2, &mut sink);

    assert_eq!(outcome, AddOutcome::Done { filled: 10, resting: 0 });
    assert!(depth_snapshot(&book, Side::Sell, 5).is_empty());
    assert!(depth_snapshot(&book, Side::Buy, 5).is_empty());
}

#[test]
fn resting_orders_match_in_time_priority() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Sell, 10_000, 10, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    book.add_order(2, Side::Sell, 10_000, 10, OrderType::Limit, TimeInForce::Gtc, 2, &mut sink);

    let mut trades = Vec::new();
    book.add_order(3, Side::Buy, 10_000, 10, OrderType::Limit, TimeInForce::Gtc, 3, &mut |t: Trade| {
        trades.push(t)
    });

    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].sell_order_id, 1, "the earlier resting order should match first");
    assert_eq!(depth_snapshot(&book, Side::Sell, 5), vec![(10_000, 10)]);
}

#[test]
fn no_cross_leaves_both_sides_resting() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Sell, 10_050, 10, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    book.add_order(2, Side::Buy, 9_950, 10, OrderType::Limit, TimeInForce::Gtc, 2, &mut sink);

    assert_eq!(depth_snapshot(&book, Side::Sell, 5), vec![(10_050, 10)]);
    assert_eq!(depth_snapshot(&book, Side::Buy, 5), vec![(9_950, 10)]);
}

#[test]
fn large_aggressor_consumes_multiple_resting_orders() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Sell, 10_000, 5, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    book.add_order(2, Side::Sell, 10_000, 5, OrderType::Limit, TimeInForce::Gtc, 2, &mut sink);
    let outcome = book.add_order(3, Side::Buy, 10_000, 8, OrderType::Limit, TimeInForce::Gtc, 3, &mut sink);

    assert_eq!(outcome, AddOutcome::Done { filled: 8, resting: 0 });
    assert_eq!(depth_snapshot(&book, Side::Sell, 5), vec![(10_000, 2)], "2 units left of the second order");
}

#[test]
fn partial_fill_then_cancel_of_remainder() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(1, Side::Sell, 10_000, 10, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    book.add_order(2, Side::Buy, 10_000, 4, OrderType::Limit, TimeInForce::Gtc, 2, &mut sink);

    assert_eq!(depth_snapshot(&book, Side::Sell, 5), vec![(10_000, 6)]);
    assert!(book.cancel_order(1));
    assert!(depth_snapshot(&book, Side::Sell, 5).is_empty());
}

#[test]
fn partial_across_two_resting_orders_leaves_combined_remainder() {
    let mut book = new_book();
    let mut sink = NullTradeListener;
    book.add_order(101, Side::Sell, 10_000, 10, OrderType::Limit, TimeInForce::Gtc, 1, &mut sink);
    book.add_order(102, Side::Sell, 10_000, 10, OrderType::Limit, TimeInForce::Gtc, 2, &mut sink);
    book.add_order(200, Side::Buy, 10_000, 6, OrderType::Limit, TimeInForce::Gtc, 3, &mut sink);

    assert_eq!(depth_snapshot(&book, Side::Sell, 5), vec![(10_000, 14)]);
}
